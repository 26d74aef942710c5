//! Alternate bundle loading.
//!
//! The loader makes one packaged resource archive resolvable through any
//! number of resolution contexts. The parsed pack handle is created at most
//! once (the first caller pays the archive open; concurrent callers block on
//! that initialization; a failed open is not cached and a later call
//! retries). Contexts that were successfully loaded into are tracked in an
//! append-only list the resolver iterates on every delegated lookup, so the
//! list is kept behind an [`ArcSwap`] snapshot: appends never invalidate an
//! iteration already in progress.
//!
//! Two attachment strategies exist, mirroring the host interface:
//!
//! - **modern**: hand the shared [`PackHandle`] to
//!   [`ResolutionContext::attach_pack`]; if the context is not eligible in
//!   its current lifecycle state, fall back to
//! - **legacy**: privileged archive injection via
//!   [`ResolutionContext::inject_archive`], where a returned cookie of `0`
//!   is the host's sentinel for failure (logged, not fatal).
//!
//! When a context confines attachment to a designated thread and the caller
//! is elsewhere, the attachment is posted to that thread fire-and-forget and
//! the context is reported loaded immediately. Bundle-backed replacements
//! against it become available once the posted task runs; the task logs its
//! own failure.

use std::sync::Arc;

use arc_swap::ArcSwap;
use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;

use rsk_host::{AttachError, PackHandle, ResolutionContext, ResourcePack};

pub(crate) struct BundleLoader {
    bundle_path: Utf8PathBuf,
    handle: OnceCell<PackHandle>,
    contexts: ArcSwap<Vec<Arc<dyn ResolutionContext>>>,
}

impl BundleLoader {
    pub(crate) fn new(bundle_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
            handle: OnceCell::new(),
            contexts: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub(crate) fn bundle_path(&self) -> &Utf8Path {
        &self.bundle_path
    }

    /// Snapshot of every context the bundle has been loaded into.
    pub(crate) fn contexts(&self) -> Arc<Vec<Arc<dyn ResolutionContext>>> {
        self.contexts.load_full()
    }

    /// `true` when no context has been registered yet.
    pub(crate) fn is_empty(&self) -> bool {
        self.contexts.load().is_empty()
    }

    fn is_registered(&self, ctx: &Arc<dyn ResolutionContext>) -> bool {
        self.contexts.load().iter().any(|c| Arc::ptr_eq(c, ctx))
    }

    fn register(&self, ctx: &Arc<dyn ResolutionContext>) {
        self.contexts.rcu(|current| {
            if current.iter().any(|c| Arc::ptr_eq(c, ctx)) {
                Arc::clone(current)
            } else {
                let mut next = Vec::with_capacity(current.len() + 1);
                next.extend(current.iter().cloned());
                next.push(Arc::clone(ctx));
                Arc::new(next)
            }
        });
    }

    /// Make the bundle resolvable through `ctx`.
    ///
    /// Idempotent per context. With `on_affinity_thread` set and the caller
    /// off the context's designated thread, the attachment is deferred and
    /// success is reported optimistically.
    pub(crate) fn load_into(&self, ctx: &Arc<dyn ResolutionContext>, on_affinity_thread: bool) -> bool {
        if self.is_registered(ctx) {
            return true;
        }

        let handle = match self
            .handle
            .get_or_try_init(|| ResourcePack::open(&self.bundle_path).map(Arc::new))
        {
            Ok(handle) => Arc::clone(handle),
            Err(err) => {
                tracing::error!("Failed to open alternate bundle {}: {}", self.bundle_path, err);
                return false;
            }
        };

        if on_affinity_thread {
            if let Some(executor) = ctx.affinity() {
                if !executor.is_current() {
                    let deferred_ctx = Arc::clone(ctx);
                    let deferred_path = self.bundle_path.clone();
                    executor.post(move || {
                        if !attach(&deferred_ctx, &handle, &deferred_path) {
                            tracing::warn!(
                                "Deferred bundle attachment failed for {}",
                                deferred_ctx.label()
                            );
                        }
                    });
                    self.register(ctx);
                    return true;
                }
            }
        }

        if attach(ctx, &handle, &self.bundle_path) {
            self.register(ctx);
            true
        } else {
            tracing::warn!("Failed to load bundle into {}", ctx.label());
            false
        }
    }
}

fn attach(ctx: &Arc<dyn ResolutionContext>, handle: &PackHandle, bundle_path: &Utf8Path) -> bool {
    match ctx.attach_pack(handle) {
        Ok(()) => true,
        Err(AttachError::NotRegistered) => inject(ctx, bundle_path),
        Err(err) => {
            tracing::error!("Failed to attach bundle to {}: {}", ctx.label(), err);
            false
        }
    }
}

fn inject(ctx: &Arc<dyn ResolutionContext>, bundle_path: &Utf8Path) -> bool {
    match ctx.inject_archive(bundle_path) {
        Ok(0) => {
            tracing::warn!(
                "Legacy injection into {} returned cookie 0; bundle may not be loaded",
                ctx.label()
            );
            false
        }
        Ok(_) => true,
        Err(err) => {
            tracing::error!("Legacy injection into {} failed: {}", ctx.label(), err);
            false
        }
    }
}
