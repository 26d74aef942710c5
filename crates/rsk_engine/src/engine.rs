//! The override engine service object.
//!
//! One [`OverrideEngine`] owns the whole override lifecycle: the replacement
//! table, the in-flight guard, the bundle loader, and the intercepts it
//! installs into the host's hook registries. It is constructed once and
//! shared by reference with whatever owns the interception lifecycle; there
//! is no global instance.
//!
//! The three `set_*_replacement` operations are the only mutation surface.
//! Each lazily activates the interception engine, then upserts its entry;
//! a replacement registered while activation is degraded is still stored
//! and takes effect once the intercepts are in place. Registration is safe
//! from any thread and carries no ordering guarantee against accessor calls
//! already in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use rsk_host::{HostHooks, ResId, ResolutionContext, ResourceIdentity, Value};
use rsk_intercept::Unhooker;

use crate::intercept;
use crate::loader::BundleLoader;
use crate::table::{DensityValue, InFlightSet, ReplacementEntry, ReplacementTable};

/// Discovers a usable "current application" context for the opportunistic
/// bundle attachment the resolver performs when no context is registered
/// yet.
pub type ContextProbe = Box<dyn Fn() -> Option<Arc<dyn ResolutionContext>> + Send + Sync>;

pub(crate) struct EngineCore {
    pub(crate) hooks: Arc<HostHooks>,
    pub(crate) loader: BundleLoader,
    pub(crate) replacements: ReplacementTable,
    pub(crate) in_flight: InFlightSet,
    pub(crate) unhooks: Mutex<Vec<Unhooker>>,
    pub(crate) hooks_applied: AtomicBool,
    pub(crate) initialized: AtomicBool,
    pub(crate) probe: OnceCell<ContextProbe>,
}

/// The resource override engine.
///
/// See the crate docs for the end-to-end picture. All methods are callable
/// from any thread.
pub struct OverrideEngine {
    core: Arc<EngineCore>,
}

impl OverrideEngine {
    /// Create an engine over the host's hook registries and the path of the
    /// packaged alternate bundle.
    ///
    /// Nothing is installed yet; intercepts go in on the first registration
    /// call or an explicit [`activate`](Self::activate).
    pub fn new(hooks: Arc<HostHooks>, bundle_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            core: Arc::new(EngineCore {
                hooks,
                loader: BundleLoader::new(bundle_path),
                replacements: ReplacementTable::new(),
                in_flight: InFlightSet::new(),
                unhooks: Mutex::new(Vec::new()),
                hooks_applied: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                probe: OnceCell::new(),
            }),
        }
    }

    /// Configure how the resolver discovers a current-application context
    /// when no bundle context has been registered yet. Set once; later
    /// calls are ignored.
    pub fn with_context_probe(
        self,
        probe: impl Fn() -> Option<Arc<dyn ResolutionContext>> + Send + Sync + 'static,
    ) -> Self {
        if self.core.probe.set(Box::new(probe)).is_err() {
            tracing::warn!("Context probe already configured; keeping the existing one");
        }
        self
    }

    /// Path of the alternate bundle archive this engine serves.
    pub fn bundle_path(&self) -> &Utf8Path {
        self.core.loader.bundle_path()
    }

    /// Install every accessor intercept. Idempotent.
    pub fn activate(&self) {
        intercept::activate(&self.core);
    }

    /// Remove every installed intercept and reset the engine to its
    /// pre-activation state. Safe to call when never activated.
    pub fn deactivate(&self) {
        intercept::deactivate(&self.core);
    }

    /// `true` once activation has completed and until deactivation.
    pub fn is_initialized(&self) -> bool {
        self.core.initialized.load(Ordering::SeqCst)
    }

    /// Make the alternate bundle resolvable through `ctx` and register it
    /// for identifier-replacement delegation.
    ///
    /// Idempotent per context; returns `false` when the bundle could not be
    /// loaded (logged, not fatal). With `on_affinity_thread` set and the
    /// caller off the context's designated thread, the attachment is
    /// deferred to that thread and success is reported optimistically.
    pub fn load_into(&self, ctx: &Arc<dyn ResolutionContext>, on_affinity_thread: bool) -> bool {
        self.core.loader.load_into(ctx, on_affinity_thread)
    }

    /// Redirect a resource to `target`, an identifier that must resolve in
    /// the alternate bundle.
    pub fn set_id_replacement(&self, scope: &str, category: &str, name: &str, target: ResId) {
        self.register(
            ResourceIdentity::new(scope, category, name),
            ReplacementEntry::Identifier(target),
        );
    }

    /// Replace a resource with a density-independent magnitude, scaled by
    /// the calling context's display density at resolution time.
    pub fn set_density_replacement(
        &self,
        scope: &str,
        category: &str,
        name: &str,
        value: impl Into<DensityValue>,
    ) {
        self.register(
            ResourceIdentity::new(scope, category, name),
            ReplacementEntry::Density(value.into()),
        );
    }

    /// Replace a resource with a pre-resolved value.
    pub fn set_object_replacement(
        &self,
        scope: &str,
        category: &str,
        name: &str,
        value: impl Into<Value>,
    ) {
        self.register(
            ResourceIdentity::new(scope, category, name),
            ReplacementEntry::Object(value.into()),
        );
    }

    fn register(&self, identity: ResourceIdentity, entry: ReplacementEntry) {
        // Activation failures are logged inside; the entry is stored either
        // way and takes effect once the intercepts are in place.
        intercept::activate(&self.core);
        self.core.replacements.upsert(identity, entry);
    }
}
