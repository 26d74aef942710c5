//! Intercept installation and teardown.
//!
//! Activation enumerates the two accessor contract surfaces, classifies
//! every descriptor against the declarative surface table, and installs one
//! intercept per classified method. Overloads the table cannot classify are
//! skipped; a per-method install failure is logged and does not abort the
//! remaining installs. Every successful install lands in the unhook
//! registry so deactivation can tear the whole set down.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rsk_intercept::{BeforeInvocation, Hooker, Unhooker};

use rsk_host::{
    AccessorKind, AccessorOutcome, ResolutionContext, TypedSlots, resource_accessor_descriptors,
    typed_accessor_descriptors,
};

use crate::engine::EngineCore;

/// Intercept for one classified accessor on the general resource surface.
struct AccessorIntercept {
    core: Arc<EngineCore>,
    kind: AccessorKind,
}

impl Hooker<dyn ResolutionContext, AccessorOutcome> for AccessorIntercept {
    fn before(&self, call: &mut BeforeInvocation<'_, dyn ResolutionContext, AccessorOutcome>) {
        if let Some(outcome) = self
            .core
            .resolve_accessor(call.receiver(), self.kind, call.args())
        {
            call.return_and_skip(outcome);
        }
    }
}

/// Intercept for the typed-attribute-block surface.
struct TypedIntercept {
    core: Arc<EngineCore>,
}

impl Hooker<TypedSlots, AccessorOutcome> for TypedIntercept {
    fn before(&self, call: &mut BeforeInvocation<'_, TypedSlots, AccessorOutcome>) {
        let index = call.arg(0).unwrap_or(-1);
        let default = call.arg(1).unwrap_or(0);
        if let Some(value) = self.core.resolve_typed_slot(call.receiver(), index, default) {
            call.return_and_skip(Ok(value));
        }
    }
}

/// Install every intercept. Idempotent: a second call while active is a
/// no-op.
pub(crate) fn activate(core: &Arc<EngineCore>) {
    if core.hooks_applied.swap(true, Ordering::SeqCst) {
        return;
    }

    let mut installed: Vec<Unhooker> = Vec::new();
    let mut skipped = 0usize;

    for descriptor in resource_accessor_descriptors() {
        let Some(kind) = AccessorKind::from_descriptor(&descriptor) else {
            tracing::debug!("Skipping unclassifiable accessor {}", descriptor);
            skipped += 1;
            continue;
        };
        let intercept: Arc<dyn Hooker<dyn ResolutionContext, AccessorOutcome>> =
            Arc::new(AccessorIntercept {
                core: Arc::clone(core),
                kind,
            });
        match core.hooks.resources.hook(descriptor, intercept) {
            Ok(unhooker) => installed.push(unhooker),
            Err(err) => tracing::error!("Failed to hook {}: {}", descriptor, err),
        }
    }

    for descriptor in typed_accessor_descriptors() {
        let intercept: Arc<dyn Hooker<TypedSlots, AccessorOutcome>> = Arc::new(TypedIntercept {
            core: Arc::clone(core),
        });
        match core.hooks.typed.hook(descriptor, intercept) {
            Ok(unhooker) => installed.push(unhooker),
            Err(err) => tracing::error!("Failed to hook {}: {}", descriptor, err),
        }
    }

    tracing::debug!(
        "Installed {} accessor intercept(s), skipped {} unclassifiable",
        installed.len(),
        skipped
    );

    core.unhooks.lock().extend(installed);
    core.initialized.store(true, Ordering::SeqCst);
}

/// Remove every installed intercept and reset the activation latch. Safe to
/// call when never activated.
pub(crate) fn deactivate(core: &EngineCore) {
    let unhooks: Vec<Unhooker> = {
        let mut registry = core.unhooks.lock();
        registry.drain(..).collect()
    };
    for unhooker in unhooks {
        unhooker.remove();
    }
    core.hooks_applied.store(false, Ordering::SeqCst);
    core.initialized.store(false, Ordering::SeqCst);
}
