//! Hook registries for the two accessor contract surfaces.

use std::sync::Arc;

use rsk_intercept::{HookRegistry, MethodDescriptor};

use crate::context::ResolutionContext;
use crate::error::HostError;
use crate::surface::{resource_accessor_descriptors, typed_accessor_descriptors};
use crate::table::TypedSlots;
use crate::value::Value;

/// What a before-phase intercept may short-circuit an accessor call with:
/// either a replacement value or the host failure the caller should observe.
pub type AccessorOutcome = Result<Value, HostError>;

/// The hook registries a host wires its accessor dispatch through.
///
/// One registry per contract surface: the general resource accessors see the
/// calling context as their receiver, the typed-block accessors see the
/// block itself. Both registries validate installations against the declared
/// surface, so hooking a method outside it fails rather than installing a
/// dead hook.
pub struct HostHooks {
    /// General resource accessor surface.
    pub resources: HookRegistry<dyn ResolutionContext, AccessorOutcome>,
    /// Typed-attribute-block surface.
    pub typed: HookRegistry<TypedSlots, AccessorOutcome>,
}

impl HostHooks {
    /// Registries backing the full contract surfaces.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            resources: HookRegistry::with_supported(resource_accessor_descriptors()),
            typed: HookRegistry::with_supported(typed_accessor_descriptors()),
        })
    }

    /// Registries for a host that can only back part of the resource
    /// surface. Installation on anything outside `resource_surface` fails
    /// with an error the installer is expected to tolerate.
    pub fn restricted(resource_surface: impl IntoIterator<Item = MethodDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            resources: HookRegistry::with_supported(resource_surface),
            typed: HookRegistry::with_supported(typed_accessor_descriptors()),
        })
    }
}
