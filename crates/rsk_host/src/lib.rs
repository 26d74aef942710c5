//! Host resolution-context model for the reskin toolkit.
//!
//! This crate defines everything the override engine consumes from a host
//! application's resource machinery, and ships a complete in-memory
//! implementation of it:
//!
//! - [`ResolutionContext`]: the seam the engine resolves against, with
//!   [`ResourceTable`] as the reference implementation
//! - the declarative accessor [`surface`] (method names, argument shapes,
//!   return contracts) the interception layer classifies
//! - [`HostHooks`]: the per-surface hook registries accessor dispatch is
//!   wired through
//! - [`ResourcePack`]: the alternate resource bundle format (ZIP archive
//!   with a `resources.json` manifest)
//! - [`TypedSlots`]: the typed-attribute-block surface
//! - [`AffinityExecutor`]: the designated-thread executor attachment
//!   operations may be confined to

pub mod affinity;
pub mod context;
pub mod error;
pub mod hooks;
pub mod identity;
pub mod pack;
pub mod surface;
pub mod table;
pub mod value;

pub use affinity::AffinityExecutor;
pub use context::ResolutionContext;
pub use error::{AttachError, HostError, PackError};
pub use hooks::{AccessorOutcome, HostHooks};
pub use identity::{ANY_SCOPE, ResId, ResourceIdentity, synthetic_res_id};
pub use pack::{PACK_MANIFEST_NAME, PackEntry, PackHandle, ResourcePack};
pub use surface::{
    AccessorKind, ParamShape, RESOURCE_SURFACE, ReturnShape, TYPED_COLOR_AT, TYPED_SURFACE,
    resource_accessor_descriptors, typed_accessor_descriptors,
};
pub use table::{SLOT_TYPE_NULL, SLOT_WORDS, ResourceTable, TypedSlots, push_slot};
pub use value::Value;
