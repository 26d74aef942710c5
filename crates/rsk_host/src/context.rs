//! The resolution-context seam.
//!
//! A resolution context is one application's view of its resources: the
//! object accessor operations are invoked against. The override machinery
//! consumes contexts exclusively through [`ResolutionContext`], so it works
//! against the in-memory [`ResourceTable`](crate::table::ResourceTable)
//! shipped here as well as against any other host binding.

use camino::Utf8Path;

use crate::affinity::AffinityExecutor;
use crate::error::{AttachError, HostError};
use crate::identity::{ResId, ResourceIdentity};
use crate::pack::PackHandle;
use crate::surface::AccessorKind;
use crate::value::Value;

/// One application's resource-resolution context.
///
/// Implementations must be safe to share across threads: accessor calls
/// arrive on whatever thread the host application uses.
pub trait ResolutionContext: Send + Sync {
    /// Short label for log lines.
    fn label(&self) -> &str;

    /// Invoke an accessor through the full dispatch path, installed
    /// intercepts included.
    ///
    /// `args` are the raw argument words of the call; the identifier is the
    /// first word for every accessor on the resource surface.
    fn invoke(&self, kind: AccessorKind, args: &[i64]) -> Result<Value, HostError>;

    /// Translate an identifier into the structural identity it was minted
    /// for. Fails with [`HostError::NotFound`] for identifiers unknown to
    /// this context.
    fn identify(&self, id: ResId) -> Result<ResourceIdentity, HostError>;

    /// Current display-density scale factor of this context.
    fn density_scale(&self) -> f64;

    /// Attach an alternate resource pack (modern strategy).
    ///
    /// Fails with [`AttachError::NotRegistered`] when the context's
    /// lifecycle state makes it ineligible; callers fall back to
    /// [`inject_archive`](Self::inject_archive).
    fn attach_pack(&self, pack: &PackHandle) -> Result<(), AttachError>;

    /// Inject an asset archive through the privileged low-level path
    /// (legacy strategy). Returns the injection cookie; `0` is the host's
    /// sentinel for a failed injection.
    fn inject_archive(&self, path: &Utf8Path) -> Result<u32, HostError>;

    /// The thread this context's attachment operations are confined to,
    /// if any.
    fn affinity(&self) -> Option<&AffinityExecutor>;
}
