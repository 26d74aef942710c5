//! Error types for hook installation.

use thiserror::Error;

use crate::descriptor::MethodDescriptor;

/// Errors that can occur when installing a hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The descriptor is not part of the registry's declared surface.
    #[error("{0} is not a hookable method")]
    UnsupportedMethod(MethodDescriptor),
}
