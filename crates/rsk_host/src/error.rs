//! Error types for the host model.
//!
//! [`HostError`] is the host's own failure vocabulary: it is what accessor
//! operations return, and what a before-phase intercept must produce when it
//! wants the caller to observe the host's standard failure (most importantly
//! [`HostError::NotFound`]). [`PackError`] covers opening and parsing an
//! alternate resource pack archive.

use thiserror::Error;

use crate::identity::ResId;

/// Failures raised by host resolution contexts.
///
/// Kept `Clone`/`PartialEq` so intercept outcomes can carry and tests can
/// assert on them directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// No resource is registered under this identifier.
    #[error("resource 0x{id:08x} not found")]
    NotFound { id: ResId },

    /// The accessor was invoked with the wrong number of arguments.
    #[error("accessor '{accessor}' expects {expected} argument(s), got {got}")]
    InvalidArguments {
        accessor: &'static str,
        expected: usize,
        got: usize,
    },

    /// The stored value cannot satisfy the accessor's return contract.
    #[error("resource 0x{id:08x} does not satisfy the '{accessor}' return contract")]
    UnexpectedType { id: ResId, accessor: &'static str },

    /// The privileged low-level injection path is not available here.
    #[error("privileged asset injection is unavailable in this context")]
    InjectionUnavailable,

    /// The archive handed to the legacy injection path could not be used.
    #[error("asset archive rejected: {0}")]
    BadArchive(String),
}

/// Failures of the modern pack-attachment strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// The context's lifecycle state makes it ineligible for attachment.
    ///
    /// Callers are expected to fall back to the legacy injection path.
    #[error("context is not registered with the resource manager")]
    NotRegistered,

    /// Attachment failed for a reason other than eligibility.
    #[error("pack attachment failed: {0}")]
    Failed(String),
}

/// Errors that can occur while opening an alternate resource pack.
#[derive(Error, Debug)]
pub enum PackError {
    /// Filesystem I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is not a readable ZIP.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The manifest is not valid JSON.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The archive does not contain a `resources.json` manifest.
    #[error("missing resources.json manifest")]
    MissingManifest,

    /// The manifest declares no owning package name.
    #[error("manifest declares no package name")]
    EmptyPackage,
}
