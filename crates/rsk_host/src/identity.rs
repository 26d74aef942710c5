//! Resource identifiers and structural identities.

use std::fmt;

use xxhash_rust::xxh3::xxh3_64;

/// Numeric resource identifier as minted by a host resource table.
pub type ResId = u32;

/// Scope sentinel matching any owning package.
pub const ANY_SCOPE: &str = "*";

/// Base of the reserved identifier range used for module-supplied entries.
///
/// Ids minted by [`synthetic_res_id`] live in `0x7e00f000..=0x7e00ffff`
/// plus the hashed low bits, outside the ranges host tables assign.
const SYNTHETIC_ID_BASE: ResId = 0x7e00_f000;

/// The structural identity a numeric identifier maps to.
///
/// Equality is exact and case-sensitive on all three fields; no
/// normalization is applied. Identities are derived from an identifier once
/// per accessor call and never cached beyond it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    /// Owning package name, or [`ANY_SCOPE`].
    pub scope: String,
    /// Resource category ("string", "color", "dimen", ...).
    pub category: String,
    /// Entry name within the category.
    pub name: String,
}

impl ResourceIdentity {
    /// Create an identity from its three components.
    pub fn new(
        scope: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            category: category.into(),
            name: name.into(),
        }
    }

    /// Create an identity under the [`ANY_SCOPE`] sentinel.
    pub fn any_scope(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ANY_SCOPE, category, name)
    }

    /// The same category and name under the [`ANY_SCOPE`] sentinel.
    pub fn with_any_scope(&self) -> Self {
        Self::new(ANY_SCOPE, self.category.clone(), self.name.clone())
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.scope, self.category, self.name)
    }
}

/// Mint a stable identifier for a module-supplied resource name.
///
/// The id is derived from an xxHash3 of the name, folded into a reserved
/// range so it cannot collide with identifiers minted by host tables.
pub fn synthetic_res_id(name: &str) -> ResId {
    SYNTHETIC_ID_BASE | (xxh3_64(name.as_bytes()) as ResId & 0x00ff_ffff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_is_exact() {
        let a = ResourceIdentity::new("app.x", "string", "title");
        assert_eq!(a, ResourceIdentity::new("app.x", "string", "title"));
        assert_ne!(a, ResourceIdentity::new("app.x", "string", "Title"));
        assert_ne!(a, ResourceIdentity::new("app.y", "string", "title"));
    }

    #[test]
    fn test_any_scope_helpers() {
        let exact = ResourceIdentity::new("app.x", "color", "accent");
        let wild = exact.with_any_scope();
        assert_eq!(wild, ResourceIdentity::any_scope("color", "accent"));
        assert_eq!(wild.scope, ANY_SCOPE);
    }

    #[test]
    fn test_synthetic_ids_are_stable_and_reserved() {
        let id = synthetic_res_id("status_icon");
        assert_eq!(id, synthetic_res_id("status_icon"));
        assert_eq!(id & 0xff00_f000, SYNTHETIC_ID_BASE);
    }

    #[test]
    fn test_display() {
        let identity = ResourceIdentity::new("app.x", "dimen", "padding");
        assert_eq!(identity.to_string(), "app.x:dimen/padding");
    }
}
