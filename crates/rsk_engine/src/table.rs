//! Replacement storage and the in-flight reentrancy guard.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use rsk_host::{ResId, ResourceIdentity, Value};

/// A density-independent magnitude, either numeric or in textual form.
///
/// Textual values are parsed at resolution time; an unparsable value is
/// treated as "no override" by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityValue {
    Scalar(f64),
    Text(String),
}

impl DensityValue {
    /// The numeric magnitude, if one can be produced.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            DensityValue::Scalar(v) => Some(*v),
            DensityValue::Text(v) => v.trim().parse().ok(),
        }
    }
}

impl From<f64> for DensityValue {
    fn from(v: f64) -> Self {
        DensityValue::Scalar(v)
    }
}

impl From<&str> for DensityValue {
    fn from(v: &str) -> Self {
        DensityValue::Text(v.to_string())
    }
}

impl From<String> for DensityValue {
    fn from(v: String) -> Self {
        DensityValue::Text(v)
    }
}

/// One registered replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementEntry {
    /// Redirect the accessor call to this identifier in the alternate
    /// bundle.
    Identifier(ResId),
    /// A magnitude multiplied by the calling context's display-density
    /// scale at resolution time.
    Density(DensityValue),
    /// A pre-resolved value returned as stored.
    Object(Value),
}

/// Identity-keyed replacement store.
///
/// Reads take the shared lock, so concurrent accessor calls on unrelated
/// identities do not serialize. There is no removal; re-registration for the
/// same identity replaces the previous entry.
pub(crate) struct ReplacementTable {
    entries: RwLock<HashMap<ResourceIdentity, ReplacementEntry>>,
}

impl ReplacementTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `entry` under `identity`, replacing any previous entry.
    pub(crate) fn upsert(&self, identity: ResourceIdentity, entry: ReplacementEntry) {
        self.entries.write().insert(identity, entry);
    }

    /// Probe the exact identity first, then its any-scope form.
    pub(crate) fn lookup(&self, identity: &ResourceIdentity) -> Option<ReplacementEntry> {
        let entries = self.entries.read();
        if let Some(entry) = entries.get(identity) {
            return Some(entry.clone());
        }
        entries.get(&identity.with_any_scope()).cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Identifiers currently being substituted through a delegated accessor
/// call.
///
/// While an id is held here, the resolver treats any accessor call for it as
/// "no replacement" and falls through to the host, which is what breaks
/// replacement cycles.
pub(crate) struct InFlightSet {
    ids: RwLock<HashSet<ResId>>,
}

impl InFlightSet {
    pub(crate) fn new() -> Self {
        Self {
            ids: RwLock::new(HashSet::new()),
        }
    }

    pub(crate) fn contains(&self, id: ResId) -> bool {
        self.ids.read().contains(&id)
    }

    /// Mark `id` as in flight until the returned guard drops.
    pub(crate) fn enter(&self, id: ResId) -> InFlightGuard<'_> {
        self.ids.write().insert(id);
        InFlightGuard { set: self, id }
    }
}

/// Removes its id from the set on drop, regardless of how the delegated
/// call ended.
pub(crate) struct InFlightGuard<'a> {
    set: &'a InFlightSet,
    id: ResId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.ids.write().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_wins_over_wildcard() {
        let table = ReplacementTable::new();
        table.upsert(
            ResourceIdentity::new("app.x", "string", "title"),
            ReplacementEntry::Object(Value::Text("exact".into())),
        );
        table.upsert(
            ResourceIdentity::any_scope("string", "title"),
            ReplacementEntry::Object(Value::Text("wild".into())),
        );

        let exact = table
            .lookup(&ResourceIdentity::new("app.x", "string", "title"))
            .unwrap();
        assert_eq!(exact, ReplacementEntry::Object(Value::Text("exact".into())));

        let other_scope = table
            .lookup(&ResourceIdentity::new("app.y", "string", "title"))
            .unwrap();
        assert_eq!(
            other_scope,
            ReplacementEntry::Object(Value::Text("wild".into()))
        );

        assert!(
            table
                .lookup(&ResourceIdentity::new("app.z", "string", "subtitle"))
                .is_none()
        );
    }

    #[test]
    fn test_upsert_replaces_previous_entry() {
        let table = ReplacementTable::new();
        let identity = ResourceIdentity::new("app.x", "integer", "columns");
        table.upsert(identity.clone(), ReplacementEntry::Object(Value::Int(1)));
        table.upsert(identity.clone(), ReplacementEntry::Object(Value::Int(2)));

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup(&identity).unwrap(),
            ReplacementEntry::Object(Value::Int(2))
        );
    }

    #[test]
    fn test_density_magnitude_parsing() {
        assert_eq!(DensityValue::Scalar(10.0).magnitude(), Some(10.0));
        assert_eq!(DensityValue::from("12.5").magnitude(), Some(12.5));
        assert_eq!(DensityValue::from(" 8 ").magnitude(), Some(8.0));
        assert_eq!(DensityValue::from("eight").magnitude(), None);
    }

    #[test]
    fn test_in_flight_guard_removes_on_drop() {
        let set = InFlightSet::new();
        assert!(!set.contains(7));
        {
            let _guard = set.enter(7);
            assert!(set.contains(7));
        }
        assert!(!set.contains(7));
    }
}
