//! In-memory reference host.
//!
//! [`ResourceTable`] is a complete, hookable resolution context: it owns
//! id-to-value entries, a display-density scale, attached alternate packs,
//! and routes every accessor call through its [`HostHooks`] before the
//! original lookup runs. It is what the engine's tests (and any embedding
//! that does not bind a real host) resolve against.
//!
//! [`TypedSlots`] models the typed-attribute-block surface: a packed word
//! array in which each slot stores its value type at offset 0, the raw value
//! word at offset 1, and the minting resource id at offset 3.

use std::collections::HashMap;
use std::sync::Arc;

use camino::Utf8Path;
use parking_lot::RwLock;

use crate::affinity::AffinityExecutor;
use crate::context::ResolutionContext;
use crate::error::{AttachError, HostError};
use crate::hooks::HostHooks;
use crate::identity::{ResId, ResourceIdentity};
use crate::pack::{PackHandle, ResourcePack};
use crate::surface::{AccessorKind, TYPED_COLOR_AT};
use crate::value::Value;

struct TableEntry {
    identity: ResourceIdentity,
    value: Value,
}

/// A hookable, in-memory resolution context.
pub struct ResourceTable {
    label: String,
    hooks: Arc<HostHooks>,
    density_scale: f64,
    entries: RwLock<HashMap<ResId, TableEntry>>,
    attached: RwLock<Vec<PackHandle>>,
    injected: RwLock<Vec<PackHandle>>,
    manager_registered: bool,
    injection_available: bool,
    affinity: Option<Arc<AffinityExecutor>>,
}

impl ResourceTable {
    /// Create a table wired to the given hook registries.
    ///
    /// Defaults: density scale `1.0`, registered with its resource manager,
    /// privileged injection available, no thread affinity.
    pub fn new(label: impl Into<String>, hooks: Arc<HostHooks>) -> Self {
        Self {
            label: label.into(),
            hooks,
            density_scale: 1.0,
            entries: RwLock::new(HashMap::new()),
            attached: RwLock::new(Vec::new()),
            injected: RwLock::new(Vec::new()),
            manager_registered: true,
            injection_available: true,
            affinity: None,
        }
    }

    /// Set the display-density scale factor.
    pub fn with_density_scale(mut self, scale: f64) -> Self {
        self.density_scale = scale;
        self
    }

    /// Confine attachment operations to the given executor thread.
    pub fn with_affinity(mut self, executor: Arc<AffinityExecutor>) -> Self {
        self.affinity = Some(executor);
        self
    }

    /// Mark the table as not registered with its resource manager, which
    /// makes the modern attachment strategy ineligible.
    pub fn detached_from_manager(mut self) -> Self {
        self.manager_registered = false;
        self
    }

    /// Disable the privileged low-level injection path.
    pub fn without_injection(mut self) -> Self {
        self.injection_available = false;
        self
    }

    /// Register an entry. A later definition for the same id wins.
    pub fn define(&self, id: ResId, identity: ResourceIdentity, value: Value) {
        self.entries.write().insert(id, TableEntry { identity, value });
    }

    /// The hook registries this table dispatches through.
    pub fn hooks(&self) -> &Arc<HostHooks> {
        &self.hooks
    }

    fn lookup_value(&self, id: ResId) -> Option<Value> {
        if let Some(entry) = self.entries.read().get(&id) {
            return Some(entry.value.clone());
        }
        for pack in self.attached.read().iter() {
            if let Some(entry) = pack.entry(id) {
                return Some(entry.value.clone());
            }
        }
        for pack in self.injected.read().iter() {
            if let Some(entry) = pack.entry(id) {
                return Some(entry.value.clone());
            }
        }
        None
    }

    fn invoke_original(&self, kind: AccessorKind, args: &[i64]) -> Result<Value, HostError> {
        let expected = kind.shape().arity();
        if args.len() != expected {
            return Err(HostError::InvalidArguments {
                accessor: kind.name(),
                expected,
                got: args.len(),
            });
        }
        let id = u32::try_from(args[0]).unwrap_or(0);
        self.lookup_value(id).ok_or(HostError::NotFound { id })
    }

    fn rounded(&self, kind: AccessorKind, id: ResId, value: Value) -> Result<i64, HostError> {
        value
            .as_f64()
            .map(|v| v.round() as i64)
            .ok_or(HostError::UnexpectedType {
                id,
                accessor: kind.name(),
            })
    }

    // Convenience accessors over the raw `invoke` dispatch.

    /// Resolve an integer resource.
    pub fn integer(&self, id: ResId) -> Result<i64, HostError> {
        let value = self.invoke(AccessorKind::Integer, &[id as i64])?;
        self.rounded(AccessorKind::Integer, id, value)
    }

    /// Resolve a boolean resource.
    pub fn boolean(&self, id: ResId) -> Result<bool, HostError> {
        match self.invoke(AccessorKind::Boolean, &[id as i64])? {
            Value::Bool(v) => Ok(v),
            _ => Err(HostError::UnexpectedType {
                id,
                accessor: AccessorKind::Boolean.name(),
            }),
        }
    }

    /// Resolve a floating-point resource.
    pub fn float_value(&self, id: ResId) -> Result<f64, HostError> {
        let value = self.invoke(AccessorKind::Float, &[id as i64])?;
        value.as_f64().ok_or(HostError::UnexpectedType {
            id,
            accessor: AccessorKind::Float.name(),
        })
    }

    /// Resolve a text resource.
    pub fn text(&self, id: ResId) -> Result<String, HostError> {
        match self.invoke(AccessorKind::Text, &[id as i64])? {
            Value::Text(v) => Ok(v),
            _ => Err(HostError::UnexpectedType {
                id,
                accessor: AccessorKind::Text.name(),
            }),
        }
    }

    /// Resolve a text resource, or return `fallback` when it is absent or
    /// not text.
    ///
    /// This is the `text/2` overload of the surface contract. Its trailing
    /// argument is not an identifier, so it is not routed through the hook
    /// dispatch and cannot be overridden.
    pub fn text_or(&self, id: ResId, fallback: &str) -> String {
        match self.lookup_value(id) {
            Some(Value::Text(v)) => v,
            _ => fallback.to_string(),
        }
    }

    /// Resolve a dimension in scaled units.
    pub fn dimension(&self, id: ResId) -> Result<f64, HostError> {
        let value = self.invoke(AccessorKind::Dimension, &[id as i64])?;
        value.as_f64().ok_or(HostError::UnexpectedType {
            id,
            accessor: AccessorKind::Dimension.name(),
        })
    }

    /// Resolve a dimension as an integral pixel offset.
    pub fn dimension_offset(&self, id: ResId) -> Result<i64, HostError> {
        let value = self.invoke(AccessorKind::DimensionOffset, &[id as i64])?;
        self.rounded(AccessorKind::DimensionOffset, id, value)
    }

    /// Resolve a dimension as an integral pixel size.
    pub fn dimension_size(&self, id: ResId) -> Result<i64, HostError> {
        let value = self.invoke(AccessorKind::DimensionSize, &[id as i64])?;
        self.rounded(AccessorKind::DimensionSize, id, value)
    }

    /// Resolve a color against a theme token.
    pub fn color(&self, id: ResId, theme: i64) -> Result<i64, HostError> {
        let value = self.invoke(AccessorKind::Color, &[id as i64, theme])?;
        self.rounded(AccessorKind::Color, id, value)
    }

    /// Resolve a fraction against a base and a parent base.
    pub fn fraction(&self, id: ResId, base: i64, pbase: i64) -> Result<f64, HostError> {
        let value = self.invoke(AccessorKind::Fraction, &[id as i64, base, pbase])?;
        value.as_f64().ok_or(HostError::UnexpectedType {
            id,
            accessor: AccessorKind::Fraction.name(),
        })
    }
}

impl ResolutionContext for ResourceTable {
    fn label(&self) -> &str {
        &self.label
    }

    fn invoke(&self, kind: AccessorKind, args: &[i64]) -> Result<Value, HostError> {
        let descriptor = kind.descriptor();
        let receiver: &dyn ResolutionContext = self;
        if let Some(outcome) = self.hooks.resources.dispatch_before(&descriptor, receiver, args) {
            return outcome;
        }
        self.invoke_original(kind, args)
    }

    fn identify(&self, id: ResId) -> Result<ResourceIdentity, HostError> {
        if let Some(entry) = self.entries.read().get(&id) {
            return Ok(entry.identity.clone());
        }
        for pack in self.attached.read().iter() {
            if let Some(entry) = pack.entry(id) {
                return Ok(entry.identity.clone());
            }
        }
        for pack in self.injected.read().iter() {
            if let Some(entry) = pack.entry(id) {
                return Ok(entry.identity.clone());
            }
        }
        Err(HostError::NotFound { id })
    }

    fn density_scale(&self) -> f64 {
        self.density_scale
    }

    fn attach_pack(&self, pack: &PackHandle) -> Result<(), AttachError> {
        if !self.manager_registered {
            return Err(AttachError::NotRegistered);
        }
        let mut attached = self.attached.write();
        if attached.iter().any(|p| Arc::ptr_eq(p, pack)) {
            return Ok(());
        }
        attached.push(Arc::clone(pack));
        Ok(())
    }

    fn inject_archive(&self, path: &Utf8Path) -> Result<u32, HostError> {
        if !self.injection_available {
            return Err(HostError::InjectionUnavailable);
        }
        let pack = ResourcePack::open(path).map_err(|err| HostError::BadArchive(err.to_string()))?;
        let mut injected = self.injected.write();
        injected.push(Arc::new(pack));
        Ok(injected.len() as u32)
    }

    fn affinity(&self) -> Option<&AffinityExecutor> {
        self.affinity.as_deref()
    }
}

impl std::fmt::Debug for ResourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTable")
            .field("label", &self.label)
            .field("density_scale", &self.density_scale)
            .field("entries", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

/// Words per slot in a typed-attribute block.
pub const SLOT_WORDS: usize = 6;

/// Value-type word marking an empty slot.
pub const SLOT_TYPE_NULL: i64 = 0;

const SLOT_DATA_OFFSET: usize = 1;
const SLOT_ID_OFFSET: usize = 3;

/// Append one slot to a typed-block backing array.
pub fn push_slot(data: &mut Vec<i64>, ty: i64, value: i64, id: ResId) {
    data.extend_from_slice(&[ty, value, 0, id as i64, 0, 0]);
}

/// A typed-attribute block: pre-resolved attribute values in a packed word
/// array, addressed by slot index.
pub struct TypedSlots {
    owner: Arc<ResourceTable>,
    data: Vec<i64>,
}

impl TypedSlots {
    /// Create a block over a packed backing array.
    pub fn new(owner: Arc<ResourceTable>, data: Vec<i64>) -> Self {
        Self { owner, data }
    }

    /// The raw backing array.
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    /// The table this block was obtained from.
    pub fn owner(&self) -> &Arc<ResourceTable> {
        &self.owner
    }

    /// Decode the value type and minting resource id at `index`.
    ///
    /// Returns `None` when the index does not address a complete slot.
    pub fn slot_at(&self, index: usize) -> Option<(i64, ResId)> {
        if index + SLOT_ID_OFFSET >= self.data.len() {
            return None;
        }
        let ty = self.data[index];
        let id = u32::try_from(self.data[index + SLOT_ID_OFFSET]).unwrap_or(0);
        Some((ty, id))
    }

    /// Read the color stored at `index`, or `default` when the slot is
    /// empty or out of range.
    pub fn color_at(&self, index: usize, default: i64) -> i64 {
        let args = [index as i64, default];
        if let Some(outcome) = self.owner.hooks().typed.dispatch_before(&TYPED_COLOR_AT, self, &args)
        {
            return match outcome {
                Ok(value) => match value.as_f64() {
                    Some(v) => v.round() as i64,
                    None => {
                        tracing::warn!(
                            "Typed-block override for slot {} is {}, not a color; ignoring",
                            index,
                            value.type_name()
                        );
                        default
                    }
                },
                Err(_) => default,
            };
        }

        match self.slot_at(index) {
            Some((ty, id)) if ty != SLOT_TYPE_NULL && id != 0 => self.data[index + SLOT_DATA_OFFSET],
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RESOURCE_SURFACE;
    use rsk_intercept::{MethodDescriptor, hooker_fn};
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn table() -> ResourceTable {
        let table = ResourceTable::new("app", HostHooks::new());
        table.define(
            1,
            ResourceIdentity::new("com.example.app", "string", "title"),
            Value::Text("Original".into()),
        );
        table.define(
            2,
            ResourceIdentity::new("com.example.app", "integer", "columns"),
            Value::Int(3),
        );
        table
    }

    fn pack_archive(dir: &tempfile::TempDir, manifest: &str) -> camino::Utf8PathBuf {
        let path = dir.path().join("skin.pack");
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file("resources.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        std::fs::write(&path, zip.finish().unwrap().into_inner()).unwrap();
        camino::Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[test]
    fn test_accessors_resolve_defined_entries() {
        let table = table();
        assert_eq!(table.text(1).unwrap(), "Original");
        assert_eq!(table.integer(2).unwrap(), 3);
        assert_eq!(
            table.text(99),
            Err(HostError::NotFound { id: 99 })
        );
    }

    #[test]
    fn test_text_or_falls_back_without_dispatch() {
        let table = table();
        assert_eq!(table.text_or(1, "fallback"), "Original");
        assert_eq!(table.text_or(99, "fallback"), "fallback");
    }

    #[test]
    fn test_identify_covers_attached_packs() {
        let dir = tempfile::tempdir().unwrap();
        let path = pack_archive(
            &dir,
            r#"{ "package": "com.example.skin",
                 "entries": [ { "id": 40, "category": "string", "name": "extra",
                                "value": { "text": "from pack" } } ] }"#,
        );
        let pack: PackHandle = Arc::new(ResourcePack::open(&path).unwrap());

        let table = table();
        assert_eq!(table.identify(40), Err(HostError::NotFound { id: 40 }));

        table.attach_pack(&pack).unwrap();
        // Re-attaching the same handle is a no-op.
        table.attach_pack(&pack).unwrap();

        assert_eq!(
            table.identify(40).unwrap(),
            ResourceIdentity::new("com.example.skin", "string", "extra")
        );
        assert_eq!(table.text(40).unwrap(), "from pack");
    }

    #[test]
    fn test_detached_table_rejects_modern_attach() {
        let table = ResourceTable::new("plugin", HostHooks::new()).detached_from_manager();
        let pack: PackHandle = Arc::new(
            ResourcePack::from_reader(
                {
                    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                    zip.start_file("resources.json", SimpleFileOptions::default()).unwrap();
                    zip.write_all(br#"{ "package": "p", "entries": [] }"#).unwrap();
                    zip.finish().unwrap()
                },
                "mem.pack",
            )
            .unwrap(),
        );
        assert_eq!(table.attach_pack(&pack), Err(AttachError::NotRegistered));
    }

    #[test]
    fn test_injection_respects_availability() {
        let dir = tempfile::tempdir().unwrap();
        let path = pack_archive(
            &dir,
            r#"{ "package": "com.example.skin",
                 "entries": [ { "id": 41, "category": "string", "name": "legacy",
                                "value": { "text": "injected" } } ] }"#,
        );

        let open = table();
        let cookie = open.inject_archive(&path).unwrap();
        assert_eq!(cookie, 1);
        assert_eq!(open.text(41).unwrap(), "injected");

        let sealed = ResourceTable::new("sealed", HostHooks::new()).without_injection();
        assert_eq!(
            sealed.inject_archive(&path),
            Err(HostError::InjectionUnavailable)
        );
    }

    #[test]
    fn test_hooks_run_before_the_original_lookup() {
        let table = table();
        let descriptor = AccessorKind::Text.descriptor();
        let token = table
            .hooks()
            .resources
            .hook(
                descriptor,
                hooker_fn(|call| {
                    if call.arg(0) == Some(1) {
                        call.return_and_skip(Ok(Value::Text("Hooked".into())));
                    }
                }),
            )
            .unwrap();

        assert_eq!(table.text(1).unwrap(), "Hooked");
        token.remove();
        assert_eq!(table.text(1).unwrap(), "Original");
    }

    #[test]
    fn test_hooking_outside_the_surface_fails() {
        let table = table();
        let bogus = MethodDescriptor::new(RESOURCE_SURFACE, "integer", 4);
        let err = table
            .hooks()
            .resources
            .hook(bogus, hooker_fn(|_call| {}))
            .unwrap_err();
        assert_eq!(err, rsk_intercept::HookError::UnsupportedMethod(bogus));
    }

    #[test]
    fn test_typed_slots_decode_and_default() {
        let table = Arc::new(table());
        let mut data = Vec::new();
        push_slot(&mut data, 28, 0x00ff0000, 2);
        push_slot(&mut data, SLOT_TYPE_NULL, 0, 0);
        let slots = TypedSlots::new(table, data);

        assert_eq!(slots.color_at(0, -1), 0x00ff0000);
        // Null-typed slot falls back to the default.
        assert_eq!(slots.color_at(SLOT_WORDS, -1), -1);
        // Out of range falls back to the default.
        assert_eq!(slots.color_at(SLOT_WORDS * 3, -1), -1);
    }

    #[test]
    fn test_typed_hook_short_circuits() {
        let table = Arc::new(table());
        let mut data = Vec::new();
        push_slot(&mut data, 28, 0x00ff0000, 2);
        let slots = TypedSlots::new(Arc::clone(&table), data);

        table
            .hooks()
            .typed
            .hook(
                TYPED_COLOR_AT,
                hooker_fn(|call| call.return_and_skip(Ok(Value::Int(0x0000ff00)))),
            )
            .unwrap();

        assert_eq!(slots.color_at(0, -1), 0x0000ff00);
    }
}
