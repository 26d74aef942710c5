//! Alternate resource packs.
//!
//! A pack is a ZIP archive carrying a `resources.json` manifest that maps
//! pre-minted identifiers to typed values:
//!
//! ```json
//! {
//!   "package": "com.example.skin",
//!   "entries": [
//!     { "id": 2113924096, "category": "string", "name": "title",
//!       "value": { "text": "Overridden" } }
//!   ]
//! }
//! ```
//!
//! Packs are opened read-only and fully parsed up front; a pack that fails
//! to open leaves no partial state behind. The parsed form is shared as a
//! [`PackHandle`] between every context it gets attached to.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::sync::Arc;

use camino::Utf8Path;
use serde::Deserialize;
use zip::ZipArchive;

use crate::error::PackError;
use crate::identity::{ResId, ResourceIdentity};
use crate::value::Value;

/// Manifest filename inside the archive.
pub const PACK_MANIFEST_NAME: &str = "resources.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackManifest {
    package: String,
    #[serde(default)]
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    id: ResId,
    category: String,
    name: String,
    value: Value,
}

/// One resolvable entry of a pack.
#[derive(Debug, Clone)]
pub struct PackEntry {
    /// Structural identity of the entry, scoped to the pack's package.
    pub identity: ResourceIdentity,
    /// The stored value.
    pub value: Value,
}

/// A fully parsed alternate resource pack.
pub struct ResourcePack {
    package: String,
    entries: HashMap<ResId, PackEntry>,
    origin: String,
}

/// Shared handle to a loaded pack.
pub type PackHandle = Arc<ResourcePack>;

impl ResourcePack {
    /// Open a pack archive from disk.
    pub fn open(path: &Utf8Path) -> Result<Self, PackError> {
        let file = File::open(path.as_std_path())?;
        Self::from_reader(file, path.as_str())
    }

    /// Parse a pack archive from any seekable reader.
    ///
    /// `origin` is only used in log lines and diagnostics.
    pub fn from_reader<R: Read + Seek>(reader: R, origin: &str) -> Result<Self, PackError> {
        let mut archive = ZipArchive::new(reader)?;

        let mut manifest_content = String::new();
        match archive.by_name(PACK_MANIFEST_NAME) {
            Ok(mut file) => {
                file.read_to_string(&mut manifest_content)?;
            }
            Err(zip::result::ZipError::FileNotFound) => return Err(PackError::MissingManifest),
            Err(err) => return Err(err.into()),
        }

        // Strip UTF-8 BOM if present
        let manifest_content = manifest_content.trim_start_matches('\u{feff}').trim();
        if manifest_content.is_empty() {
            return Err(PackError::MissingManifest);
        }

        let manifest: PackManifest = serde_json::from_str(manifest_content)?;
        if manifest.package.is_empty() {
            return Err(PackError::EmptyPackage);
        }

        let mut entries = HashMap::with_capacity(manifest.entries.len());
        for entry in manifest.entries {
            let identity = ResourceIdentity::new(&manifest.package, &entry.category, &entry.name);
            let previous = entries.insert(
                entry.id,
                PackEntry {
                    identity,
                    value: entry.value,
                },
            );
            if previous.is_some() {
                tracing::warn!(
                    "Duplicate pack entry 0x{:08x} in {}; keeping the later definition",
                    entry.id,
                    origin
                );
            }
        }

        Ok(Self {
            package: manifest.package,
            entries,
            origin: origin.to_string(),
        })
    }

    /// Package name the pack's entries are scoped to.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Where the pack was loaded from (log label).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Entry registered under `id`, if any.
    pub fn entry(&self, id: ResId) -> Option<&PackEntry> {
        self.entries.get(&id)
    }

    /// `true` if the pack can resolve `id`.
    pub fn contains(&self, id: ResId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of entries in the pack.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the pack has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResourcePack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePack")
            .field("package", &self.package)
            .field("entries", &self.entries.len())
            .field("origin", &self.origin)
            .finish()
    }
}
