use std::fs;
use std::path::Path;

use modforge_core::error::{Error, Result};
use modforge_core::manifest::{ManifestRecord, ManifestUpdate, MetadataAdapter};
use modforge_core::version::Version;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

/// Primary manifest stored as a TOML document with top-level `version` and
/// exports keys.
///
/// Edits go through `toml_edit`, so comments, key order, and formatting of
/// everything except the two written values survive.
pub struct TomlManifestAdapter;

impl TomlManifestAdapter {
    fn load(path: &Path) -> Result<DocumentMut> {
        let content = fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        content.parse().map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to parse manifest: {}. File may be malformed.", e),
        })
    }
}

/// Replaces `key` in place, keeping the whitespace and trailing comment around
/// an existing value. Appends the key when it is absent.
fn set_value(table: &mut Table, key: &str, mut value: Value) {
    match table.get_mut(key).and_then(Item::as_value_mut) {
        Some(existing) => {
            *value.decor_mut() = existing.decor().clone();
            *existing = value;
        }
        None => {
            table.insert(key, Item::Value(value));
        }
    }
}

impl MetadataAdapter for TomlManifestAdapter {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn detect(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("toml")
    }

    fn read_record(&self, path: &Path, exports_key: &str) -> Result<ManifestRecord> {
        let doc = Self::load(path)?;

        let version = doc
            .get("version")
            .and_then(Item::as_str)
            .map(Version::parse)
            .transpose()?;

        let exports = doc.get(exports_key).and_then(Item::as_array).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        });

        Ok(ManifestRecord { version, exports })
    }

    fn write_record(&self, path: &Path, update: &ManifestUpdate<'_>) -> Result<()> {
        let mut doc = Self::load(path)?;
        let table = doc.as_table_mut();

        set_value(table, "version", Value::from(update.version.to_string()));
        if let Some(surface) = update.exports {
            let names: Array = surface.iter().map(|name| name.to_string()).collect();
            set_value(table, update.exports_key, Value::Array(names));
        }

        fs::write(path, doc.to_string()).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to write manifest: {}", e),
        })
    }
}
