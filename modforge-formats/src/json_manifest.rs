use std::fs;
use std::path::Path;

use modforge_core::error::{Error, Result};
use modforge_core::manifest::{ManifestRecord, ManifestUpdate, MetadataAdapter};
use modforge_core::version::Version;
use serde_json::Value;

/// Primary manifest stored as a JSON object.
pub struct JsonManifestAdapter;

impl JsonManifestAdapter {
    fn load(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        serde_json::from_str(&content).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to parse manifest: {}", e),
        })
    }
}

impl MetadataAdapter for JsonManifestAdapter {
    fn format(&self) -> &'static str {
        "json"
    }

    fn detect(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("json")
    }

    fn read_record(&self, path: &Path, exports_key: &str) -> Result<ManifestRecord> {
        let json = Self::load(path)?;

        let version = json
            .get("version")
            .and_then(|v| v.as_str())
            .map(Version::parse)
            .transpose()?;

        let exports = json.get(exports_key).and_then(|v| v.as_array()).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        });

        Ok(ManifestRecord { version, exports })
    }

    fn write_record(&self, path: &Path, update: &ManifestUpdate<'_>) -> Result<()> {
        let mut json = Self::load(path)?;

        let object = json.as_object_mut().ok_or_else(|| Error::Manifest {
            path: path.to_path_buf(),
            message: "manifest root is not an object".to_string(),
        })?;

        object.insert(
            "version".to_string(),
            Value::String(update.version.to_string()),
        );
        if let Some(surface) = update.exports {
            object.insert(update.exports_key.to_string(), Value::from(surface.to_vec()));
        }

        let mut updated = serde_json::to_string_pretty(&json)?;
        updated.push('\n');

        fs::write(path, updated).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to write manifest: {}", e),
        })
    }
}
