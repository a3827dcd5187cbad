//! Metadata adapters for the primary manifest and the packaging spec.

pub mod json_manifest;
pub mod nuspec;
pub mod toml_manifest;

pub use json_manifest::JsonManifestAdapter;
pub use nuspec::NuspecAdapter;
pub use toml_manifest::TomlManifestAdapter;

use std::path::Path;

use modforge_core::error::{Error, Result};
use modforge_core::manifest::{ManifestSynchronizer, MetadataAdapter};

/// Picks the adapter for a primary manifest from its extension.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for unsupported manifest formats.
pub fn manifest_adapter_for(path: &Path) -> Result<Box<dyn MetadataAdapter>> {
    let candidates: [Box<dyn MetadataAdapter>; 2] =
        [Box::new(TomlManifestAdapter), Box::new(JsonManifestAdapter)];

    candidates
        .into_iter()
        .find(|adapter| adapter.detect(path))
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "unsupported manifest format: {} (expected .toml or .json)",
                path.display()
            ))
        })
}

/// Picks the adapter for a packaging spec.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for unsupported spec formats.
pub fn spec_adapter_for(path: &Path) -> Result<Box<dyn MetadataAdapter>> {
    let adapter = NuspecAdapter;
    if adapter.detect(path) {
        Ok(Box::new(adapter))
    } else {
        Err(Error::InvalidConfig(format!(
            "unsupported packaging spec format: {} (expected .nuspec)",
            path.display()
        )))
    }
}

/// A synchronizer wired to the adapters of this crate.
pub fn synchronizer() -> ManifestSynchronizer {
    ManifestSynchronizer::new(manifest_adapter_for, spec_adapter_for)
}
