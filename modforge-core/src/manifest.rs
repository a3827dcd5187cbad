//! Metadata adapters and the manifest synchronizer.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::surface::PublicSurface;
use crate::version::Version;

/// Fields read back from a metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestRecord {
    pub version: Option<Version>,
    /// Exported operation list, for formats that carry one.
    pub exports: Option<Vec<String>>,
}

/// Targeted update applied to a metadata file.
#[derive(Debug, Clone, Copy)]
pub struct ManifestUpdate<'a> {
    pub version: Version,
    /// Replaces the exported operation list when present.
    pub exports: Option<&'a PublicSurface>,
    pub exports_key: &'a str,
}

/// Trait for format-specific metadata operations.
///
/// Adapters edit only the fields they are asked to; everything else in the
/// file is carried through unchanged.
pub trait MetadataAdapter: Send + Sync {
    fn format(&self) -> &'static str;
    fn detect(&self, path: &Path) -> bool;
    fn read_record(&self, path: &Path, exports_key: &str) -> Result<ManifestRecord>;
    fn write_record(&self, path: &Path, update: &ManifestUpdate<'_>) -> Result<()>;
}

type AdapterGetter = Box<dyn Fn(&Path) -> Result<Box<dyn MetadataAdapter>> + Send + Sync>;

/// Files written by a synchronization.
#[derive(Debug, Clone)]
pub struct SyncTargets {
    pub manifest: PathBuf,
    pub spec: PathBuf,
    pub exports_key: String,
}

impl SyncTargets {
    pub fn from_context(ctx: &BuildContext) -> Self {
        let module = &ctx.config().module;
        Self {
            manifest: ctx.resolve(&module.manifest),
            spec: ctx.resolve(&module.spec),
            exports_key: module.exports_key.clone(),
        }
    }
}

/// Keeps the primary manifest and the packaging spec in step with the
/// computed version.
pub struct ManifestSynchronizer {
    manifest_getter: AdapterGetter,
    spec_getter: AdapterGetter,
}

impl ManifestSynchronizer {
    /// Creates a synchronizer.
    ///
    /// The getters pick the adapter for the primary manifest and for the
    /// packaging spec from their paths.
    pub fn new<M, S>(manifest_getter: M, spec_getter: S) -> Self
    where
        M: Fn(&Path) -> Result<Box<dyn MetadataAdapter>> + Send + Sync + 'static,
        S: Fn(&Path) -> Result<Box<dyn MetadataAdapter>> + Send + Sync + 'static,
    {
        Self {
            manifest_getter: Box::new(manifest_getter),
            spec_getter: Box::new(spec_getter),
        }
    }

    /// Writes `version` and `surface` into the manifest and `version` into the spec.
    ///
    /// Both writes are attempted even if the first fails, and neither is
    /// rolled back.
    ///
    /// # Errors
    ///
    /// Returns the write's own error (e.g. [`Error::SpecNotFound`]) if exactly
    /// one write failed, and [`Error::Sync`] carrying both if both failed.
    pub fn sync(&self, targets: &SyncTargets, version: Version, surface: &PublicSurface) -> Result<()> {
        let primary = self.write_checked(
            &self.manifest_getter,
            &targets.manifest,
            &ManifestUpdate {
                version,
                exports: Some(surface),
                exports_key: &targets.exports_key,
            },
        );
        let spec = self.write_checked(
            &self.spec_getter,
            &targets.spec,
            &ManifestUpdate {
                version,
                exports: None,
                exports_key: &targets.exports_key,
            },
        );

        let mut failures = Vec::new();
        for (label, result) in [("manifest", primary), ("spec", spec)] {
            match result {
                Ok(path) => info!(file = label, path = %path.display(), %version, "updated metadata"),
                Err(e) => {
                    warn!(file = label, error = %e, "metadata update failed");
                    failures.push(e);
                }
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(Error::Sync { failures }),
        }
    }

    fn write_checked(
        &self,
        getter: &AdapterGetter,
        path: &Path,
        update: &ManifestUpdate<'_>,
    ) -> Result<PathBuf> {
        let adapter = getter(path)?;
        adapter.write_record(path, update)?;

        let record = adapter.read_record(path, update.exports_key)?;
        if record.version != Some(update.version) {
            return Err(Error::Manifest {
                path: path.to_path_buf(),
                message: format!(
                    "version reads back as {:?} after writing {}",
                    record.version.map(|v| v.to_string()),
                    update.version
                ),
            });
        }
        Ok(path.to_path_buf())
    }

    /// Reads the manifest and spec records without modifying them.
    pub fn read(&self, targets: &SyncTargets) -> (Result<ManifestRecord>, Result<ManifestRecord>) {
        let manifest = (self.manifest_getter)(&targets.manifest)
            .and_then(|a| a.read_record(&targets.manifest, &targets.exports_key));
        let spec = (self.spec_getter)(&targets.spec)
            .and_then(|a| a.read_record(&targets.spec, &targets.exports_key));
        (manifest, spec)
    }
}
