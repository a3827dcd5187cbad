//! Read-only lookup of previously published module versions.
//!
//! A package source answers one question: what was the latest publication of
//! a module, and which operations did it export. Both backends read the same
//! index document, `<module>/index.json`:
//!
//! ```json
//! {
//!   "versions": [
//!     { "version": "1.2.0", "exports": ["Get-Thing", "Set-Thing"] },
//!     { "version": "1.1.4", "export_count": 1 }
//!   ]
//! }
//! ```

pub mod filesystem;
pub mod http;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::version::Version;

pub use filesystem::FilesystemSource;
pub use http::HttpSource;

/// A published version of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub version: Version,
    /// Exported operation names, when the publisher recorded them.
    #[serde(default)]
    pub exports: Option<Vec<String>>,
    /// Number of exported operations, for publications without names.
    #[serde(default)]
    pub export_count: Option<usize>,
}

impl Publication {
    pub fn surface_size(&self) -> usize {
        self.exports
            .as_ref()
            .map(Vec::len)
            .or(self.export_count)
            .unwrap_or(0)
    }
}

/// Index document listing every publication of one module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicationIndex {
    #[serde(default)]
    pub versions: Vec<Publication>,
}

impl PublicationIndex {
    /// Parses an index document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageSource`] if the document is malformed.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::PackageSource(format!("malformed index at {}: {}", origin, e)))
    }

    /// Returns the publication with the highest version.
    pub fn latest(self) -> Option<Publication> {
        self.versions.into_iter().max_by_key(|p| p.version)
    }
}

/// Trait for package sources.
///
/// Lookups distinguish "never published" (`Ok(None)`) from failures of the
/// source itself (`Err`). Failures are never retried.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Human-readable location of the source, for diagnostics.
    fn describe(&self) -> String;

    /// Fetches the latest publication of `module`.
    ///
    /// # Errors
    ///
    /// Returns an error for transport, authentication, or format failures.
    /// A module that was never published returns `Ok(None)`.
    async fn latest(&self, module: &str) -> Result<Option<Publication>>;
}

/// Builds the package source described by the registry configuration.
///
/// A relative feed `path` is resolved against `base`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn from_config(config: &RegistryConfig, base: &Path) -> Result<Option<Arc<dyn PackageSource>>> {
    if let Some(url) = &config.url {
        let token = config
            .token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty());
        return Ok(Some(Arc::new(HttpSource::new(url, token)?)));
    }

    if let Some(path) = &config.path {
        return Ok(Some(Arc::new(FilesystemSource::new(base.join(path)))));
    }

    Ok(None)
}
