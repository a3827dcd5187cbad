//! Environment probe: CI or local, and what was published before.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::source::{PackageSource, Publication};
use crate::version::Version;

/// Whether the build runs in an automated pipeline or on a developer machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    Ci,
    Local,
}

impl EnvironmentKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::Ci => "ci",
            EnvironmentKind::Local => "local",
        }
    }

    #[inline]
    pub fn is_ci(&self) -> bool {
        matches!(self, EnvironmentKind::Ci)
    }
}

/// The previous publication as seen by the version calculator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviousRelease {
    pub version: Version,
    pub surface_size: usize,
    /// Operation names, when the publication recorded them.
    pub surface: Option<BTreeSet<String>>,
}

impl PreviousRelease {
    /// No prior publication: version 0.0.0 with an empty surface.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_publication(publication: &Publication) -> Self {
        Self {
            version: publication.version,
            surface_size: publication.surface_size(),
            surface: publication
                .exports
                .as_ref()
                .map(|names| names.iter().cloned().collect()),
        }
    }
}

/// Result of probing the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentReport {
    pub kind: EnvironmentKind,
    pub previous: PreviousRelease,
}

/// Returns `true` for `1`, `true`, `yes` and `on`, ignoring case and surrounding whitespace.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Determines the environment kind and resolves the previous publication.
pub struct EnvironmentProbe {
    ci_variable: String,
    source: Option<Arc<dyn PackageSource>>,
}

impl EnvironmentProbe {
    pub fn new(ci_variable: impl Into<String>) -> Self {
        Self {
            ci_variable: ci_variable.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<Arc<dyn PackageSource>>) -> Self {
        self.source = source;
        self
    }

    pub fn ci_variable(&self) -> &str {
        &self.ci_variable
    }

    /// Reads the CI signal from the process environment.
    pub fn detect_kind(&self) -> EnvironmentKind {
        self.detect_kind_with(|name| std::env::var(name).ok())
    }

    pub fn detect_kind_with<F>(&self, lookup: F) -> EnvironmentKind
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&self.ci_variable) {
            Some(value) if is_truthy(&value) => EnvironmentKind::Ci,
            _ => EnvironmentKind::Local,
        }
    }

    /// Probes the process environment for `module`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageSource`] if the previous publication cannot be
    /// looked up because the source itself failed.
    pub fn probe(&self, module: &str) -> Result<EnvironmentReport> {
        self.probe_with(module, |name| std::env::var(name).ok())
    }

    /// Same as [`probe`](Self::probe) with an injectable environment lookup.
    pub fn probe_with<F>(&self, module: &str, lookup: F) -> Result<EnvironmentReport>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self.detect_kind_with(lookup);
        debug!(variable = %self.ci_variable, kind = kind.as_str(), "detected environment");
        self.probe_kind(kind, module)
    }

    /// Resolves the previous publication for an already detected `kind`.
    pub fn probe_kind(&self, kind: EnvironmentKind, module: &str) -> Result<EnvironmentReport> {
        if kind == EnvironmentKind::Local {
            warn!("local build: the resulting artifact is for local verification only, not for publication");
            return Ok(EnvironmentReport {
                kind,
                previous: PreviousRelease::none(),
            });
        }

        let previous = match &self.source {
            Some(source) => self.lookup_previous(source.as_ref(), module)?,
            None => {
                warn!("CI build without a package source; assuming no prior publication");
                PreviousRelease::none()
            }
        };

        Ok(EnvironmentReport { kind, previous })
    }

    fn lookup_previous(&self, source: &dyn PackageSource, module: &str) -> Result<PreviousRelease> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::PackageSource(format!("Failed to create tokio runtime: {}", e)))?;

        match rt.block_on(source.latest(module))? {
            Some(publication) => {
                info!(
                    module,
                    source = %source.describe(),
                    version = %publication.version,
                    exports = publication.surface_size(),
                    "found previous publication"
                );
                Ok(PreviousRelease::from_publication(&publication))
            }
            None => {
                info!(module, source = %source.describe(), "no previous publication");
                Ok(PreviousRelease::none())
            }
        }
    }
}
