//! Build-scoped state threaded through every task body.

use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use crate::config::BuildConfig;
use crate::environment::{EnvironmentKind, EnvironmentReport};
use crate::error::{Error, Result};
use crate::stage;
use crate::surface::PublicSurface;
use crate::version::{Version, VersionDecision};

/// State of one build invocation.
///
/// Paths and configuration are fixed at creation. The environment kind,
/// environment report, public surface, and computed version are each written
/// exactly once by the task that produces them and read by everything
/// downstream.
pub struct BuildContext {
    source_root: PathBuf,
    output_root: PathBuf,
    config: BuildConfig,
    environment_kind: OnceCell<EnvironmentKind>,
    environment: OnceCell<EnvironmentReport>,
    surface: OnceCell<PublicSurface>,
    version: OnceCell<VersionDecision>,
}

impl BuildContext {
    /// Creates a context whose output root comes from `output.dir`.
    pub fn new(source_root: impl Into<PathBuf>, config: BuildConfig) -> Self {
        let source_root = source_root.into();
        let output_root = source_root.join(&config.output.dir);
        Self {
            source_root,
            output_root,
            config,
            environment_kind: OnceCell::new(),
            environment: OnceCell::new(),
            surface: OnceCell::new(),
            version: OnceCell::new(),
        }
    }

    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    #[inline]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    #[inline]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    #[inline]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[inline]
    pub fn module_name(&self) -> &str {
        self.config.module.name.trim()
    }

    /// Fails if the output root is, or contains, the source root or `module.source`.
    pub fn check_output_root(&self) -> Result<()> {
        stage::ensure_output_disjoint(
            &self.output_root,
            &[
                self.source_root.clone(),
                self.resolve(&self.config.module.source),
            ],
        )
    }

    /// Resolves a configured path against the source root.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.source_root.join(relative)
    }

    pub fn environment_kind(&self) -> Result<EnvironmentKind> {
        self.environment_kind
            .get()
            .copied()
            .ok_or_else(|| Error::ContextState("environment kind has not been detected".to_string()))
    }

    pub fn set_environment_kind(&self, kind: EnvironmentKind) -> Result<()> {
        self.environment_kind
            .set(kind)
            .map_err(|_| Error::ContextState("environment kind was already detected".to_string()))
    }

    pub fn environment(&self) -> Result<&EnvironmentReport> {
        self.environment
            .get()
            .ok_or_else(|| Error::ContextState("environment has not been probed".to_string()))
    }

    pub fn set_environment(&self, report: EnvironmentReport) -> Result<()> {
        self.environment
            .set(report)
            .map_err(|_| Error::ContextState("environment was already probed".to_string()))
    }

    pub fn surface(&self) -> Result<&PublicSurface> {
        self.surface
            .get()
            .ok_or_else(|| Error::ContextState("public surface has not been introspected".to_string()))
    }

    pub fn set_surface(&self, surface: PublicSurface) -> Result<()> {
        self.surface
            .set(surface)
            .map_err(|_| Error::ContextState("public surface was already introspected".to_string()))
    }

    pub fn version(&self) -> Result<Version> {
        self.version_decision().map(|d| d.version)
    }

    pub fn version_decision(&self) -> Result<&VersionDecision> {
        self.version
            .get()
            .ok_or_else(|| Error::ContextState("version has not been computed".to_string()))
    }

    pub fn set_version(&self, decision: VersionDecision) -> Result<()> {
        self.version
            .set(decision)
            .map_err(|_| Error::ContextState("version was already computed".to_string()))
    }

    /// `<output_root>/<module>/<version>`.
    pub fn staging_dir(&self) -> Result<PathBuf> {
        let version = self.version()?;
        Ok(self
            .output_root
            .join(self.module_name())
            .join(version.to_string()))
    }

    /// Directory receiving CI result files.
    pub fn results_dir(&self) -> PathBuf {
        self.output_root.join("results")
    }
}
