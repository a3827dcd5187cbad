//! TOML configuration parsing for `modforge.toml`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::SurfaceComparison;

pub const CONFIG_FILE_NAME: &str = "modforge.toml";

/// Build configuration as defined in `modforge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub module: ModuleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub gates: GatesConfig,
    #[serde(default)]
    pub stage: StageConfig,
}

/// The module being built. Paths are relative to the source root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    /// Directory whose contents are staged into the output.
    #[serde(default = "default_source_dir")]
    pub source: PathBuf,
    /// Implementation artifact the public surface is read from.
    pub artifact: PathBuf,
    /// Primary manifest (`.toml` or `.json`).
    pub manifest: PathBuf,
    /// Secondary packaging spec (XML).
    pub spec: PathBuf,
    /// Manifest field holding the exported operation list.
    #[serde(default = "default_exports_key")]
    pub exports_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Variable whose truthy value marks a CI run.
    #[serde(default = "default_ci_variable")]
    pub ci_variable: String,
    /// Major version stamped into result file names. Defaults to modforge's own.
    #[serde(default)]
    pub runtime_major: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            ci_variable: default_ci_variable(),
            runtime_major: None,
        }
    }
}

/// Where previous publications are looked up. At most one of `url` and `path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    /// Environment variable holding a bearer token for `url`.
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub pattern: Option<String>,
    pub command: Option<String>,
    #[serde(default)]
    pub comparison: SurfaceComparison,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatesConfig {
    pub lint: Option<LintGateConfig>,
    pub test: Option<TestGateConfig>,
    pub coverage: Option<CoverageGateConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintGateConfig {
    pub command: String,
    /// Report file written by the tool; stdout is parsed when absent.
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub max_findings: usize,
    #[serde(default = "default_fail_on")]
    pub fail_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestGateConfig {
    pub command: String,
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub max_failures: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageGateConfig {
    pub command: String,
    pub report: Option<PathBuf>,
    #[serde(default = "default_min_percent")]
    pub min_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Regexes matched against file names; matching files are not staged.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_exports_key() -> String {
    "exports".to_string()
}

/// Folds `.` and `..` out of a relative path. `None` for absolute paths and
/// paths that climb above their base, which only a filesystem check can judge.
fn lexical_relative(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::Normal(part) => normalized.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_ci_variable() -> String {
    "CI".to_string()
}

fn default_fail_on() -> Vec<String> {
    vec!["error".to_string(), "warning".to_string()]
}

fn default_min_percent() -> f64 {
    80.0
}

fn default_exclude() -> Vec<String> {
    vec![r"(?i)\.tests\.".to_string(), r"(?i)\.analyzer\.".to_string()]
}

impl BuildConfig {
    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file does not exist, a TOML
    /// error if it is malformed, and [`Error::InvalidConfig`] if it fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str, context: &str) -> Result<Self> {
        let config: BuildConfig = toml::from_str(content).map_err(|error| Error::Toml {
            error,
            context: context.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.module.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidConfig("module.name cannot be empty".to_string()));
        }
        if name.contains(|c| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(Error::InvalidConfig(format!(
                "module.name '{}' must not contain path separators",
                name
            )));
        }

        if let (Some(output), Some(source)) = (
            lexical_relative(&self.output.dir),
            lexical_relative(&self.module.source),
        ) {
            if source.starts_with(&output) {
                return Err(Error::InvalidConfig(format!(
                    "output.dir '{}' must not be the source root or contain module.source '{}'",
                    self.output.dir.display(),
                    self.module.source.display()
                )));
            }
        }

        if self.module.exports_key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "module.exports_key cannot be empty".to_string(),
            ));
        }

        if self.registry.url.is_some() && self.registry.path.is_some() {
            return Err(Error::InvalidConfig(
                "registry.url and registry.path are mutually exclusive".to_string(),
            ));
        }

        if self.surface.pattern.is_some() && self.surface.command.is_some() {
            return Err(Error::InvalidConfig(
                "surface.pattern and surface.command are mutually exclusive".to_string(),
            ));
        }

        if let Some(coverage) = &self.gates.coverage {
            if !(0.0..=100.0).contains(&coverage.min_percent) {
                return Err(Error::InvalidConfig(format!(
                    "gates.coverage.min_percent must be between 0 and 100, got {}",
                    coverage.min_percent
                )));
            }
        }

        self.exclude_patterns()?;
        Ok(())
    }

    /// Compiles the staging exclude patterns.
    pub fn exclude_patterns(&self) -> Result<Vec<Regex>> {
        self.stage
            .exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::InvalidConfig(format!("invalid stage.exclude pattern '{}': {}", pattern, e))
                })
            })
            .collect()
    }

    /// Major version stamped into CI result file names.
    pub fn runtime_major(&self) -> u64 {
        self.environment
            .runtime_major
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0))
    }
}
