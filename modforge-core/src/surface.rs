//! Public surface introspection.
//!
//! The implementation artifact is never read in place. Each introspection
//! copies it into a fresh [`IsolatedContext`], extracts the exported
//! operation names there, and removes the context when it goes out of scope,
//! whether extraction succeeded or not.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::debug;

use crate::config::SurfaceConfig;
use crate::error::{Error, Result};

/// Pattern used when no extraction strategy is configured.
pub const DEFAULT_EXPORT_PATTERN: &str =
    r"(?m)^\s*export\s+(?:function\s+|fn\s+)?([A-Za-z_][A-Za-z0-9_-]*)";

/// The set of operations a module deliberately exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSurface(BTreeSet<String>);

impl PublicSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Operation names in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

/// A disposable directory holding a private copy of the artifact.
///
/// Dropping the context deletes the directory and everything in it.
pub struct IsolatedContext {
    dir: TempDir,
    artifact: PathBuf,
}

impl IsolatedContext {
    /// Creates a context and copies `artifact` into it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the artifact does not exist or cannot be copied.
    pub fn create(artifact: &Path) -> Result<Self> {
        let file_name = artifact.file_name().ok_or_else(|| Error::Load {
            path: artifact.to_path_buf(),
            message: "artifact path has no file name".to_string(),
        })?;

        if !artifact.is_file() {
            return Err(Error::Load {
                path: artifact.to_path_buf(),
                message: "artifact not found".to_string(),
            });
        }

        let dir = tempfile::Builder::new()
            .prefix("modforge-introspect-")
            .tempdir()
            .map_err(|e| Error::Load {
                path: artifact.to_path_buf(),
                message: format!("failed to create isolated context: {}", e),
            })?;

        let staged = dir.path().join(file_name);
        fs::copy(artifact, &staged).map_err(|e| Error::Load {
            path: artifact.to_path_buf(),
            message: format!("failed to copy artifact into isolated context: {}", e),
        })?;

        debug!(context = %dir.path().display(), "created isolated introspection context");

        Ok(Self {
            dir,
            artifact: staged,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the artifact copy inside the context.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}

enum Strategy {
    Declared(Regex),
    Command(String),
}

/// Extracts a [`PublicSurface`] from an implementation artifact.
pub struct SurfaceIntrospector {
    strategy: Strategy,
}

impl SurfaceIntrospector {
    /// Creates an introspector that applies `pattern` to the artifact text.
    ///
    /// The first capture group of every match is an exported operation name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the pattern is invalid or has no capture group.
    pub fn declared(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("invalid surface pattern: {}", e)))?;
        if regex.captures_len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "surface pattern '{}' must contain a capture group for the operation name",
                pattern
            )));
        }
        Ok(Self {
            strategy: Strategy::Declared(regex),
        })
    }

    /// Creates an introspector that runs an external command inside the context.
    ///
    /// The staged artifact path is passed as the last argument and every
    /// non-empty line of standard output is an operation name.
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Command(command.into()),
        }
    }

    pub fn from_config(config: &SurfaceConfig) -> Result<Self> {
        match (&config.command, &config.pattern) {
            (Some(command), _) => Ok(Self::command(command.clone())),
            (None, Some(pattern)) => Self::declared(pattern),
            (None, None) => Self::declared(DEFAULT_EXPORT_PATTERN),
        }
    }

    /// Introspects `artifact` inside a fresh isolated context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the artifact cannot be loaded or extraction fails.
    pub fn introspect(&self, artifact: &Path) -> Result<PublicSurface> {
        let context = IsolatedContext::create(artifact)?;
        let surface = self.introspect_in(&context);
        drop(context);
        surface
    }

    /// Introspects the artifact already staged in `context`.
    pub fn introspect_in(&self, context: &IsolatedContext) -> Result<PublicSurface> {
        match &self.strategy {
            Strategy::Declared(regex) => Self::extract_declared(regex, context.artifact()),
            Strategy::Command(command) => Self::extract_with_command(command, context),
        }
    }

    fn extract_declared(regex: &Regex, artifact: &Path) -> Result<PublicSurface> {
        let bytes = fs::read(artifact).map_err(|e| Error::Load {
            path: artifact.to_path_buf(),
            message: format!("failed to read artifact: {}", e),
        })?;
        let text = String::from_utf8(bytes).map_err(|_| Error::Load {
            path: artifact.to_path_buf(),
            message: "artifact is not valid UTF-8".to_string(),
        })?;

        Ok(PublicSurface::from_names(
            regex
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        ))
    }

    fn extract_with_command(command: &str, context: &IsolatedContext) -> Result<PublicSurface> {
        let script = format!("{} \"$@\"", command);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&script)
            .arg("sh")
            .arg(context.artifact())
            .current_dir(context.root())
            .env_clear()
            .env("HOME", context.root())
            .env("TMPDIR", context.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = std::env::var_os("PATH") {
            cmd.env("PATH", path);
        }

        let output = cmd.output().map_err(|e| Error::Load {
            path: context.artifact().to_path_buf(),
            message: format!("failed to start introspection command: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Load {
                path: context.artifact().to_path_buf(),
                message: format!(
                    "introspection command exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(PublicSurface::from_names(
            stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        ))
    }
}
