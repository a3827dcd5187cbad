//! Staging the module into the versioned output directory, and cleaning it.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Files copied by a staging run.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub dir: PathBuf,
    /// Staged files, relative to `dir`.
    pub files: Vec<PathBuf>,
}

/// Copies a source tree, skipping files whose names match an exclude pattern.
pub struct Stager {
    exclude: Vec<Regex>,
    ignored_dirs: Vec<PathBuf>,
}

impl Stager {
    pub fn new(exclude: Vec<Regex>) -> Self {
        Self {
            exclude,
            ignored_dirs: Vec::new(),
        }
    }

    /// Never descends into `dir`, e.g. an output root nested in the source tree.
    pub fn ignore_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ignored_dirs.push(dir.into());
        self
    }

    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(file_name))
    }

    /// Copies `source` into `dest`, replacing anything already at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not a directory or a copy fails.
    pub fn stage(&self, source: &Path, dest: &Path) -> Result<StageReport> {
        if !source.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "module source directory {} does not exist",
                source.display()
            )));
        }

        if dest.exists() {
            debug!(dir = %dest.display(), "removing previous staging directory");
            fs::remove_dir_all(dest)?;
        }
        fs::create_dir_all(dest)?;

        let mut files = Vec::new();
        let walker = WalkDir::new(source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let path = entry.path();
                !path.starts_with(dest) && !self.ignored_dirs.iter().any(|d| path.starts_with(d))
            });

        for entry in walker {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.is_excluded(&name) {
                debug!(file = %entry.path().display(), "excluded from staging");
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| Error::InvalidConfig(format!("unexpected path outside source: {}", e)))?
                .to_path_buf();
            let target = dest.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            files.push(relative);
        }

        info!(dir = %dest.display(), files = files.len(), "staged module");
        Ok(StageReport {
            dir: dest.to_path_buf(),
            files,
        })
    }
}

/// Fails if `output_root` is, or is an ancestor of, any existing `protected` path.
///
/// Paths are compared canonically, so symlinks and `..` cannot hide an overlap.
pub fn ensure_output_disjoint(output_root: &Path, protected: &[PathBuf]) -> Result<()> {
    if !output_root.exists() {
        return Ok(());
    }
    let output = output_root.canonicalize()?;
    for path in protected.iter().filter(|p| p.exists()) {
        if path.canonicalize()?.starts_with(&output) {
            return Err(Error::InvalidConfig(format!(
                "output root {} contains {}; refusing to clean or stage into it",
                output_root.display(),
                path.display()
            )));
        }
    }
    Ok(())
}

/// Removes the output root. Returns `false` if there was nothing to remove.
pub fn clean(output_root: &Path) -> Result<bool> {
    if !output_root.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(output_root)?;
    info!(dir = %output_root.display(), "removed output directory");
    Ok(true)
}
