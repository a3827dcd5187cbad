//! Filesystem package source.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{PackageSource, Publication, PublicationIndex};

/// Package source backed by a local (or mounted) feed directory.
///
/// Layout: `<feed>/<module>/index.json`.
pub struct FilesystemSource {
    feed_dir: PathBuf,
}

impl FilesystemSource {
    pub fn new(feed_dir: impl AsRef<Path>) -> Self {
        Self {
            feed_dir: feed_dir.as_ref().to_path_buf(),
        }
    }

    fn index_path(&self, module: &str) -> PathBuf {
        self.feed_dir.join(module).join("index.json")
    }
}

#[async_trait]
impl PackageSource for FilesystemSource {
    fn describe(&self) -> String {
        self.feed_dir.display().to_string()
    }

    async fn latest(&self, module: &str) -> Result<Option<Publication>> {
        let path = self.index_path(module);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::PackageSource(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let index = PublicationIndex::parse(&content, &path.display().to_string())?;
        Ok(index.latest())
    }
}
