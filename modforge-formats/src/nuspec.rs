use std::fs;
use std::ops::Range;
use std::path::Path;

use modforge_core::error::{Error, Result};
use modforge_core::manifest::{ManifestRecord, ManifestUpdate, MetadataAdapter};
use modforge_core::version::Version;
use once_cell::sync::Lazy;
use regex::Regex;

static METADATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<metadata(?:\s[^>]*)?>(.*?)</metadata>").expect("metadata pattern is valid")
});

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<version>([^<]*)</version>").expect("version pattern is valid"));

/// XML packaging spec with a single `<metadata>` element holding a single
/// `<version>` element.
///
/// Only the text of `<version>` is rewritten. Every other byte of the file,
/// including formatting and comments, is preserved.
pub struct NuspecAdapter;

impl NuspecAdapter {
    fn load(path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::SpecNotFound {
            path: path.to_path_buf(),
            message: format!("Failed to read packaging spec: {}", e),
        })
    }

    /// Byte range of the version text inside the metadata element.
    fn locate_version(path: &Path, content: &str) -> Result<Range<usize>> {
        let mut metadata = METADATA_RE.captures_iter(content);
        let body = match (metadata.next(), metadata.next()) {
            (Some(caps), None) => caps.get(1),
            (None, _) => {
                return Err(Error::SpecNotFound {
                    path: path.to_path_buf(),
                    message: "no <metadata> element".to_string(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(Error::SpecNotFound {
                    path: path.to_path_buf(),
                    message: "more than one <metadata> element".to_string(),
                })
            }
        };
        let body = body.ok_or_else(|| Error::SpecNotFound {
            path: path.to_path_buf(),
            message: "empty <metadata> element".to_string(),
        })?;

        let mut versions = VERSION_RE.captures_iter(body.as_str());
        match (versions.next(), versions.next()) {
            (Some(caps), None) => {
                let text = caps.get(1).ok_or_else(|| Error::SpecNotFound {
                    path: path.to_path_buf(),
                    message: "malformed <version> element".to_string(),
                })?;
                Ok(body.start() + text.start()..body.start() + text.end())
            }
            (None, _) => Err(Error::SpecNotFound {
                path: path.to_path_buf(),
                message: "no <version> element inside <metadata>".to_string(),
            }),
            (Some(_), Some(_)) => Err(Error::SpecNotFound {
                path: path.to_path_buf(),
                message: "more than one <version> element inside <metadata>".to_string(),
            }),
        }
    }
}

impl MetadataAdapter for NuspecAdapter {
    fn format(&self) -> &'static str {
        "nuspec"
    }

    fn detect(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("nuspec")
    }

    fn read_record(&self, path: &Path, _exports_key: &str) -> Result<ManifestRecord> {
        let content = Self::load(path)?;
        let range = Self::locate_version(path, &content)?;
        let text = content[range].trim();

        let version = if text.is_empty() {
            None
        } else {
            Some(Version::parse(text)?)
        };

        Ok(ManifestRecord {
            version,
            exports: None,
        })
    }

    fn write_record(&self, path: &Path, update: &ManifestUpdate<'_>) -> Result<()> {
        let mut content = Self::load(path)?;
        let range = Self::locate_version(path, &content)?;
        content.replace_range(range, &update.version.to_string());

        fs::write(path, content).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to write packaging spec: {}", e),
        })
    }
}
