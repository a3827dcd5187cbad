//! Release versions and the version calculator.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::environment::{EnvironmentKind, PreviousRelease};
use crate::error::{Error, Result};
use crate::surface::PublicSurface;

/// A three-component release version, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const ZERO: Version = Version::new(0, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a strict `major.minor.patch` version.
    ///
    /// Pre-release and build metadata are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let parsed = semver::Version::parse(trimmed).map_err(|e| Error::InvalidVersion {
            version: input.to_string(),
            message: format!("{}. Expected format major.minor.patch (e.g., 1.2.3)", e),
        })?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(Error::InvalidVersion {
                version: input.to_string(),
                message: "pre-release and build metadata are not supported".to_string(),
            });
        }

        Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Kind of version bump produced by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpType {
    /// Local build, fixed at 0.0.1.
    Initial,
    /// Public surface changed (1.2.3 -> 1.3.0).
    Minor,
    /// Public surface unchanged (1.2.3 -> 1.2.4).
    Patch,
}

impl BumpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Initial => "initial",
            BumpType::Minor => "minor",
            BumpType::Patch => "patch",
        }
    }
}

/// How the current surface is compared against the previous publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceComparison {
    /// Compare the sets of operation names.
    #[default]
    Members,
    /// Compare only the number of operations.
    Count,
}

/// Outcome of a version calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDecision {
    pub version: Version,
    pub bump: BumpType,
    pub surface_changed: bool,
}

/// Computes the next release version.
///
/// Local builds always produce `0.0.1`. CI builds bump the minor version
/// (resetting patch) when the public surface changed and the patch version
/// otherwise. The major version is never incremented here.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the bumped component would overflow.
pub fn next_version(
    kind: EnvironmentKind,
    previous: &PreviousRelease,
    current: &PublicSurface,
    comparison: SurfaceComparison,
) -> Result<VersionDecision> {
    if kind == EnvironmentKind::Local {
        return Ok(VersionDecision {
            version: Version::new(0, 0, 1),
            bump: BumpType::Initial,
            surface_changed: false,
        });
    }

    let changed = surface_changed(previous, current, comparison);
    let prev = previous.version;
    let overflow = |component: &str| Error::InvalidVersion {
        version: prev.to_string(),
        message: format!("{} version cannot be incremented", component),
    };

    if changed {
        let minor = prev.minor.checked_add(1).ok_or_else(|| overflow("minor"))?;
        Ok(VersionDecision {
            version: Version::new(prev.major, minor, 0),
            bump: BumpType::Minor,
            surface_changed: true,
        })
    } else {
        let patch = prev.patch.checked_add(1).ok_or_else(|| overflow("patch"))?;
        Ok(VersionDecision {
            version: Version::new(prev.major, prev.minor, patch),
            bump: BumpType::Patch,
            surface_changed: false,
        })
    }
}

fn surface_changed(
    previous: &PreviousRelease,
    current: &PublicSurface,
    comparison: SurfaceComparison,
) -> bool {
    match (comparison, &previous.surface) {
        (SurfaceComparison::Members, Some(names)) => !same_members(names, current),
        _ => previous.surface_size.abs_diff(current.len()) != 0,
    }
}

fn same_members(previous: &BTreeSet<String>, current: &PublicSurface) -> bool {
    previous.len() == current.len() && previous.iter().all(|name| current.contains(name))
}
