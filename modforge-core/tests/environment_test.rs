use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use modforge_core::environment::{EnvironmentKind, EnvironmentProbe, PreviousRelease};
use modforge_core::error::{Error, Result};
use modforge_core::source::{FilesystemSource, PackageSource, Publication};
use modforge_core::version::Version;
use tempfile::TempDir;

struct FixedSource(Option<Publication>);

#[async_trait]
impl PackageSource for FixedSource {
    fn describe(&self) -> String {
        "fixed".to_string()
    }

    async fn latest(&self, _module: &str) -> Result<Option<Publication>> {
        Ok(self.0.clone())
    }
}

struct BrokenSource;

#[async_trait]
impl PackageSource for BrokenSource {
    fn describe(&self) -> String {
        "broken".to_string()
    }

    async fn latest(&self, _module: &str) -> Result<Option<Publication>> {
        Err(Error::PackageSource("connection refused".to_string()))
    }
}

fn ci(name: &str) -> Option<String> {
    (name == "CI").then(|| "true".to_string())
}

fn local(_: &str) -> Option<String> {
    None
}

#[test]
fn test_detect_kind() {
    let probe = EnvironmentProbe::new("CI");
    assert_eq!(probe.detect_kind_with(ci), EnvironmentKind::Ci);
    assert_eq!(probe.detect_kind_with(local), EnvironmentKind::Local);
    assert_eq!(
        probe.detect_kind_with(|_| Some("false".to_string())),
        EnvironmentKind::Local
    );

    let custom = EnvironmentProbe::new("TF_BUILD");
    assert_eq!(custom.ci_variable(), "TF_BUILD");
    assert_eq!(custom.detect_kind_with(ci), EnvironmentKind::Local);
}

#[test]
fn test_local_skips_lookup() {
    let probe = EnvironmentProbe::new("CI").with_source(Some(Arc::new(BrokenSource)));
    let report = probe.probe_with("Sample", local).unwrap();

    assert_eq!(report.kind, EnvironmentKind::Local);
    assert_eq!(report.previous, PreviousRelease::none());
}

#[test]
fn test_ci_resolves_previous_publication() {
    let publication = Publication {
        version: Version::new(1, 4, 2),
        exports: Some(vec!["Get-Thing".to_string(), "Set-Thing".to_string()]),
        export_count: None,
    };
    let probe =
        EnvironmentProbe::new("CI").with_source(Some(Arc::new(FixedSource(Some(publication)))));
    let report = probe.probe_with("Sample", ci).unwrap();

    assert_eq!(report.kind, EnvironmentKind::Ci);
    assert_eq!(report.previous.version, Version::new(1, 4, 2));
    assert_eq!(report.previous.surface_size, 2);
    assert!(report.previous.surface.unwrap().contains("Set-Thing"));
}

#[test]
fn test_ci_never_published() {
    let probe = EnvironmentProbe::new("CI").with_source(Some(Arc::new(FixedSource(None))));
    let report = probe.probe_with("Sample", ci).unwrap();
    assert_eq!(report.previous.version, Version::ZERO);
    assert_eq!(report.previous.surface_size, 0);
}

#[test]
fn test_ci_source_failure_is_fatal() {
    let probe = EnvironmentProbe::new("CI").with_source(Some(Arc::new(BrokenSource)));
    let err = probe.probe_with("Sample", ci).unwrap_err();
    assert!(matches!(err, Error::PackageSource(_)));
}

#[test]
fn test_filesystem_source() {
    let feed = TempDir::new().unwrap();
    let module_dir = feed.path().join("Sample");
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(
        module_dir.join("index.json"),
        r#"{"versions":[{"version":"0.3.1","export_count":4},{"version":"0.2.9","exports":["A"]}]}"#,
    )
    .unwrap();

    let probe = EnvironmentProbe::new("CI")
        .with_source(Some(Arc::new(FilesystemSource::new(feed.path()))));

    let report = probe.probe_with("Sample", ci).unwrap();
    assert_eq!(report.previous.version, Version::new(0, 3, 1));
    assert_eq!(report.previous.surface_size, 4);
    assert!(report.previous.surface.is_none());

    let unknown = probe.probe_with("Other", ci).unwrap();
    assert_eq!(unknown.previous, PreviousRelease::none());
}
