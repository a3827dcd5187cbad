use std::fs;

use modforge_core::error::Error;
use modforge_core::manifest::{ManifestUpdate, MetadataAdapter, SyncTargets};
use modforge_core::surface::PublicSurface;
use modforge_core::version::Version;
use modforge_formats::{
    manifest_adapter_for, spec_adapter_for, synchronizer, JsonManifestAdapter, NuspecAdapter,
    TomlManifestAdapter,
};
use tempfile::TempDir;

const NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2011/08/nuspec.xsd">
  <!-- generated by hand -->
  <metadata>
    <id>Sample</id>
    <version>0.0.1</version>
    <authors>Jane</authors>
    <description>A   sample   module</description>
  </metadata>
  <files>
    <file src="src\**" target="" />
  </files>
</package>
"#;

fn surface(names: &[&str]) -> PublicSurface {
    PublicSurface::from_names(names.iter().copied())
}

#[test]
fn test_toml_manifest_round_trip_keeps_other_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.toml");
    fs::write(
        &path,
        "name = \"Sample\"\nauthor = \"Jane\"\nversion = \"0.0.1\"\nexports = []\n",
    )
    .unwrap();

    let adapter = TomlManifestAdapter;
    let exports = surface(&["Foo", "Bar"]);
    adapter
        .write_record(
            &path,
            &ManifestUpdate {
                version: Version::new(1, 2, 3),
                exports: Some(&exports),
                exports_key: "exports",
            },
        )
        .unwrap();

    let record = adapter.read_record(&path, "exports").unwrap();
    assert_eq!(record.version, Some(Version::new(1, 2, 3)));
    assert_eq!(
        record.exports,
        Some(vec!["Bar".to_string(), "Foo".to_string()])
    );

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("author = \"Jane\""));
    assert!(content.contains("name = \"Sample\""));
}

#[test]
fn test_toml_manifest_keeps_comments_and_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.toml");
    let original = "# Module manifest\nname   = \"Sample\"  # display name\nversion = \"0.0.1\" # bumped by the build\n\n[private]\nnotes = [ \"keep\",  \"me\" ]\n";
    fs::write(&path, original).unwrap();

    let exports = surface(&["Get-Thing"]);
    TomlManifestAdapter
        .write_record(
            &path,
            &ManifestUpdate {
                version: Version::new(0, 2, 0),
                exports: Some(&exports),
                exports_key: "exports",
            },
        )
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "# Module manifest\nname   = \"Sample\"  # display name\nversion = \"0.2.0\" # bumped by the build\nexports = [\"Get-Thing\"]\n\n[private]\nnotes = [ \"keep\",  \"me\" ]\n"
    );
}

#[test]
fn test_json_manifest_round_trip_keeps_other_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.json");
    fs::write(
        &path,
        r#"{"name": "Sample", "author": "Jane", "version": "0.0.1", "functions": []}"#,
    )
    .unwrap();

    let adapter = JsonManifestAdapter;
    let exports = surface(&["Foo", "Bar"]);
    adapter
        .write_record(
            &path,
            &ManifestUpdate {
                version: Version::new(1, 2, 3),
                exports: Some(&exports),
                exports_key: "functions",
            },
        )
        .unwrap();

    let record = adapter.read_record(&path, "functions").unwrap();
    assert_eq!(record.version, Some(Version::new(1, 2, 3)));
    assert_eq!(
        record.exports,
        Some(vec!["Bar".to_string(), "Foo".to_string()])
    );

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["author"], "Jane");
    assert_eq!(json["name"], "Sample");
}

#[test]
fn test_manifest_without_version_reads_as_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.toml");
    fs::write(&path, "name = \"Sample\"\n").unwrap();

    let record = TomlManifestAdapter.read_record(&path, "exports").unwrap();
    assert_eq!(record.version, None);
    assert_eq!(record.exports, None);
}

#[test]
fn test_missing_manifest_is_manifest_error() {
    let dir = TempDir::new().unwrap();
    let err = TomlManifestAdapter
        .read_record(&dir.path().join("absent.toml"), "exports")
        .unwrap_err();
    assert!(matches!(err, Error::Manifest { .. }));
}

#[test]
fn test_nuspec_only_version_text_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Sample.nuspec");
    fs::write(&path, NUSPEC).unwrap();

    NuspecAdapter
        .write_record(
            &path,
            &ManifestUpdate {
                version: Version::new(0, 1, 0),
                exports: None,
                exports_key: "exports",
            },
        )
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        NUSPEC.replace("<version>0.0.1</version>", "<version>0.1.0</version>")
    );

    let record = NuspecAdapter.read_record(&path, "exports").unwrap();
    assert_eq!(record.version, Some(Version::new(0, 1, 0)));
}

#[test]
fn test_nuspec_without_metadata_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Broken.nuspec");
    let original = "<package><files /></package>";
    fs::write(&path, original).unwrap();

    let err = NuspecAdapter
        .write_record(
            &path,
            &ManifestUpdate {
                version: Version::new(1, 0, 0),
                exports: None,
                exports_key: "exports",
            },
        )
        .unwrap_err();

    assert!(matches!(err, Error::SpecNotFound { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_adapter_selection_by_extension() {
    assert_eq!(
        manifest_adapter_for("a/module.toml".as_ref()).unwrap().format(),
        "toml"
    );
    assert_eq!(
        manifest_adapter_for("a/module.json".as_ref()).unwrap().format(),
        "json"
    );
    assert!(manifest_adapter_for("a/module.psd1".as_ref()).is_err());
    assert_eq!(
        spec_adapter_for("a/Sample.nuspec".as_ref()).unwrap().format(),
        "nuspec"
    );
    assert!(spec_adapter_for("a/Sample.xml".as_ref()).is_err());
}

#[test]
fn test_synchronizer_updates_both_files() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("module.toml");
    let spec = dir.path().join("Sample.nuspec");
    fs::write(&manifest, "name = \"Sample\"\nversion = \"0.0.1\"\n").unwrap();
    fs::write(&spec, NUSPEC).unwrap();

    let targets = SyncTargets {
        manifest,
        spec,
        exports_key: "exports".to_string(),
    };
    let sync = synchronizer();
    sync.sync(&targets, Version::new(2, 0, 0), &surface(&["Get-Thing"]))
        .unwrap();

    let (manifest_record, spec_record) = sync.read(&targets);
    let manifest_record = manifest_record.unwrap();
    assert_eq!(manifest_record.version, Some(Version::new(2, 0, 0)));
    assert_eq!(manifest_record.exports, Some(vec!["Get-Thing".to_string()]));
    assert_eq!(spec_record.unwrap().version, Some(Version::new(2, 0, 0)));
}

#[test]
fn test_synchronizer_attempts_both_writes() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("module.toml");
    let spec = dir.path().join("Sample.nuspec");
    fs::write(&manifest, "version = \"0.0.1\"\n").unwrap();
    fs::write(&spec, "<package>\n  <files />\n</package>\n").unwrap();

    let targets = SyncTargets {
        manifest: manifest.clone(),
        spec,
        exports_key: "exports".to_string(),
    };
    let err = synchronizer()
        .sync(&targets, Version::new(0, 0, 2), &surface(&[]))
        .unwrap_err();

    assert!(matches!(err, Error::SpecNotFound { .. }), "unexpected error: {err}");
    let record = TomlManifestAdapter.read_record(&manifest, "exports").unwrap();
    assert_eq!(record.version, Some(Version::new(0, 0, 2)));
}

#[test]
fn test_synchronizer_reports_both_failures() {
    let dir = TempDir::new().unwrap();
    let spec = dir.path().join("Sample.nuspec");
    fs::write(&spec, "<package>\n  <files />\n</package>\n").unwrap();

    let targets = SyncTargets {
        manifest: dir.path().join("missing.toml"),
        spec,
        exports_key: "exports".to_string(),
    };
    let err = synchronizer()
        .sync(&targets, Version::new(0, 0, 2), &surface(&[]))
        .unwrap_err();

    match err {
        Error::Sync { failures } => {
            assert_eq!(failures.len(), 2);
            assert!(matches!(failures[1], Error::SpecNotFound { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}
