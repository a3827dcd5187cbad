use std::collections::BTreeSet;

use modforge_core::environment::{EnvironmentKind, PreviousRelease};
use modforge_core::error::Error;
use modforge_core::surface::PublicSurface;
use modforge_core::version::{next_version, BumpType, SurfaceComparison, Version};
use proptest::prelude::*;

fn previous(version: Version, names: Option<&[&str]>, size: usize) -> PreviousRelease {
    PreviousRelease {
        version,
        surface_size: size,
        surface: names.map(|n| n.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()),
    }
}

#[test]
fn test_local_is_always_0_0_1() {
    let prev = previous(Version::new(4, 2, 9), None, 10);
    let decision = next_version(
        EnvironmentKind::Local,
        &prev,
        &PublicSurface::from_names(["A"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(decision.version, Version::new(0, 0, 1));
    assert_eq!(decision.bump, BumpType::Initial);
}

#[test]
fn test_changed_surface_bumps_minor() {
    let prev = previous(Version::new(1, 2, 3), Some(&["A", "B"]), 2);
    let decision = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["A", "B", "C"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(decision.version, Version::new(1, 3, 0));
    assert_eq!(decision.bump, BumpType::Minor);
    assert!(decision.surface_changed);
}

#[test]
fn test_unchanged_surface_bumps_patch() {
    let prev = previous(Version::new(1, 2, 3), Some(&["A", "B"]), 2);
    let decision = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["B", "A"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(decision.version, Version::new(1, 2, 4));
    assert_eq!(decision.bump, BumpType::Patch);
}

#[test]
fn test_first_ci_publication() {
    let decision = next_version(
        EnvironmentKind::Ci,
        &PreviousRelease::none(),
        &PublicSurface::from_names(["A"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(decision.version, Version::new(0, 1, 0));

    let decision = next_version(
        EnvironmentKind::Ci,
        &PreviousRelease::none(),
        &PublicSurface::new(),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(decision.version, Version::new(0, 0, 1));
}

#[test]
fn test_swapped_operation_detected_by_members_only() {
    let prev = previous(Version::new(2, 0, 5), Some(&["Get-A", "Set-A"]), 2);
    let current = PublicSurface::from_names(["Get-A", "Remove-A"]);

    let members =
        next_version(EnvironmentKind::Ci, &prev, &current, SurfaceComparison::Members).unwrap();
    assert_eq!(members.version, Version::new(2, 1, 0));

    let count =
        next_version(EnvironmentKind::Ci, &prev, &current, SurfaceComparison::Count).unwrap();
    assert_eq!(count.version, Version::new(2, 0, 6));
}

#[test]
fn test_members_falls_back_to_count_without_names() {
    let prev = previous(Version::new(1, 0, 0), None, 2);

    let same_size = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["X", "Y"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(same_size.version, Version::new(1, 0, 1));

    let grew = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["X", "Y", "Z"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(grew.version, Version::new(1, 1, 0));
}

#[test]
fn test_version_parse_and_display() {
    assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3));
    assert_eq!(Version::new(0, 10, 7).to_string(), "0.10.7");
    assert!(Version::parse("1.2").is_err());
    assert!(Version::parse("1.2.3-beta").is_err());
    assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
}

#[test]
fn test_bump_overflow_is_an_error() {
    let prev = previous(Version::new(1, 2, u64::MAX), Some(&["A"]), 1);
    let err = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["A"]),
        SurfaceComparison::Members,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidVersion { .. }));
    assert!(err.to_string().contains("1.2.18446744073709551615"));

    let prev = previous(Version::new(1, u64::MAX, 0), Some(&["A"]), 1);
    let err = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["A", "B"]),
        SurfaceComparison::Members,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidVersion { .. }));

    // Only the bumped component matters.
    let prev = previous(Version::new(1, u64::MAX, 4), Some(&["A"]), 1);
    let decision = next_version(
        EnvironmentKind::Ci,
        &prev,
        &PublicSurface::from_names(["A"]),
        SurfaceComparison::Members,
    )
    .unwrap();
    assert_eq!(decision.version, Version::new(1, u64::MAX, 5));
}

proptest! {
    #[test]
    fn test_local_ignores_inputs(
        major in 0u64..50, minor in 0u64..50, patch in 0u64..50,
        size in 0usize..20,
        names in proptest::collection::btree_set("[A-Z][a-z]{1,6}", 0..8),
    ) {
        let prev = PreviousRelease {
            version: Version::new(major, minor, patch),
            surface_size: size,
            surface: None,
        };
        let decision = next_version(
            EnvironmentKind::Local,
            &prev,
            &PublicSurface::from_names(names),
            SurfaceComparison::Members,
        )
        .unwrap();
        prop_assert_eq!(decision.version, Version::new(0, 0, 1));
    }

    #[test]
    fn test_ci_never_bumps_major(
        major in 0u64..50, minor in 0u64..50, patch in 0u64..50,
        size in 0usize..20,
        names in proptest::collection::btree_set("[A-Z][a-z]{1,6}", 0..8),
    ) {
        let prev = PreviousRelease {
            version: Version::new(major, minor, patch),
            surface_size: size,
            surface: None,
        };
        let current = PublicSurface::from_names(names);
        let decision =
            next_version(EnvironmentKind::Ci, &prev, &current, SurfaceComparison::Count).unwrap();

        prop_assert_eq!(decision.version.major, major);
        prop_assert!(decision.version > prev.version);
        if size == current.len() {
            prop_assert_eq!(decision.version, Version::new(major, minor, patch + 1));
        } else {
            prop_assert_eq!(decision.version, Version::new(major, minor + 1, 0));
        }
    }
}
