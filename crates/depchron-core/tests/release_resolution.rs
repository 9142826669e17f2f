//! Release resolution properties over random catalogues, plus ingestion of a
//! release file from disk.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use tempfile::TempDir;

use depchron_core::ingest::{ReleaseRecord, load_releases};
use depchron_core::release_index::grace_threshold;
use depchron_core::{ArtifactId, Release, ReleaseIndex, ResolveError};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn at(offset: u64) -> NaiveDate {
    base() + Days::new(offset)
}

fn catalogue(offsets: &[u64]) -> ReleaseIndex {
    ReleaseIndex::from_records(offsets.iter().enumerate().map(|(i, &offset)| ReleaseRecord {
        artifact: ArtifactId::new("a:b"),
        release: Release::new(format!("v{i}"), at(offset)),
    }))
}

proptest! {
    #[test]
    fn prop_unresolvable_iff_all_after_threshold(
        offsets in prop::collection::vec(0u64..2_000, 1..20),
        query in 0u64..2_200,
    ) {
        let index = catalogue(&offsets);
        let date = at(query);
        let threshold = grace_threshold(date);
        let all_after = offsets.iter().all(|&o| at(o) > threshold);
        let result = index.resolve(&ArtifactId::new("a:b"), date);
        prop_assert_eq!(
            matches!(result, Err(ResolveError::NoResolvableVersion { .. })),
            all_after
        );
    }

    #[test]
    fn prop_resolved_release_is_latest_in_effect(
        offsets in prop::collection::vec(0u64..2_000, 1..20),
        query in 0u64..2_200,
    ) {
        let index = catalogue(&offsets);
        let date = at(query);
        let threshold = grace_threshold(date);
        if let Ok(release) = index.resolve(&ArtifactId::new("a:b"), date) {
            prop_assert!(release.date <= threshold);
            let latest = offsets.iter().map(|&o| at(o)).filter(|d| *d <= threshold).max();
            prop_assert_eq!(Some(release.date), latest);
        }
    }

    #[test]
    fn prop_resolution_is_monotonic(
        offsets in prop::collection::vec(0u64..2_000, 1..20),
        first in 0u64..2_200,
        gap in 0u64..400,
    ) {
        let index = catalogue(&offsets);
        let artifact = ArtifactId::new("a:b");
        let earlier = index.resolve(&artifact, at(first));
        let later = index.resolve(&artifact, at(first + gap));
        if let (Ok(earlier), Ok(later)) = (earlier, later) {
            prop_assert!(earlier.date <= later.date);
        }
    }

    #[test]
    fn prop_newest_wins_inside_grace(
        offsets in prop::collection::vec(0u64..2_000, 1..20),
    ) {
        let index = catalogue(&offsets);
        let artifact = ArtifactId::new("a:b");
        let newest = index.releases("a:b").unwrap()[0].clone();
        let resolved = index.resolve(&artifact, newest.date).unwrap();
        prop_assert_eq!(resolved, &newest);
    }
}

#[test]
fn spec_scenario_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("release_all.csv");
    std::fs::write(
        &path,
        "artifact,release\n\
         a:b:1.0,2018-01-01T00:00:00Z\n\
         a:b:2.0,2018-06-01T00:00:00Z\n",
    )
    .unwrap();

    let loaded = load_releases(&path).unwrap();
    assert!(loaded.warnings.is_empty());
    let index = ReleaseIndex::from_records(loaded.records);
    let artifact = ArtifactId::new("a:b");

    let feb = NaiveDate::from_ymd_opt(2018, 2, 15).unwrap();
    let may = NaiveDate::from_ymd_opt(2018, 5, 20).unwrap();
    assert_eq!(index.resolve_tag_at_date(&artifact, feb).unwrap().as_str(), "a:b:1.0");
    assert_eq!(index.resolve_tag_at_date(&artifact, may).unwrap().as_str(), "a:b:2.0");
    assert!(matches!(
        index.resolve_tag_at_date(&ArtifactId::new("c:d"), may),
        Err(ResolveError::UnknownArtifact { .. })
    ));
}

#[test]
fn unreadable_file_is_open_error() {
    let dir = TempDir::new().unwrap();
    let err = load_releases(&dir.path().join("missing.csv")).unwrap_err();
    assert_eq!(err.error_code().code(), "E1003");
}
