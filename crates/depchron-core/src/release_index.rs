//! Per-artifact release catalogue and grace-window version resolution.
//!
//! # Resolution rule
//!
//! Registries publish a release some time after the source it was cut from
//! started circulating, so a release counts as "current" up to one calendar
//! month before its official date. For a query date `D`:
//!
//! 1. `threshold = D + 1 month` (end-of-month clamped).
//! 2. If the newest release is dated on or before `threshold`, it wins.
//! 3. Otherwise the newest release whose date is on or before `threshold`
//!    wins; if there is none, the artifact has no resolvable version at `D`.
//!
//! Comparisons are inclusive. Same-day releases resolve through the
//! catalogue's secondary order (version ascending).

use std::collections::{BTreeSet, HashMap};

use chrono::{Months, NaiveDate};
use tracing::debug;

use crate::error::ResolveError;
use crate::ingest::ReleaseRecord;
use crate::model::{ArtifactId, ArtifactTag, Release};

/// Tolerance between a release's official date and the date it is treated
/// as current.
pub const GRACE_WINDOW: Months = Months::new(1);

/// The last date on which a release still counts as current for `date`.
#[must_use]
pub fn grace_threshold(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(GRACE_WINDOW).unwrap_or(NaiveDate::MAX)
}

/// Immutable mapping from artifact to its releases, newest first.
#[derive(Debug, Clone, Default)]
pub struct ReleaseIndex {
    releases: HashMap<ArtifactId, Vec<Release>>,
    release_count: usize,
}

impl ReleaseIndex {
    /// Build the catalogue from ingested release rows.
    ///
    /// Insertion order is irrelevant; duplicate `(version, date)` pairs for
    /// the same artifact collapse into one entry.
    pub fn from_records(records: impl IntoIterator<Item = ReleaseRecord>) -> Self {
        let mut staged: HashMap<ArtifactId, BTreeSet<Release>> = HashMap::new();
        for record in records {
            staged
                .entry(record.artifact)
                .or_default()
                .insert(record.release);
        }

        let mut release_count = 0;
        let releases = staged
            .into_iter()
            .map(|(artifact, set)| {
                release_count += set.len();
                (artifact, set.into_iter().collect::<Vec<_>>())
            })
            .collect();

        Self {
            releases,
            release_count,
        }
    }

    /// Number of artifacts with at least one release.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.releases.len()
    }

    /// Total number of distinct releases across all artifacts.
    #[must_use]
    pub const fn release_count(&self) -> usize {
        self.release_count
    }

    /// Releases of `artifact`, newest first.
    #[must_use]
    pub fn releases(&self, artifact: &str) -> Option<&[Release]> {
        self.releases.get(artifact).map(Vec::as_slice)
    }

    /// The release of `artifact` that was current at `date`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::UnknownArtifact`] if the artifact has no releases;
    /// [`ResolveError::NoResolvableVersion`] if every release postdates the
    /// grace threshold.
    pub fn resolve(&self, artifact: &ArtifactId, date: NaiveDate) -> Result<&Release, ResolveError> {
        let Some(releases) = self.releases.get(artifact) else {
            debug!(%artifact, "artifact not found in release catalogue");
            return Err(ResolveError::UnknownArtifact {
                artifact: artifact.clone(),
            });
        };

        let threshold = grace_threshold(date);

        // The newest release already in effect wins outright.
        if let Some(newest) = releases.first().filter(|newest| newest.date <= threshold) {
            return Ok(newest);
        }

        releases
            .iter()
            .find(|release| release.date <= threshold)
            .ok_or_else(|| ResolveError::NoResolvableVersion {
                artifact: artifact.clone(),
                threshold,
            })
    }

    /// The tag of the release of `artifact` that was current at `date`.
    ///
    /// # Errors
    ///
    /// See [`ReleaseIndex::resolve`].
    pub fn resolve_tag_at_date(
        &self,
        artifact: &ArtifactId,
        date: NaiveDate,
    ) -> Result<ArtifactTag, ResolveError> {
        self.resolve(artifact, date)
            .map(|release| artifact.with_version(&release.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(artifact: &str, version: &str, date: NaiveDate) -> ReleaseRecord {
        ReleaseRecord {
            artifact: ArtifactId::new(artifact),
            release: Release::new(version, date),
        }
    }

    fn ab_index() -> ReleaseIndex {
        ReleaseIndex::from_records([
            record("a:b", "2.0", day(2018, 6, 1)),
            record("a:b", "1.0", day(2018, 1, 1)),
        ])
    }

    #[test]
    fn newest_too_new_falls_back_to_older() {
        let index = ab_index();
        let tag = index
            .resolve_tag_at_date(&ArtifactId::new("a:b"), day(2018, 2, 15))
            .unwrap();
        assert_eq!(tag.as_str(), "a:b:1.0");
    }

    #[test]
    fn newest_within_window_wins() {
        let index = ab_index();
        let tag = index
            .resolve_tag_at_date(&ArtifactId::new("a:b"), day(2018, 5, 20))
            .unwrap();
        assert_eq!(tag.as_str(), "a:b:2.0");
    }

    #[test]
    fn threshold_is_inclusive() {
        let index = ab_index();
        // 2018-05-01 + 1 month == 2018-06-01, the newest release date.
        let tag = index
            .resolve_tag_at_date(&ArtifactId::new("a:b"), day(2018, 5, 1))
            .unwrap();
        assert_eq!(tag.as_str(), "a:b:2.0");
    }

    #[test]
    fn unknown_artifact_is_distinct_failure() {
        let index = ab_index();
        let err = index
            .resolve_tag_at_date(&ArtifactId::new("x:y"), day(2018, 5, 20))
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownArtifact { .. }));
    }

    #[test]
    fn everything_after_threshold_is_unresolvable() {
        let index = ab_index();
        let err = index
            .resolve_tag_at_date(&ArtifactId::new("a:b"), day(2017, 6, 1))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NoResolvableVersion {
                artifact: ArtifactId::new("a:b"),
                threshold: day(2017, 7, 1),
            }
        );
    }

    #[test]
    fn month_end_threshold_is_clamped() {
        assert_eq!(grace_threshold(day(2019, 1, 31)), day(2019, 2, 28));
        assert_eq!(grace_threshold(day(2020, 1, 31)), day(2020, 2, 29));
    }

    #[test]
    fn same_day_tie_resolves_by_version() {
        let index = ReleaseIndex::from_records([
            record("a:b", "1.1", day(2018, 1, 1)),
            record("a:b", "1.0", day(2018, 1, 1)),
        ]);
        let tag = index
            .resolve_tag_at_date(&ArtifactId::new("a:b"), day(2018, 1, 1))
            .unwrap();
        assert_eq!(tag.as_str(), "a:b:1.0");
    }

    #[test]
    fn duplicates_collapse() {
        let index = ReleaseIndex::from_records([
            record("a:b", "1.0", day(2018, 1, 1)),
            record("a:b", "1.0", day(2018, 1, 1)),
            record("c:d", "1.0", day(2018, 1, 1)),
        ]);
        assert_eq!(index.artifact_count(), 2);
        assert_eq!(index.release_count(), 2);
        assert_eq!(index.releases("a:b").map(<[Release]>::len), Some(1));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = ReleaseIndex::from_records([
            record("a:b", "1.0", day(2018, 1, 1)),
            record("a:b", "2.0", day(2018, 6, 1)),
        ]);
        let backward = ab_index();
        assert_eq!(forward.releases("a:b"), backward.releases("a:b"));
    }
}
