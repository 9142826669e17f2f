use std::io;
use std::path::Path;

use tracing::{info, instrument};

use super::{InputKind, LoadError, Loaded, RowError, column, csv_reader, field, open, read_rows};
use super::timestamp::parse_date;
use crate::model::{ArtifactId, CoordinateError, Release, split_coordinate};

const ARTIFACT_COLUMN: &str = "artifact";
const RELEASE_COLUMN: &str = "release";

/// One release row: which artifact, which version, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub artifact: ArtifactId,
    pub release: Release,
}

/// Parse a `group:name:version` coordinate and its release timestamp.
///
/// # Errors
///
/// Returns [`RowError`] if the coordinate has fewer than three segments or the
/// timestamp is not ISO-8601.
pub fn parse_release_row(coordinate: &str, timestamp: &str) -> Result<ReleaseRecord, RowError> {
    let (group, name, version) =
        split_coordinate(coordinate).ok_or_else(|| CoordinateError(coordinate.to_string()))?;
    let date = parse_date(timestamp)?;
    Ok(ReleaseRecord {
        artifact: ArtifactId::from_parts(group, name),
        release: Release::new(version, date),
    })
}

/// Read a release file with `artifact` and `release` header columns.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if either column is absent, or
/// [`LoadError::Read`] on an I/O failure.
pub fn read_releases<R: io::Read>(input: R) -> Result<Loaded<ReleaseRecord>, LoadError> {
    let mut reader = csv_reader(input, true, b',');
    let artifact_idx = column(&mut reader, InputKind::Releases, ARTIFACT_COLUMN)?;
    let release_idx = column(&mut reader, InputKind::Releases, RELEASE_COLUMN)?;

    read_rows(reader, InputKind::Releases, |record| {
        let coordinate = field(record, artifact_idx, ARTIFACT_COLUMN)?;
        let timestamp = field(record, release_idx, RELEASE_COLUMN)?;
        parse_release_row(coordinate, timestamp).map(Some)
    })
}

/// Open and read the release file at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened, lacks a column, or
/// cannot be read.
#[instrument]
pub fn load_releases(path: &Path) -> Result<Loaded<ReleaseRecord>, LoadError> {
    info!("parsing artifact releases");
    let loaded = read_releases(open(path)?)?;
    info!(
        releases = loaded.records.len(),
        skipped = loaded.warnings.len(),
        "artifact releases parsed"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn row_splits_coordinate() {
        let record = parse_release_row("com.hankcs:hanlp:portable-1.5.0", "2017-12-01T09:00:00Z")
            .unwrap();
        assert_eq!(record.artifact.as_str(), "com.hankcs:hanlp");
        assert_eq!(record.release.version, "portable-1.5.0");
        assert_eq!(
            record.release.date,
            NaiveDate::from_ymd_opt(2017, 12, 1).unwrap()
        );
    }

    #[test]
    fn version_is_third_segment_only() {
        let data = "artifact,release\n\
                    com.hankcs:hanlp:portable-1.5.0:jdk8,2018-01-01\n";
        let loaded = read_releases(data.as_bytes()).unwrap();
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.records[0].release.version, "portable-1.5.0");

        let index = crate::ReleaseIndex::from_records(loaded.records);
        let tag = index
            .resolve_tag_at_date(
                &crate::ArtifactId::new("com.hankcs:hanlp"),
                NaiveDate::from_ymd_opt(2018, 2, 1).unwrap(),
            )
            .unwrap();
        assert_eq!(tag.as_str(), "com.hankcs:hanlp:portable-1.5.0");
    }

    #[test]
    fn header_order_is_irrelevant() {
        let data = "release,artifact\n2018-01-01T00:00:00Z,a:b:1.0\n";
        let loaded = read_releases(data.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].artifact.as_str(), "a:b");
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let data = "artifact,release\n\
                    a:b:1.0,2018-01-01T00:00:00Z\n\
                    a:b,2018-02-01T00:00:00Z\n\
                    a:b:2.0,not-a-date\n\
                    a:b:3.0,\n\
                    a:b:4.0,2018-06-01T00:00:00Z\n";
        let loaded = read_releases(data.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        let lines: Vec<u64> = loaded.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn missing_column_is_fatal() {
        let data = "artifact,date\na:b:1.0,2018-01-01\n";
        let err = read_releases(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn { ref column, .. } if column == "release"
        ));
    }
}
