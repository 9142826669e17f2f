//! CSV ingestion of the snapshot inputs.
//!
//! # Overview
//!
//! Four flat files feed the engine:
//!
//! | input      | header | columns                                  |
//! |------------|--------|------------------------------------------|
//! | links      | no     | `from_tag, to_tag`                       |
//! | releases   | yes    | `artifact` (`g:a:v`), `release` (ISO-8601) |
//! | bindings   | yes    | project key, repository locator (`;`)    |
//! | commit log | yes    | `repo`, `committed_at`                   |
//!
//! ## Failure policy
//!
//! A file that cannot be opened, a missing header column, or an I/O error
//! mid-stream is a [`LoadError`]; the whole load aborts because a partial
//! snapshot would silently skew every downstream metric. A single row that
//! fails to parse becomes a [`LoadWarning`], is logged, and is skipped.

mod bindings;
mod commits;
mod links;
mod releases;
mod timestamp;

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::Serialize;
use tracing::warn;

use crate::error::ErrorCode;
use crate::model::CoordinateError;

pub use bindings::{ABSENT_LOCATOR, BindingLayout, BindingRecord, load_bindings, read_bindings};
pub use commits::{CommitRecord, load_commits, read_commits};
pub use links::{LinkRecord, load_links, read_links};
pub use releases::{ReleaseRecord, load_releases, parse_release_row, read_releases};
pub use timestamp::{parse_date, parse_timestamp};

// ---------------------------------------------------------------------------
// Warnings and errors
// ---------------------------------------------------------------------------

/// Which input a warning or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Links,
    Releases,
    Bindings,
    CommitLog,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Links => "links",
            Self::Releases => "releases",
            Self::Bindings => "bindings",
            Self::CommitLog => "commit log",
        })
    }
}

/// A row that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub input: InputKind,
    /// 1-based line number in the source file (0 when unknown).
    pub line: u64,
    pub reason: String,
}

impl LoadWarning {
    pub fn new(input: InputKind, line: u64, reason: impl fmt::Display) -> Self {
        Self {
            input,
            line,
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        ErrorCode::MalformedInputRow
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}: {}", self.input, self.line, self.reason)
    }
}

/// Parsed rows plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub warnings: Vec<LoadWarning>,
}

/// Fatal ingestion failure.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {input} input: {source}")]
    Read {
        input: InputKind,
        #[source]
        source: csv::Error,
    },

    #[error("{input} input has no {column:?} column")]
    MissingColumn { input: InputKind, column: String },
}

impl LoadError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Open { .. } | Self::Read { .. } => ErrorCode::InputUnreadable,
            Self::MissingColumn { .. } => ErrorCode::MissingColumn,
        }
    }
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error("unparseable timestamp {0:?}")]
    Timestamp(String),
}

// ---------------------------------------------------------------------------
// Shared reader plumbing
// ---------------------------------------------------------------------------

pub(crate) fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn csv_reader<R: io::Read>(input: R, has_headers: bool, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Position of a named header column.
pub(crate) fn column<R: io::Read>(
    reader: &mut csv::Reader<R>,
    input: InputKind,
    name: &str,
) -> Result<usize, LoadError> {
    let headers = reader
        .headers()
        .map_err(|source| LoadError::Read { input, source })?;
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LoadError::MissingColumn {
            input,
            column: name.to_string(),
        })
}

/// Non-empty field at `idx`, or [`RowError::MissingField`].
pub(crate) fn field<'r>(
    record: &'r StringRecord,
    idx: usize,
    name: &'static str,
) -> Result<&'r str, RowError> {
    record
        .get(idx)
        .filter(|value| !value.is_empty())
        .ok_or(RowError::MissingField(name))
}

/// Drive `parse` over every row. `Ok(None)` from `parse` drops a row
/// without a warning.
pub(crate) fn read_rows<R, T>(
    mut reader: csv::Reader<R>,
    input: InputKind,
    mut parse: impl FnMut(&StringRecord) -> Result<Option<T>, RowError>,
) -> Result<Loaded<T>, LoadError>
where
    R: io::Read,
{
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(source) if source.is_io_error() => {
                return Err(LoadError::Read { input, source });
            }
            Err(err) => {
                let line = err.position().map_or(0, csv::Position::line);
                warn!(%input, line, error = %err, "skipping unreadable row");
                warnings.push(LoadWarning::new(input, line, err));
                continue;
            }
        };

        match parse(&record) {
            Ok(Some(parsed)) => records.push(parsed),
            Ok(None) => {}
            Err(err) => {
                let line = record.position().map_or(0, csv::Position::line);
                warn!(%input, line, error = %err, "skipping malformed row");
                warnings.push(LoadWarning::new(input, line, err));
            }
        }
    }

    Ok(Loaded { records, warnings })
}
