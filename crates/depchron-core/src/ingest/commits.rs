use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{info, instrument};

use super::timestamp::parse_timestamp;
use super::{InputKind, LoadError, Loaded, column, csv_reader, field, open, read_rows};

const REPO_COLUMN: &str = "repo";
const COMMITTED_AT_COLUMN: &str = "committed_at";

/// One commit of a source repository, as exported from the VCS host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub repo: String,
    pub committed_at: NaiveDateTime,
}

/// Read a commit log with `repo` and `committed_at` header columns.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if either column is absent, or
/// [`LoadError::Read`] on an I/O failure.
pub fn read_commits<R: io::Read>(input: R) -> Result<Loaded<CommitRecord>, LoadError> {
    let mut reader = csv_reader(input, true, b',');
    let repo_idx = column(&mut reader, InputKind::CommitLog, REPO_COLUMN)?;
    let at_idx = column(&mut reader, InputKind::CommitLog, COMMITTED_AT_COLUMN)?;

    read_rows(reader, InputKind::CommitLog, |record| {
        let repo = field(record, repo_idx, REPO_COLUMN)?;
        let committed_at = parse_timestamp(field(record, at_idx, COMMITTED_AT_COLUMN)?)?;
        Ok(Some(CommitRecord {
            repo: repo.to_string(),
            committed_at,
        }))
    })
}

/// Open and read the commit log at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened, lacks a column, or
/// cannot be read.
#[instrument]
pub fn load_commits(path: &Path) -> Result<Loaded<CommitRecord>, LoadError> {
    info!("parsing commit log");
    let loaded = read_commits(open(path)?)?;
    info!(
        commits = loaded.records.len(),
        skipped = loaded.warnings.len(),
        "commit log parsed"
    );
    Ok(loaded)
}
