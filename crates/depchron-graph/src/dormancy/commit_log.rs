use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use depchron_core::config::DormancyConfig;
use depchron_core::ingest::{CommitRecord, LoadError, LoadWarning, load_commits};
use tracing::{info, instrument};

use super::{DormancyOracle, OracleError};

/// Offline oracle over an exported commit log.
///
/// A repository is dormant at `until` when it has fewer than `min_commits`
/// commits strictly between the first day of `until`'s month, shifted back
/// by `window_months`, and `until` itself.
#[derive(Debug, Clone)]
pub struct CommitLogOracle {
    /// Normalized locator → commit times, ascending.
    history: HashMap<String, Vec<NaiveDateTime>>,
    min_commits: usize,
    window_months: u32,
}

impl CommitLogOracle {
    pub fn from_records(
        records: impl IntoIterator<Item = CommitRecord>,
        min_commits: usize,
        window_months: u32,
    ) -> Self {
        let mut history: HashMap<String, Vec<NaiveDateTime>> = HashMap::new();
        for record in records {
            history
                .entry(normalize_locator(&record.repo))
                .or_default()
                .push(record.committed_at);
        }
        for commits in history.values_mut() {
            commits.sort_unstable();
        }
        Self {
            history,
            min_commits,
            window_months,
        }
    }

    /// Load the commit log at `path` with the thresholds from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the log cannot be opened or lacks a column.
    #[instrument(skip(config))]
    pub fn load(
        path: &Path,
        config: &DormancyConfig,
    ) -> Result<(Self, Vec<LoadWarning>), LoadError> {
        let loaded = load_commits(path)?;
        let oracle = Self::from_records(loaded.records, config.min_commits, config.window_months);
        info!(
            repositories = oracle.repository_count(),
            min_commits = oracle.min_commits,
            window_months = oracle.window_months,
            "commit-log oracle ready"
        );
        Ok((oracle, loaded.warnings))
    }

    #[must_use]
    pub fn repository_count(&self) -> usize {
        self.history.len()
    }

    /// Commits of `repo` inside the window ending at `until`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::UnknownRepository`] if the log has no entry
    /// for `repo`.
    pub fn commits_in_window(&self, repo: &str, until: NaiveDate) -> Result<usize, OracleError> {
        let commits = self
            .history
            .get(&normalize_locator(repo))
            .ok_or_else(|| OracleError::UnknownRepository(repo.to_string()))?;

        let since = window_start(until, self.window_months);
        let lower = commits.partition_point(|at| *at <= since);
        let upper = commits.partition_point(|at| *at < until.and_time(NaiveTime::MIN));
        Ok(upper.saturating_sub(lower))
    }
}

impl DormancyOracle for CommitLogOracle {
    fn is_dormant(&self, repo: &str, date: NaiveDate) -> Result<bool, OracleError> {
        Ok(self.commits_in_window(repo, date)? < self.min_commits)
    }
}

fn window_start(until: NaiveDate, window_months: u32) -> NaiveDateTime {
    let month_start = until.with_day(1).unwrap_or(until);
    month_start
        .checked_sub_months(Months::new(window_months))
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Canonical `owner/repo` form of a repository locator.
///
/// `https://github.com/Owner/Repo.git/`, `github.com/owner/repo` and
/// `owner/repo` all normalize to `owner/repo`.
#[must_use]
pub fn normalize_locator(raw: &str) -> String {
    let mut s = raw.trim();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(scheme) {
            s = rest;
        }
    }
    s = s.strip_prefix("www.").unwrap_or(s);
    s = s.strip_prefix("github.com/").unwrap_or(s);
    s = s.trim_end_matches('/');
    s = s.strip_suffix(".git").unwrap_or(s);
    s.to_ascii_lowercase()
}
