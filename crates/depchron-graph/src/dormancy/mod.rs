//! Dormancy of direct dependencies.
//!
//! # Overview
//!
//! A repository is *dormant* at a date when it saw fewer than a threshold
//! number of commits in the trailing window ending at that date. The engine
//! never decides this itself: it asks a [`DormancyOracle`] for each direct
//! dependency whose artifact has a repository binding.
//!
//! ## Fail-open
//!
//! Oracle failures (unknown repository, timeout, backend error) are logged
//! and the dependency is treated as *not* dormant. A dormancy report is
//! therefore a lower bound.
//!
//! ## Oracles
//!
//! - [`NeverDormant`]: no data source configured.
//! - [`CommitLogOracle`]: offline, backed by an exported commit log.
//! - [`DeadlineOracle`]: wraps another oracle with a per-call timeout.

mod commit_log;
mod deadline;
mod propagate;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use depchron_core::ErrorCode;

pub use commit_log::{CommitLogOracle, normalize_locator};
pub use deadline::DeadlineOracle;
pub use propagate::dormant_dependencies;

/// Answers "was this repository dormant at `date`?".
///
/// Implementations are shared across threads during timeline evaluation.
pub trait DormancyOracle: Send + Sync {
    /// # Errors
    ///
    /// Returns [`OracleError`] when no answer can be given; callers treat
    /// that as "not dormant".
    fn is_dormant(&self, repo: &str, date: NaiveDate) -> Result<bool, OracleError>;
}

impl<T: DormancyOracle + ?Sized> DormancyOracle for &T {
    fn is_dormant(&self, repo: &str, date: NaiveDate) -> Result<bool, OracleError> {
        (**self).is_dormant(repo, date)
    }
}

impl<T: DormancyOracle + ?Sized> DormancyOracle for Arc<T> {
    fn is_dormant(&self, repo: &str, date: NaiveDate) -> Result<bool, OracleError> {
        (**self).is_dormant(repo, date)
    }
}

impl<T: DormancyOracle + ?Sized> DormancyOracle for Box<T> {
    fn is_dormant(&self, repo: &str, date: NaiveDate) -> Result<bool, OracleError> {
        (**self).is_dormant(repo, date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("no commit history for repository {0:?}")]
    UnknownRepository(String),

    #[error("dormancy oracle timed out after {0:?}")]
    TimedOut(Duration),

    #[error("dormancy oracle unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        ErrorCode::OracleFailure
    }
}

/// Oracle used when no activity source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDormant;

impl DormancyOracle for NeverDormant {
    fn is_dormant(&self, _repo: &str, _date: NaiveDate) -> Result<bool, OracleError> {
        Ok(false)
    }
}
