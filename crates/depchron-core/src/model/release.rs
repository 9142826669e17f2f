use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One published version of an artifact and the calendar date it was released.
///
/// Releases order newest first; releases on the same date order by version
/// string ascending so the catalogue order is total and reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Release {
    /// Version string (the third coordinate segment).
    pub version: String,
    /// Local calendar date of the release timestamp.
    pub date: NaiveDate,
}

impl Release {
    pub fn new(version: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            version: version.into(),
            date,
        }
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .date
            .cmp(&self.date)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
