//! Monthly metric series.
//!
//! # Overview
//!
//! A timeline samples one artifact once per month. For every month start
//! from January 1 of the starting year up to (but excluding) the `until`
//! date, the artifact is resolved and measured at the *following* month
//! start, so the January 2019 point describes the ecosystem as of
//! 2019-02-01.
//!
//! Each point is either a full set of [`MonthMetrics`] or a
//! [`MonthOutcome::Missing`] with the reason. Missing points are exported
//! as `null`.
//!
//! ## Parallelism
//!
//! [`evaluate_many`] spreads artifacts over a dedicated rayon pool. The
//! [`Ecosystem`] is immutable and the oracle is `Sync`, so workers share
//! both by reference. Results come back in input order.

mod export;

use chrono::{Datelike, Months, NaiveDate};
use depchron_core::{ArtifactId, ArtifactTag, ResolveError};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::dormancy::DormancyOracle;
use crate::ecosystem::{Ecosystem, Snapshot, SnapshotMetrics};

pub use export::{write_metric_csv, write_metric_csvs};

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("starting year {0} is out of range")]
    InvalidStartYear(i32),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// ---------------------------------------------------------------------------
// Months
// ---------------------------------------------------------------------------

/// Month starts `[Jan 1 of start year, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    first: NaiveDate,
    until: NaiveDate,
}

impl MonthRange {
    /// # Errors
    ///
    /// Returns [`TimelineError::InvalidStartYear`] if January 1 of
    /// `starting_year` is not a representable date.
    pub fn new(starting_year: i32, until: NaiveDate) -> Result<Self, TimelineError> {
        let first = NaiveDate::from_ymd_opt(starting_year, 1, 1)
            .ok_or(TimelineError::InvalidStartYear(starting_year))?;
        Ok(Self { first, until })
    }

    /// Every month start in the range, ascending. Empty if the start year
    /// is not before `until`.
    #[must_use]
    pub fn months(&self) -> Vec<NaiveDate> {
        let mut months = Vec::new();
        let mut current = self.first;
        while current < self.until {
            months.push(current);
            match current.checked_add_months(Months::new(1)) {
                Some(next) => current = next,
                None => break,
            }
        }
        months
    }
}

/// Column label for a month, e.g. `2019-JANUARY`.
#[must_use]
pub fn month_label(month: NaiveDate) -> String {
    month.format("%Y-%B").to_string().to_uppercase()
}

/// The date a month's point is measured at: the next month start.
#[must_use]
pub fn evaluation_date(month: NaiveDate) -> NaiveDate {
    let start = month.with_day(1).unwrap_or(month);
    start.checked_add_months(Months::new(1)).unwrap_or(start)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// One exported series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Upstreams,
    Downstreams,
    TUpstreams,
    TDownstreams,
    DUpstreams,
    DcKatz,
}

impl Metric {
    pub const ALL: [Self; 6] = [
        Self::Upstreams,
        Self::Downstreams,
        Self::TUpstreams,
        Self::TDownstreams,
        Self::DUpstreams,
        Self::DcKatz,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Upstreams => "upstreams",
            Self::Downstreams => "downstreams",
            Self::TUpstreams => "t_upstreams",
            Self::TDownstreams => "t_downstreams",
            Self::DUpstreams => "d_upstreams",
            Self::DcKatz => "dc_katz",
        }
    }

    /// Cell text for this metric.
    #[must_use]
    pub fn render(self, metrics: &MonthMetrics) -> String {
        match self {
            Self::Upstreams => metrics.upstreams.to_string(),
            Self::Downstreams => metrics.downstreams.to_string(),
            Self::TUpstreams => metrics.t_upstreams.to_string(),
            Self::TDownstreams => metrics.t_downstreams.to_string(),
            Self::DUpstreams => metrics.d_upstreams.to_string(),
            Self::DcKatz => metrics.dc_katz.to_string(),
        }
    }
}

/// Counts for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthMetrics {
    pub upstreams: usize,
    pub downstreams: usize,
    pub t_upstreams: usize,
    pub t_downstreams: usize,
    pub d_upstreams: usize,
    pub dc_katz: f64,
}

impl From<&SnapshotMetrics> for MonthMetrics {
    fn from(m: &SnapshotMetrics) -> Self {
        Self {
            upstreams: m.dependencies.len(),
            downstreams: m.dependents.len(),
            t_upstreams: m.transitive_dependencies.len(),
            t_downstreams: m.transitive_dependents.len(),
            d_upstreams: m.dormant_dependencies.len(),
            dc_katz: m.influence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonthOutcome {
    Measured {
        tag: ArtifactTag,
        metrics: MonthMetrics,
    },
    Missing {
        reason: MissingReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingReason {
    Unresolved { error: ResolveError },
    NotInGraph { tag: ArtifactTag },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: NaiveDate,
    pub evaluated_at: NaiveDate,
    pub outcome: MonthOutcome,
}

impl MonthPoint {
    #[must_use]
    pub const fn metrics(&self) -> Option<&MonthMetrics> {
        match &self.outcome {
            MonthOutcome::Measured { metrics, .. } => Some(metrics),
            MonthOutcome::Missing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub artifact: ArtifactId,
    pub points: Vec<MonthPoint>,
}

impl Timeline {
    /// Number of months with a measurement.
    #[must_use]
    pub fn measured(&self) -> usize {
        self.points.iter().filter(|p| p.metrics().is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Monthly series for one artifact.
#[must_use]
#[instrument(skip(ecosystem, range, oracle))]
pub fn evaluate<O>(
    ecosystem: &Ecosystem,
    artifact: &ArtifactId,
    range: &MonthRange,
    oracle: &O,
) -> Timeline
where
    O: DormancyOracle + ?Sized,
{
    let points = range
        .months()
        .into_iter()
        .map(|month| {
            let evaluated_at = evaluation_date(month);
            let outcome = match ecosystem.snapshot(artifact, evaluated_at, oracle) {
                Snapshot::Resolved { tag, metrics } => MonthOutcome::Measured {
                    tag,
                    metrics: MonthMetrics::from(&metrics),
                },
                Snapshot::Unresolved { reason } => MonthOutcome::Missing {
                    reason: MissingReason::Unresolved { error: reason },
                },
                Snapshot::NotInGraph { tag } => MonthOutcome::Missing {
                    reason: MissingReason::NotInGraph { tag },
                },
            };
            MonthPoint {
                month,
                evaluated_at,
                outcome,
            }
        })
        .collect();

    let timeline = Timeline {
        artifact: artifact.clone(),
        points,
    };
    debug!(
        months = timeline.points.len(),
        measured = timeline.measured(),
        "timeline evaluated"
    );
    timeline
}

/// Monthly series for many artifacts on `jobs` worker threads.
///
/// # Errors
///
/// Returns [`TimelineError::Pool`] if the worker pool cannot be created.
#[instrument(skip(ecosystem, artifacts, range, oracle), fields(artifacts = artifacts.len()))]
pub fn evaluate_many<O>(
    ecosystem: &Ecosystem,
    artifacts: &[ArtifactId],
    range: &MonthRange,
    oracle: &O,
    jobs: usize,
) -> Result<Vec<Timeline>, TimelineError>
where
    O: DormancyOracle + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|i| format!("depchron-timeline-{i}"))
        .build()?;

    let timelines: Vec<Timeline> = pool.install(|| {
        artifacts
            .par_iter()
            .map(|artifact| evaluate(ecosystem, artifact, range, oracle))
            .collect()
    });

    info!(
        artifacts = timelines.len(),
        months = range.months().len(),
        "timelines evaluated"
    );
    Ok(timelines)
}
