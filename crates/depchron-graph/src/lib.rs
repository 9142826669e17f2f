#![forbid(unsafe_code)]
//! depchron-graph library.
//!
//! Time-aware queries over a package-registry dependency snapshot: which
//! release of an artifact was current at a date, what it depended on and
//! what depended on it (directly and transitively), which of its direct
//! dependencies were dormant, and a single-hop influence score.
//!
//! # Conventions
//!
//! - **Errors**: per-query failures are values (`Snapshot`, empty sets);
//!   only loading returns `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod dormancy;
pub mod ecosystem;
pub mod graph;
pub mod metrics;
pub mod timeline;

pub use dormancy::{CommitLogOracle, DeadlineOracle, DormancyOracle, NeverDormant, OracleError};
pub use ecosystem::{Ecosystem, LoadReport, Snapshot, SnapshotMetrics};
pub use graph::GraphStore;
pub use timeline::{Metric, MonthRange, Timeline};
