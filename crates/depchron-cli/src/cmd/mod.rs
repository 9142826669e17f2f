//! Subcommand handlers and the loading they share.

pub mod query;
pub mod resolve;
pub mod stats;
pub mod timeline;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use depchron_core::config::{DepchronConfig, InputsConfig, load_config};
use depchron_core::ingest::LoadError;
use depchron_core::{ArtifactId, ErrorCode};
use depchron_graph::{CommitLogOracle, DeadlineOracle, DormancyOracle, Ecosystem, LoadReport, NeverDormant};
use tracing::{info, warn};

use crate::output::CliError;

/// Context attached to an `anyhow` chain so `main` can report a stable code.
#[derive(Debug, Clone, Copy)]
pub struct Failure(pub ErrorCode);

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.message())
    }
}

/// Map a fatal error to the structured form printed on stderr.
pub fn classify(err: &anyhow::Error) -> CliError {
    let message = format!("{err:#}");
    if let Some(Failure(code)) = err.downcast_ref::<Failure>() {
        return CliError::coded(message, *code);
    }
    if let Some(load) = err.downcast_ref::<LoadError>() {
        return CliError::coded(message, load.error_code());
    }
    CliError::new(message)
}

/// Everything a query command needs.
pub struct Session {
    pub config: DepchronConfig,
    pub data_dir: PathBuf,
    pub ecosystem: Ecosystem,
    pub report: LoadReport,
}

impl Session {
    /// Load config and the snapshot from `data_dir`.
    ///
    /// # Errors
    ///
    /// Fails with a coded error if the directory is missing, the config is
    /// invalid, or an input file is unreadable.
    pub fn open(data_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        if !data_dir.is_dir() {
            return Err(anyhow::anyhow!("{} is not a directory", data_dir.display()))
                .context(Failure(ErrorCode::DataDirMissing));
        }

        let config = load_config(data_dir, config_path).context(Failure(ErrorCode::ConfigParseError))?;
        let (ecosystem, report) = Ecosystem::load(data_dir, &config.inputs)?;

        for warning in report.warnings.iter().take(5) {
            warn!(code = %warning.error_code(), "{warning}");
        }

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            ecosystem,
            report,
        })
    }

    /// Dormancy oracle selected by `[dormancy]`.
    ///
    /// Without a commit log every dependency is active. With `timeout_ms`
    /// set, each oracle call is bounded.
    ///
    /// # Errors
    ///
    /// Fails if the configured commit log cannot be read.
    pub fn oracle(&self) -> Result<Arc<dyn DormancyOracle>> {
        let dormancy = &self.config.dormancy;
        let base: Arc<dyn DormancyOracle> = match &dormancy.commit_log {
            None => Arc::new(NeverDormant),
            Some(path) => {
                let path = InputsConfig::resolve(&self.data_dir, path);
                let (oracle, warnings) = CommitLogOracle::load(&path, dormancy)
                    .context("Failed to load commit log")?;
                if !warnings.is_empty() {
                    warn!(skipped = warnings.len(), "commit log rows skipped");
                }
                Arc::new(oracle)
            }
        };

        Ok(match dormancy.timeout_ms {
            Some(ms) => {
                let bounded = DeadlineOracle::new(base, Duration::from_millis(ms));
                info!(
                    timeout_ms = ms,
                    workers = bounded.workers(),
                    "dormancy oracle calls are time-bounded"
                );
                Arc::new(bounded)
            }
            None => base,
        })
    }
}

/// Parse an `artifact` argument as a `group:name` key.
///
/// # Errors
///
/// Fails if the key does not have exactly two non-empty segments.
pub fn parse_artifact(raw: &str) -> Result<ArtifactId> {
    let mut parts = raw.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(name), None) if !group.is_empty() && !name.is_empty() => {
            Ok(ArtifactId::from_parts(group, name))
        }
        _ => bail!("artifact must be a group:name key, got {raw:?}"),
    }
}

/// Parse a `YYYY-MM-DD` date argument.
///
/// # Errors
///
/// Fails if `raw` is not a calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("expected a YYYY-MM-DD date, got {raw:?}"))
}
