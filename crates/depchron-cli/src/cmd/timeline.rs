//! `depchron timeline`: monthly metric series, optionally exported as CSV.

use std::io::Write;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, bail};
use clap::Args;
use depchron_core::ArtifactId;
use depchron_graph::timeline::{evaluate_many, month_label, write_metric_csvs};
use depchron_graph::{Metric, MonthRange, Timeline};
use serde::Serialize;
use tracing::info;

use super::{Session, parse_artifact, parse_date};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `depchron timeline`.
#[derive(Args, Debug, Default)]
pub struct TimelineArgs {
    /// Artifact keys (`group:name`).
    pub artifacts: Vec<String>,

    /// Also evaluate every artifact with a repository binding.
    #[arg(long)]
    pub all_bound: bool,

    /// First year of the series (defaults to `[timeline] starting_year`).
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Exclusive end date (`YYYY-MM-DD`, defaults to today).
    #[arg(long)]
    pub until: Option<String>,

    /// Write one `<metric>.csv` per metric into this directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TimelinePayload {
    months: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
    timelines: Vec<Timeline>,
}

/// Artifacts named on the command line, then bound artifacts not already named.
fn select_artifacts(args: &TimelineArgs, session: &Session) -> anyhow::Result<Vec<ArtifactId>> {
    let mut selected = args
        .artifacts
        .iter()
        .map(|raw| parse_artifact(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if args.all_bound {
        for artifact in session.ecosystem.bindings().artifacts() {
            if !selected.contains(artifact) {
                selected.push(artifact.clone());
            }
        }
    }

    if selected.is_empty() {
        bail!("no artifacts to evaluate: name at least one or pass --all-bound");
    }
    Ok(selected)
}

fn default_jobs() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Execute `depchron timeline`.
///
/// # Errors
///
/// Fails on malformed arguments, an unreadable commit log, a worker pool
/// that cannot start, or CSV files that cannot be written.
pub fn run_timeline(args: &TimelineArgs, session: &Session, output: OutputMode) -> anyhow::Result<()> {
    let artifacts = select_artifacts(args, session)?;
    let until = match &args.until {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let starting_year = args.from_year.unwrap_or(session.config.timeline.starting_year);
    let range = MonthRange::new(starting_year, until)?;
    let months = range.months();
    let jobs = args.jobs.unwrap_or_else(default_jobs);

    info!(
        artifacts = artifacts.len(),
        months = months.len(),
        jobs,
        "evaluating timelines"
    );

    let oracle = session.oracle()?;
    let timelines = evaluate_many(&session.ecosystem, &artifacts, &range, oracle.as_ref(), jobs)?;

    let files = match &args.out_dir {
        Some(dir) => write_metric_csvs(dir, &months, &timelines)
            .context("Failed to export timeline")?
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        None => Vec::new(),
    };

    let payload = TimelinePayload {
        months: months.iter().copied().map(month_label).collect(),
        files,
        timelines,
    };
    render_mode(output, &payload, render_timeline_text, render_timeline_pretty)
}

fn cells(timeline: &Timeline, metric: Metric) -> Vec<String> {
    timeline
        .points
        .iter()
        .map(|point| point.metrics().map_or_else(|| "null".to_string(), |m| metric.render(m)))
        .collect()
}

fn render_timeline_text(p: &TimelinePayload, w: &mut dyn Write) -> std::io::Result<()> {
    for timeline in &p.timelines {
        for metric in Metric::ALL {
            writeln!(
                w,
                "{}\t{}\t{}",
                timeline.artifact,
                metric.name(),
                cells(timeline, metric).join(",")
            )?;
        }
    }
    for file in &p.files {
        writeln!(w, "wrote\t{file}")?;
    }
    Ok(())
}

fn render_timeline_pretty(p: &TimelinePayload, w: &mut dyn Write) -> std::io::Result<()> {
    let span = match (p.months.first(), p.months.last()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "no months".to_string(),
    };
    pretty_section(w, &format!("Timeline {span}"))?;
    for timeline in &p.timelines {
        pretty_kv(
            w,
            timeline.artifact.as_str(),
            format!("{}/{} months measured", timeline.measured(), timeline.points.len()),
        )?;
        let latest = timeline.points.iter().rev().find_map(|point| point.metrics());
        if let Some(m) = latest {
            writeln!(
                w,
                "  latest: upstreams={} downstreams={} t_upstreams={} t_downstreams={} d_upstreams={} dc_katz={:.3}",
                m.upstreams, m.downstreams, m.t_upstreams, m.t_downstreams, m.d_upstreams, m.dc_katz
            )?;
        }
    }
    if !p.files.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Exported")?;
        for file in &p.files {
            writeln!(w, "  {file}")?;
        }
    }
    Ok(())
}
