//! `depchron stats`: what was loaded from the data directory.

use std::io::Write;

use clap::Args;
use depchron_graph::LoadReport;
use serde::Serialize;

use super::Session;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `depchron stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    /// Also list every skipped input row.
    #[arg(long)]
    pub warnings: bool,
}

#[derive(Debug, Serialize)]
struct StatsPayload<'a> {
    data_dir: String,
    nodes: usize,
    edges: usize,
    self_loops: usize,
    artifacts: usize,
    releases: usize,
    bindings: usize,
    warning_count: usize,
    content_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
}

impl<'a> StatsPayload<'a> {
    fn new(session: &Session, report: &'a LoadReport, list_warnings: bool) -> Self {
        Self {
            data_dir: session.data_dir.display().to_string(),
            nodes: report.nodes,
            edges: report.edges,
            self_loops: report.self_loops,
            artifacts: report.artifacts,
            releases: report.releases,
            bindings: report.bindings,
            warning_count: report.warnings.len(),
            content_hash: &report.content_hash,
            warnings: list_warnings
                .then(|| report.warnings.iter().map(ToString::to_string).collect()),
        }
    }
}

/// Execute `depchron stats`.
pub fn run_stats(args: &StatsArgs, session: &Session, output: OutputMode) -> anyhow::Result<()> {
    let payload = StatsPayload::new(session, &session.report, args.warnings);
    render_mode(output, &payload, render_stats_text, render_stats_pretty)
}

fn render_stats_text(p: &StatsPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "nodes={}", p.nodes)?;
    writeln!(w, "edges={}", p.edges)?;
    writeln!(w, "self_loops={}", p.self_loops)?;
    writeln!(w, "artifacts={}", p.artifacts)?;
    writeln!(w, "releases={}", p.releases)?;
    writeln!(w, "bindings={}", p.bindings)?;
    writeln!(w, "warnings={}", p.warning_count)?;
    writeln!(w, "content_hash={}", p.content_hash)?;
    for warning in p.warnings.iter().flatten() {
        writeln!(w, "warning\t{warning}")?;
    }
    Ok(())
}

fn render_stats_pretty(p: &StatsPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Snapshot {}", p.data_dir))?;
    pretty_kv(w, "Nodes", p.nodes.to_string())?;
    pretty_kv(w, "Edges", p.edges.to_string())?;
    pretty_kv(w, "Self-loops", p.self_loops.to_string())?;
    pretty_kv(w, "Artifacts", p.artifacts.to_string())?;
    pretty_kv(w, "Releases", p.releases.to_string())?;
    pretty_kv(w, "Bindings", p.bindings.to_string())?;
    pretty_kv(w, "Skipped rows", p.warning_count.to_string())?;
    pretty_kv(w, "Content hash", p.content_hash)?;
    if let Some(warnings) = &p.warnings {
        writeln!(w)?;
        pretty_section(w, "Skipped rows")?;
        for warning in warnings {
            writeln!(w, "  {warning}")?;
        }
    }
    Ok(())
}
