//! `depchron query`: every metric for one artifact at one date.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::NaiveDate;
use clap::Args;
use depchron_core::{ArtifactTag, ErrorCode, ResolveError};
use depchron_graph::{Snapshot, SnapshotMetrics};
use serde::Serialize;

use super::{Session, parse_artifact, parse_date};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `depchron query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Artifact key (`group:name`).
    pub artifact: String,

    /// Query date (`YYYY-MM-DD`).
    #[arg(long)]
    pub date: String,

    /// Include the member tags of every set, not just their sizes.
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Serialize)]
struct QueryPayload {
    artifact: String,
    date: NaiveDate,
    #[serde(flatten)]
    outcome: QueryOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum QueryOutcome {
    Resolved {
        tag: String,
        counts: Counts,
        influence: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        sets: Option<Sets>,
    },
    Unresolved {
        error_code: &'static str,
        reason: ResolveError,
    },
    NotInGraph {
        error_code: &'static str,
        tag: String,
    },
}

#[derive(Debug, Serialize)]
struct Counts {
    dependencies: usize,
    dependents: usize,
    transitive_dependencies: usize,
    transitive_dependents: usize,
    dormant_dependencies: usize,
}

impl From<&SnapshotMetrics> for Counts {
    fn from(m: &SnapshotMetrics) -> Self {
        Self {
            dependencies: m.dependencies.len(),
            dependents: m.dependents.len(),
            transitive_dependencies: m.transitive_dependencies.len(),
            transitive_dependents: m.transitive_dependents.len(),
            dormant_dependencies: m.dormant_dependencies.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Sets {
    dependencies: Vec<String>,
    dependents: Vec<String>,
    transitive_dependencies: Vec<String>,
    transitive_dependents: Vec<String>,
    dormant_dependencies: Vec<String>,
}

fn tags(set: &BTreeSet<ArtifactTag>) -> Vec<String> {
    set.iter().map(ToString::to_string).collect()
}

impl From<&SnapshotMetrics> for Sets {
    fn from(m: &SnapshotMetrics) -> Self {
        Self {
            dependencies: tags(&m.dependencies),
            dependents: tags(&m.dependents),
            transitive_dependencies: tags(&m.transitive_dependencies),
            transitive_dependents: tags(&m.transitive_dependents),
            dormant_dependencies: tags(&m.dormant_dependencies),
        }
    }
}

impl QueryOutcome {
    fn from_snapshot(snapshot: Snapshot, list: bool) -> Self {
        match snapshot {
            Snapshot::Resolved { tag, metrics } => Self::Resolved {
                tag: tag.to_string(),
                counts: Counts::from(&metrics),
                influence: metrics.influence,
                sets: list.then(|| Sets::from(&metrics)),
            },
            Snapshot::Unresolved { reason } => Self::Unresolved {
                error_code: reason.error_code().code(),
                reason,
            },
            Snapshot::NotInGraph { tag } => Self::NotInGraph {
                error_code: ErrorCode::TagNotInGraph.code(),
                tag: tag.to_string(),
            },
        }
    }
}

/// Execute `depchron query`.
///
/// # Errors
///
/// Fails on a malformed argument or an unreadable commit log.
pub fn run_query(args: &QueryArgs, session: &Session, output: OutputMode) -> anyhow::Result<()> {
    let artifact = parse_artifact(&args.artifact)?;
    let date = parse_date(&args.date)?;
    let oracle = session.oracle()?;

    let snapshot = session.ecosystem.snapshot(&artifact, date, oracle.as_ref());
    let payload = QueryPayload {
        artifact: artifact.to_string(),
        date,
        outcome: QueryOutcome::from_snapshot(snapshot, args.list),
    };
    render_mode(output, &payload, render_query_text, render_query_pretty)
}

fn render_query_text(p: &QueryPayload, w: &mut dyn Write) -> std::io::Result<()> {
    match &p.outcome {
        QueryOutcome::Resolved {
            tag,
            counts,
            influence,
            sets,
        } => {
            writeln!(w, "tag={tag}")?;
            writeln!(w, "upstreams={}", counts.dependencies)?;
            writeln!(w, "downstreams={}", counts.dependents)?;
            writeln!(w, "t_upstreams={}", counts.transitive_dependencies)?;
            writeln!(w, "t_downstreams={}", counts.transitive_dependents)?;
            writeln!(w, "d_upstreams={}", counts.dormant_dependencies)?;
            writeln!(w, "dc_katz={influence}")?;
            if let Some(sets) = sets {
                for (name, members) in sets.named() {
                    for member in members {
                        writeln!(w, "{name}\t{member}")?;
                    }
                }
            }
            Ok(())
        }
        QueryOutcome::Unresolved { error_code, reason } => {
            writeln!(w, "unresolved\t{error_code}\t{reason}")
        }
        QueryOutcome::NotInGraph { error_code, tag } => {
            writeln!(w, "not_in_graph\t{error_code}\t{tag}")
        }
    }
}

fn render_query_pretty(p: &QueryPayload, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("{} @ {}", p.artifact, p.date))?;
    match &p.outcome {
        QueryOutcome::Resolved {
            tag,
            counts,
            influence,
            sets,
        } => {
            pretty_kv(w, "Tag", tag)?;
            pretty_kv(w, "Dependencies", counts.dependencies.to_string())?;
            pretty_kv(w, "Dependents", counts.dependents.to_string())?;
            pretty_kv(w, "Transitive deps", counts.transitive_dependencies.to_string())?;
            pretty_kv(w, "Transitive users", counts.transitive_dependents.to_string())?;
            pretty_kv(w, "Dormant deps", counts.dormant_dependencies.to_string())?;
            pretty_kv(w, "Influence", format!("{influence:.3}"))?;
            if let Some(sets) = sets {
                for (name, members) in sets.named() {
                    if members.is_empty() {
                        continue;
                    }
                    writeln!(w)?;
                    pretty_section(w, name)?;
                    for member in members {
                        writeln!(w, "  {member}")?;
                    }
                }
            }
            Ok(())
        }
        QueryOutcome::Unresolved { error_code, reason } => {
            pretty_kv(w, "Unresolved", format!("{reason} ({error_code})"))
        }
        QueryOutcome::NotInGraph { error_code, tag } => {
            pretty_kv(w, "Tag", tag)?;
            pretty_kv(w, "In graph", format!("no ({error_code})"))
        }
    }
}

impl Sets {
    fn named(&self) -> [(&'static str, &[String]); 5] {
        [
            ("dependencies", &self.dependencies),
            ("dependents", &self.dependents),
            ("transitive_dependencies", &self.transitive_dependencies),
            ("transitive_dependents", &self.transitive_dependents),
            ("dormant_dependencies", &self.dormant_dependencies),
        ]
    }
}
