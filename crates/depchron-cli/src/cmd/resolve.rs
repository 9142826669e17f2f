//! `depchron resolve`: which release of an artifact was current at a date.

use std::io::Write;

use chrono::NaiveDate;
use clap::Args;
use depchron_core::ResolveError;
use depchron_core::release_index::grace_threshold;
use serde::Serialize;

use super::{Session, parse_artifact, parse_date};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `depchron resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Artifact key (`group:name`).
    pub artifact: String,

    /// Query date (`YYYY-MM-DD`).
    #[arg(long)]
    pub date: String,
}

#[derive(Debug, Serialize)]
struct ResolvePayload {
    artifact: String,
    date: NaiveDate,
    threshold: NaiveDate,
    #[serde(flatten)]
    outcome: ResolveOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum ResolveOutcome {
    Resolved {
        tag: String,
        released: NaiveDate,
        in_graph: bool,
    },
    Unresolved {
        error_code: &'static str,
        reason: ResolveError,
    },
}

/// Execute `depchron resolve`.
pub fn run_resolve(args: &ResolveArgs, session: &Session, output: OutputMode) -> anyhow::Result<()> {
    let artifact = parse_artifact(&args.artifact)?;
    let date = parse_date(&args.date)?;
    let eco = &session.ecosystem;

    let outcome = match eco.resolve_release(&artifact, date) {
        Ok(release) => {
            let tag = artifact.with_version(&release.version);
            ResolveOutcome::Resolved {
                in_graph: eco.tag_exists(tag.as_str()),
                tag: tag.to_string(),
                released: release.date,
            }
        }
        Err(reason) => ResolveOutcome::Unresolved {
            error_code: reason.error_code().code(),
            reason,
        },
    };

    let payload = ResolvePayload {
        artifact: artifact.to_string(),
        date,
        threshold: grace_threshold(date),
        outcome,
    };
    render_mode(output, &payload, render_resolve_text, render_resolve_pretty)
}

fn render_resolve_text(p: &ResolvePayload, w: &mut dyn Write) -> std::io::Result<()> {
    match &p.outcome {
        ResolveOutcome::Resolved {
            tag,
            released,
            in_graph,
        } => writeln!(w, "{tag}\treleased={released}\tin_graph={in_graph}"),
        ResolveOutcome::Unresolved { error_code, reason } => {
            writeln!(w, "unresolved\t{error_code}\t{reason}")
        }
    }
}

fn render_resolve_pretty(p: &ResolvePayload, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("{} @ {}", p.artifact, p.date))?;
    pretty_kv(w, "Threshold", p.threshold.to_string())?;
    match &p.outcome {
        ResolveOutcome::Resolved {
            tag,
            released,
            in_graph,
        } => {
            pretty_kv(w, "Tag", tag)?;
            pretty_kv(w, "Released", released.to_string())?;
            pretty_kv(w, "In graph", if *in_graph { "yes" } else { "no" })
        }
        ResolveOutcome::Unresolved { error_code, reason } => {
            pretty_kv(w, "Unresolved", format!("{reason} ({error_code})"))
        }
    }
}
