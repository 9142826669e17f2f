//! Output formatting shared by every subcommand.
//!
//! Each command builds one serializable payload and hands it to
//! [`render_mode`] together with a plain-text and a pretty renderer, so the
//! three formats always carry the same facts.
//!
//! The mode is chosen in this order: `--format`, the hidden `--json`, the
//! `FORMAT` environment variable, then pretty on a terminal and text
//! otherwise.

use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use depchron_core::ErrorCode;
use serde::Serialize;

const RULE: &str = "------------------------------------------------------------------------";
const KEY_WIDTH: usize = 16;

/// Heading line with a rule under it.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}\n{RULE}")
}

/// `Key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<KEY_WIDTH$} {}", value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Aligned sections for a terminal.
    Pretty,
    /// Tab and `key=value` lines for pipes.
    Text,
    /// One JSON document on stdout.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Case-insensitive parse of a `FORMAT` value; unknown values are ignored.
    fn from_env_value(raw: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(raw.trim(), true).ok()
    }
}

fn pick_mode(flag: Option<OutputMode>, json: bool, env: Option<&str>, tty: bool) -> OutputMode {
    flag.or_else(|| json.then_some(OutputMode::Json))
        .or_else(|| env.and_then(OutputMode::from_env_value))
        .unwrap_or(if tty { OutputMode::Pretty } else { OutputMode::Text })
}

/// Mode for this process from flags, `FORMAT`, and whether stdout is a TTY.
pub fn resolve_output_mode(flag: Option<OutputMode>, json: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    pick_mode(flag, json, env.as_deref(), io::stdout().is_terminal())
}

/// Write `payload` to stdout in `mode`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    payload: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    write_payload(&mut stdout, mode, payload, text, pretty)?;
    stdout.flush()?;
    Ok(())
}

fn write_payload<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    payload: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let doc = serde_json::to_string_pretty(payload)?;
            writeln!(out, "{doc}")?;
        }
        OutputMode::Text => text(payload, out)?,
        OutputMode::Pretty => pretty(payload, out)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A fatal error as reported on stderr.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Error tagged with `code` and its remediation hint.
    pub fn coded(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            suggestion: code.hint().map(String::from),
            error_code: Some(code.code().to_owned()),
            ..Self::new(message)
        }
    }
}

#[derive(Serialize)]
struct ErrorDocument<'a> {
    error: &'a CliError,
}

/// Write `error` to stderr: `{"error": …}` in JSON mode, `error[E####]: …`
/// otherwise.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut stderr = io::stderr().lock();
    write_error(&mut stderr, mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        let doc = serde_json::to_string_pretty(&ErrorDocument { error })?;
        writeln!(out, "{doc}")?;
        return Ok(());
    }

    let prefix = error
        .error_code
        .as_deref()
        .map_or_else(|| "error".to_string(), |code| format!("error[{code}]"));
    writeln!(out, "{prefix}: {}", error.message)?;
    if let Some(hint) = &error.suggestion {
        writeln!(out, "  suggestion: {hint}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_format_beats_everything() {
        assert_eq!(
            pick_mode(Some(OutputMode::Text), true, Some("pretty"), true),
            OutputMode::Text
        );
        assert_eq!(pick_mode(None, true, Some("text"), true), OutputMode::Json);
    }

    #[test]
    fn env_then_terminal() {
        assert_eq!(pick_mode(None, false, Some(" JSON "), true), OutputMode::Json);
        assert_eq!(pick_mode(None, false, Some("bogus"), true), OutputMode::Pretty);
        assert_eq!(pick_mode(None, false, None, false), OutputMode::Text);
    }

    #[test]
    fn json_payload() {
        let mut buf = Vec::new();
        write_payload(
            &mut buf,
            OutputMode::Json,
            &serde_json::json!({"nodes": 3}),
            |_, _| Ok(()),
            |_, _| Ok(()),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["nodes"], 3);
    }

    #[test]
    fn text_and_pretty_use_their_renderers() {
        let mut text = Vec::new();
        write_payload(&mut text, OutputMode::Text, &1, |v, w| writeln!(w, "v={v}"), |_, _| Ok(()))
            .unwrap();
        assert_eq!(String::from_utf8(text).unwrap(), "v=1\n");

        let mut pretty = Vec::new();
        write_payload(
            &mut pretty,
            OutputMode::Pretty,
            &1,
            |_, _| Ok(()),
            |v, w| pretty_kv(w, "value", v.to_string()),
        )
        .unwrap();
        assert_eq!(String::from_utf8(pretty).unwrap(), "value:           1\n");
    }

    #[test]
    fn section_has_rule() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Snapshot").unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("Snapshot\n---"));
        assert_eq!(out.lines().nth(1).unwrap().len(), 72);
    }

    #[test]
    fn coded_error_carries_hint() {
        let err = CliError::coded("no such dir", ErrorCode::DataDirMissing);
        assert_eq!(err.error_code.as_deref(), Some("E1001"));
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn error_human_and_json() {
        let err = CliError::coded("boom", ErrorCode::InputUnreadable);
        let mut human = Vec::new();
        write_error(&mut human, OutputMode::Text, &err).unwrap();
        assert!(String::from_utf8(human).unwrap().starts_with("error[E1003]: boom\n"));

        let mut plain = Vec::new();
        write_error(&mut plain, OutputMode::Pretty, &CliError::new("plain")).unwrap();
        assert_eq!(String::from_utf8(plain).unwrap(), "error: plain\n");

        let mut json = Vec::new();
        write_error(&mut json, OutputMode::Json, &CliError::new("plain")).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["error"]["message"], "plain");
        assert!(parsed["error"].get("error_code").is_none());
    }
}
