#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{OutputMode, render_error, resolve_output_mode};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "depchron: time-aware dependency metrics over a package ecosystem",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the link, release and binding snapshots.
    #[arg(long, global = true, env = "DEPCHRON_DATA", default_value = ".")]
    data_dir: PathBuf,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Summarize the loaded snapshot",
        after_help = "EXAMPLES:\n    # Counts and content hash\n    depchron stats\n\n    # Include every skipped row\n    depchron stats --warnings --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        about = "Resolve the release of an artifact current at a date",
        after_help = "EXAMPLES:\n    depchron resolve org.slf4j:slf4j-api --date 2018-02-15"
    )]
    Resolve(cmd::resolve::ResolveArgs),

    #[command(
        about = "Compute every metric for an artifact at a date",
        after_help = "EXAMPLES:\n    # Counts and influence\n    depchron query org.slf4j:slf4j-api --date 2018-02-15\n\n    # List the member tags too\n    depchron query org.slf4j:slf4j-api --date 2018-02-15 --list"
    )]
    Query(cmd::query::QueryArgs),

    #[command(
        about = "Evaluate monthly metric series",
        after_help = "EXAMPLES:\n    # One artifact from 2019 up to today\n    depchron timeline org.slf4j:slf4j-api\n\n    # Every bound artifact, exported as CSV\n    depchron timeline --all-bound --from-year 2019 --until 2021-01-01 --out-dir results --jobs 8"
    )]
    Timeline(cmd::timeline::TimelineArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEPCHRON_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "depchron=debug,info"
        } else {
            "depchron=info,warn"
        })
    });

    let format = env::var("DEPCHRON_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let session = cmd::Session::open(&cli.data_dir, cli.config.as_deref())?;
    match &cli.command {
        Commands::Stats(args) => cmd::stats::run_stats(args, &session, output),
        Commands::Resolve(args) => cmd::resolve::run_resolve(args, &session, output),
        Commands::Query(args) => cmd::query::run_query(args, &session, output),
        Commands::Timeline(args) => cmd::timeline::run_timeline(args, &session, output),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(data_dir = %cli.data_dir.display(), "starting");

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(render_err) = render_error(output, &cmd::classify(&err)) {
                error!("failed to render error: {render_err}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["depchron", "stats", "--json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::parse_from(["depchron", "resolve", "a:b", "--date", "2018-02-15", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn data_dir_and_config_parse() {
        let cli = Cli::parse_from([
            "depchron",
            "--data-dir",
            "/tmp/snap",
            "--config",
            "/tmp/snap/alt.toml",
            "stats",
        ]);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/snap"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/snap/alt.toml")));
    }

    #[test]
    fn query_list_flag() {
        let cli = Cli::parse_from(["depchron", "query", "a:b", "--date", "2018-02-15", "--list"]);
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert!(args.list);
        assert_eq!(args.artifact, "a:b");
    }

    #[test]
    fn timeline_options() {
        let cli = Cli::parse_from([
            "depchron",
            "timeline",
            "a:b",
            "c:d",
            "--from-year",
            "2018",
            "--until",
            "2019-01-01",
            "--jobs",
            "3",
            "--out-dir",
            "out",
        ]);
        let Commands::Timeline(args) = cli.command else {
            panic!("expected timeline");
        };
        assert_eq!(args.artifacts, vec!["a:b", "c:d"]);
        assert_eq!(args.from_year, Some(2018));
        assert_eq!(args.jobs, Some(3));
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
        assert!(!args.all_bound);
    }

    #[test]
    fn resolve_requires_date() {
        assert!(Cli::try_parse_from(["depchron", "resolve", "a:b"]).is_err());
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["depchron", "stats"],
            vec!["depchron", "resolve", "a:b", "--date", "2018-02-15"],
            vec!["depchron", "query", "a:b", "--date", "2018-02-15"],
            vec!["depchron", "timeline", "--all-bound"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }
}
