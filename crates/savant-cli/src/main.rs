#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use savant_core::config::{UserConfig, load_user_config};
use std::env;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "savant: expert ranking over sentence-level vector search",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Rank(cmd::rank::RankArgs),

    #[command(
        about = "Show the effective ranking configuration",
        long_about = "Show the ranking configuration after applying .savant/config.toml, \
                      SAVANT_PRECISION and SAVANT_STRATEGY.",
        after_help = "EXAMPLES:\n    # Show configuration\n    savant config\n\n    \
                      # Emit machine-readable output\n    savant config --json"
    )]
    Config,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SAVANT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "savant=debug,info"
        } else {
            "savant=info,warn"
        })
    });

    let format = env::var("SAVANT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output.
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

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user = load_user_config().unwrap_or_else(|err| {
        warn!("ignoring user config: {err:#}");
        UserConfig::default()
    });
    let output = resolve_output_mode(cli.format, cli.json, user.output.as_deref());

    let result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|project_root| match &cli.command {
            Commands::Rank(args) => cmd::rank::run_rank(args, output, &project_root),
            Commands::Config => cmd::config::run_config(output, &project_root),
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let rendered = match err.downcast_ref::<CliError>() {
                Some(cli_err) => render_error(output, cli_err),
                None => render_error(output, &CliError::unexpected(&err)),
            };
            if let Err(render_err) = rendered {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
