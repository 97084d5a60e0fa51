// titres CLI - lifecycle history of mining titles from dated snapshots

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use titres_io::IoError;
use titres_recon::ReconError;

use exit_codes::{io_exit_code, recon_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "titres")]
#[command(about = "Reconcile dated title snapshots into an interval-stamped history")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every domain of a run file and write the history
    #[command(after_help = "\
Examples:
  titres run titres.toml
  titres run titres.toml --json
  titres run titres.toml --output /tmp/titres.geojson -v")]
    Run {
        /// Path to the run file (.toml)
        config: PathBuf,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the history here instead of the run file's output.file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Validate a run file and check its inputs exist, without running
    #[command(after_help = "\
Examples:
  titres validate titres.toml")]
    Validate {
        /// Path to the run file (.toml)
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")",
        "\nengine:  titres-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
        } => run::cmd_run(config, json, output),
        Commands::Validate { config } => run::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::SnapshotOrder { .. } => {
                Some("snapshots are folded in ascending date order".to_string())
            }
            ReconError::ConfigParse(_) => {
                Some("dates must be quoted strings, e.g. date = \"2001-01-01\"".to_string())
            }
            ReconError::ConfigValidation(_) => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::UnsupportedFormat { .. } => {
                Some("convert shapefiles to GeoJSON or CSV with a WKT column".to_string())
            }
            _ => None,
        };
        Self {
            code: io_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}
