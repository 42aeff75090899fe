//! GridLam - stacking-integrity checks for composite laminates on a cell grid
//!
//! Loads a project document, runs the symmetry, balance and neighbor graph
//! checks, and rewrites stacking sequences by neighborhood or by symmetric
//! ply removal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gridlam::cli::{
    CheckArgs, CliError, ConfigArgs, Context, ExitCode, IntermediateArgs, NeighborsArgs,
    ReorderArgs,
};
use gridlam::config::Config;

/// GridLam - stacking-integrity engine for gridded composite laminates
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Symmetry, balance, duplicate, AML and bulk checks
    Check(CheckArgs),
    /// Inspect and edit the neighbor graph
    Neighbors(NeighborsArgs),
    /// Reorder plies by neighborhood
    Reorder(ReorderArgs),
    /// Build an intermediate laminate by symmetric ply removal
    Intermediate(IntermediateArgs),
    /// Show or change configuration
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match load_config(cli.config.as_ref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Logs go to stderr so --json output on stdout stays parseable
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(e) = config_error {
        if cli.config.is_some() {
            exit_with(&CliError::io(format!("{e:#}")));
        }
        warn!("Failed to load config, using defaults: {e:#}");
    }

    let ctx = Context {
        config,
        config_path: cli.config,
    };

    let result = match &cli.command {
        Command::Check(args) => args.execute(&ctx),
        Command::Neighbors(args) => args.execute(&ctx),
        Command::Reorder(args) => args.execute(&ctx),
        Command::Intermediate(args) => args.execute(&ctx),
        Command::Config(args) => args.execute(&ctx),
    };

    if let Err(e) = result {
        exit_with(&e);
    }
    std::process::exit(ExitCode::Success.code());
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn exit_with(error: &CliError) -> ! {
    eprintln!("Error: {error}");
    std::process::exit(error.exit_code.code());
}
