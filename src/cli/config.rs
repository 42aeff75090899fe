//! Configuration management CLI commands.

use crate::cli::common::{print_json, CliError, CliResult, Context};
use crate::config::Config;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display the effective configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
    /// Print the config file location
    Path,
}

/// Display the effective configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Fallback sequence label prefix
    #[arg(long, value_name = "PREFIX")]
    sequence_prefix: Option<String>,

    /// Fallback ply label prefix
    #[arg(long, value_name = "PREFIX")]
    ply_prefix: Option<String>,

    /// Label separator ("." or "")
    #[arg(long, value_name = "SEP")]
    separator: Option<String>,

    /// First label number
    #[arg(long, value_name = "N")]
    start: Option<usize>,

    /// Default for intermediate searches beyond ±45° pairs
    #[arg(long, value_name = "BOOL")]
    allow_non_45: Option<bool>,

    /// Default log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(ctx),
            ConfigCommand::Set(args) => args.execute(ctx),
            ConfigCommand::Path => {
                println!("{}", config_path(ctx)?.display());
                Ok(())
            }
        }
    }
}

fn config_path(ctx: &Context) -> CliResult<PathBuf> {
    match &ctx.config_path {
        Some(path) => Ok(path.clone()),
        None => Config::config_file_path()
            .map_err(|e| CliError::io(format!("Failed to locate configuration: {e}"))),
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        if self.json {
            return print_json(&ctx.config);
        }
        let toml = toml::to_string_pretty(&ctx.config)
            .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
        print!("{toml}");
        Ok(())
    }
}

impl ConfigSetArgs {
    /// Execute set command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        if self.sequence_prefix.is_none()
            && self.ply_prefix.is_none()
            && self.separator.is_none()
            && self.start.is_none()
            && self.allow_non_45.is_none()
            && self.log_level.is_none()
        {
            return Err(CliError::invalid_input(
                "At least one configuration option must be specified",
            ));
        }

        let mut config = ctx.config.clone();
        if let Some(prefix) = &self.sequence_prefix {
            config.labels.sequence_prefix.clone_from(prefix);
        }
        if let Some(prefix) = &self.ply_prefix {
            config.labels.ply_prefix.clone_from(prefix);
        }
        if let Some(separator) = &self.separator {
            config.labels.separator.clone_from(separator);
        }
        if let Some(start) = self.start {
            config.labels.start = start;
        }
        if let Some(allow) = self.allow_non_45 {
            config.search.allow_non_45 = allow;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.to_lowercase();
        }

        config
            .validate()
            .map_err(|e| CliError::invalid_input(e.to_string()))?;

        let path = config_path(ctx)?;
        config
            .save_to(&path)
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");
        Ok(())
    }
}
