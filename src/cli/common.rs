//! Shared CLI plumbing: error type, exit codes and output helpers.

use crate::config::Config;
use crate::models::Project;
use crate::services::ProjectService;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Process exit codes used by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed and every check passed
    Success = 0,
    /// Command ran but the project failed a check
    ValidationFailed = 1,
    /// File could not be read, parsed or written
    IoError = 2,
    /// Arguments were rejected
    InvalidInput = 3,
}

impl ExitCode {
    /// Numeric process status.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by CLI handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Exit code to terminate with
    pub exit_code: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// I/O or parse failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// A check failed.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::ValidationFailed,
            message: message.into(),
        }
    }

    /// Bad arguments.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::InvalidInput,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI handlers.
pub type CliResult<T> = Result<T, CliError>;

/// Options shared by every subcommand, resolved once in `main`.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Effective configuration
    pub config: Config,
    /// Explicit config file location (`--config`)
    pub config_path: Option<PathBuf>,
}

/// Loads a project with the configured label defaults, mapping failures to
/// [`ExitCode::IoError`].
pub fn load_project(path: &Path, ctx: &Context) -> CliResult<Project> {
    ProjectService::load_with(path, &ctx.config.label_defaults())
        .map_err(|e| CliError::io(format!("{e:#}")))
}

/// Saves a project, mapping failures to [`ExitCode::IoError`].
pub fn save_project(project: &mut Project, path: &Path) -> CliResult<()> {
    ProjectService::save(project, path).map_err(|e| CliError::io(format!("{e:#}")))
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(CliError::validation("x").exit_code.code(), 1);
        assert_eq!(CliError::io("x").exit_code.code(), 2);
        assert_eq!(CliError::invalid_input("x").exit_code.code(), 3);
        assert_eq!(CliError::io("boom").to_string(), "boom");
    }
}
