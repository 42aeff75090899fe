//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{CONFIG_DIR_NAME, DEFAULT_PLY_PREFIX, DEFAULT_SEQUENCE_PREFIX};
use crate::models::LabelDefaults;
use crate::parser::labels::LabelScheme;

/// Log levels accepted in `[logging]`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Fallback label scheme for laminates without detectable labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Prefix for sequence labels (e.g., "Seq")
    pub sequence_prefix: String,
    /// Prefix for ply labels (e.g., "Ply")
    pub ply_prefix: String,
    /// Separator between prefix and number, "." or empty
    pub separator: String,
    /// Number given to the first ply
    pub start: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            sequence_prefix: DEFAULT_SEQUENCE_PREFIX.to_string(),
            ply_prefix: DEFAULT_PLY_PREFIX.to_string(),
            separator: ".".to_string(),
            start: 1,
        }
    }
}

/// Intermediate-laminate search defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Allow removing non-±45° plies when no ±45° combination exists
    pub allow_non_45: bool,
}

/// Logging preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither `RUST_LOG` nor `-v` is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/GridLam/config.toml`
/// - macOS: `~/Library/Application Support/GridLam/config.toml`
/// - Windows: `%APPDATA%\GridLam\config.toml`
///
/// # Validation
///
/// - Label prefixes must be non-empty and start with a letter
/// - `separator` is at most one character
/// - `start` is at least 1
/// - `logging.level` is one of trace, debug, info, warn, error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Label fallbacks
    pub labels: LabelConfig,
    /// Search defaults
    pub search: SearchConfig,
    /// Logging preferences
    pub logging: LoggingConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to `path` using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, content).with_context(|| {
            format!("Failed to write temp config file: {}", temp_path.display())
        })?;

        fs::rename(&temp_path, path).with_context(|| {
            format!("Failed to rename temp config file to: {}", path.display())
        })?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        for (key, prefix) in [
            ("sequence_prefix", &self.labels.sequence_prefix),
            ("ply_prefix", &self.labels.ply_prefix),
        ] {
            if !prefix.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                anyhow::bail!("labels.{key} must start with a letter, got '{prefix}'");
            }
        }
        if self.labels.separator.chars().count() > 1 {
            anyhow::bail!(
                "labels.separator must be at most one character, got '{}'",
                self.labels.separator
            );
        }
        if self.labels.start == 0 {
            anyhow::bail!("labels.start must be at least 1");
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }
        Ok(())
    }

    /// Label schemes used when a laminate has no detectable labels.
    #[must_use]
    pub fn label_defaults(&self) -> LabelDefaults {
        let labels = &self.labels;
        LabelDefaults {
            sequence: LabelScheme::new(&labels.sequence_prefix, &labels.separator, labels.start),
            ply: LabelScheme::new(&labels.ply_prefix, &labels.separator, labels.start),
        }
    }
}
