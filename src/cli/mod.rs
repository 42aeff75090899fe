//! CLI command handlers for GridLam.
//!
//! This module provides headless, scriptable access to the stacking engine
//! for automation, testing, and CI integration.

pub mod check;
pub mod common;
pub mod config;
pub mod intermediate;
pub mod neighbors;
pub mod reorder;

// Re-export types used by main.rs and tests
pub use check::CheckArgs;
pub use common::{CliError, CliResult, Context, ExitCode};
pub use config::ConfigArgs;
pub use intermediate::IntermediateArgs;
pub use neighbors::NeighborsArgs;
pub use reorder::ReorderArgs;
