//! Data models for plies, laminates, grid cells and projects.
//!
//! This module contains the core data structures used throughout the crate.
//! Models are independent of the CLI and of file formats.

pub mod cell;
pub mod laminate;
pub mod ply;
pub mod project;

// Re-export all model types
pub use cell::{Cell, CellId, Direction, GridPosition};
pub use laminate::{LabelDefaults, Laminate};
pub use ply::{Ply, PlyKind};
pub use project::Project;
