//! Parsing and serialization.
//!
//! This module normalizes orientation text, detects sequence/ply label
//! schemes, and reads and writes the JSON project document.

pub mod labels;
pub mod orientation;
pub mod project;

// Re-export commonly used functions
pub use orientation::normalize_orientation;
pub use project::{parse_project, parse_project_str, parse_project_with, save_project};
