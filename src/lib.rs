//! GridLam Library
//!
//! This library provides the stacking-integrity engine behind the `gridlam`
//! CLI: laminate and ply models, the cell neighbor graph, symmetry and
//! balance evaluation, neighborhood reordering and intermediate laminate
//! synthesis.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod models;
pub mod natural_sort;
pub mod parser;
pub mod services;
