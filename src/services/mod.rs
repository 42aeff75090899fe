//! Service layer for laminate analysis and editing.
//!
//! Evaluators (symmetry, balance, checks, verification) are pure functions
//! over models. Graph, reorder and intermediate services carry the stacking
//! algorithms, and `projects` coordinates file I/O.

pub mod balance;
pub mod checks;
pub mod intermediate;
pub mod neighbors;
pub mod projects;
pub mod reorder;
pub mod symmetry;
pub mod verification;

// Re-export commonly used types and functions
pub use balance::{evaluate_balance, is_balanced, BalanceEvaluation};
pub use checks::{classify_aml, run_all_checks, AmlType, ChecksReport};
pub use intermediate::{build_intermediate_laminate, IntermediateError, IntermediateLaminate};
pub use neighbors::{GraphError, NeighborGraph};
pub use projects::ProjectService;
pub use reorder::{reorder_by_neighborhood, CellLaminate, ReorderError, ReorderOutcome};
pub use symmetry::{evaluate_symmetry, is_symmetric, SymmetryEvaluation};
pub use verification::{verify_project, VerificationReport};
