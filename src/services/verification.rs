//! Bulk project verification.
//!
//! Runs the symmetry and balance evaluators over every laminate and checks
//! the cell assignments and the neighbor graph, collecting everything into
//! one report.

// Allow format! appended to String - more readable for building messages
#![allow(clippy::format_push_string)]

use crate::models::{CellId, Project};
use crate::parser::orientation::format_orientation;
use crate::services::balance::evaluate_balance;
use crate::services::neighbors::GraphError;
use crate::services::symmetry::evaluate_symmetry;
use serde::Serialize;
use std::fmt;

/// Verification result with errors and warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    /// Problems that make the project unfit for release
    pub errors: Vec<VerificationError>,
    /// Non-blocking findings
    pub warnings: Vec<VerificationWarning>,
}

impl VerificationReport {
    /// Creates a new empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true if there are no errors (warnings are allowed).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the report.
    pub fn add_error(&mut self, error: VerificationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the report.
    pub fn add_warning(&mut self, warning: VerificationWarning) {
        self.warnings.push(warning);
    }

    /// Number of errors of `kind`.
    #[must_use]
    pub fn count(&self, kind: VerificationErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Formats the report for the terminal.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut message = String::new();

        if !self.errors.is_empty() {
            message.push_str(&format!("{} verification errors:\n", self.errors.len()));
            for (idx, error) in self.errors.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, error));
            }
        }

        if !self.warnings.is_empty() {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(&format!("{} warnings:\n", self.warnings.len()));
            for (idx, warning) in self.warnings.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, warning));
            }
        }

        message
    }
}

/// Verification error with context.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationError {
    /// Type of error
    pub kind: VerificationErrorKind,
    /// Laminate concerned, if any
    pub laminate: Option<String>,
    /// Cell concerned, if any
    pub cell: Option<CellId>,
    /// Human-readable message
    pub message: String,
}

impl VerificationError {
    /// Creates a new error.
    pub fn new(kind: VerificationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            laminate: None,
            cell: None,
            message: message.into(),
        }
    }

    /// Sets the laminate context.
    #[must_use]
    pub fn with_laminate(mut self, name: impl Into<String>) -> Self {
        self.laminate = Some(name.into());
        self
    }

    /// Sets the cell context.
    #[must_use]
    pub fn with_cell(mut self, cell: CellId) -> Self {
        self.cell = Some(cell);
        self
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.laminate, &self.cell) {
            (Some(laminate), _) => write!(f, "[{}] {}: {}", laminate, self.kind, self.message),
            (None, Some(cell)) => write!(f, "[{}] {}: {}", cell, self.kind, self.message),
            (None, None) => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Types of verification errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationErrorKind {
    /// Structural plies do not mirror
    NotSymmetric,
    /// ±angle counts differ
    Unbalanced,
    /// Ply violates the material/orientation rule
    InvalidPly,
    /// Occurrences of one cell identifier are not connected
    DisconnectedDuplicate,
    /// Cell assigned to a laminate that does not exist
    DanglingReference,
}

impl fmt::Display for VerificationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSymmetric => write!(f, "Not Symmetric"),
            Self::Unbalanced => write!(f, "Unbalanced"),
            Self::InvalidPly => write!(f, "Invalid Ply"),
            Self::DisconnectedDuplicate => write!(f, "Disconnected Duplicate"),
            Self::DanglingReference => write!(f, "Dangling Reference"),
        }
    }
}

/// Types of warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationWarningKind {
    /// Cells not connected to the main block
    DisconnectedBlock,
    /// Cell without any neighbor
    PassiveCell,
    /// Cell without a laminate
    UnassignedCell,
    /// Laminate without structural plies
    EmptyLaminate,
}

/// Verification warning (non-blocking).
#[derive(Debug, Clone, Serialize)]
pub struct VerificationWarning {
    /// Type of warning
    pub kind: VerificationWarningKind,
    /// Warning message
    pub message: String,
}

impl VerificationWarning {
    /// Creates a new warning
    pub fn new(kind: VerificationWarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for VerificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Project verifier.
pub struct ProjectVerifier<'a> {
    project: &'a Project,
}

impl<'a> ProjectVerifier<'a> {
    /// Creates a new verifier.
    #[must_use]
    pub const fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Verifies the project.
    ///
    /// Checks:
    /// - Every laminate is symmetric and balanced
    /// - Every ply with an orientation has a material
    /// - Every cell assignment names an existing laminate
    /// - Duplicated cell identifiers are connected
    ///
    /// Warnings cover disconnected blocks, passive cells, unassigned cells
    /// and laminates without structural plies.
    #[must_use]
    pub fn verify(&self) -> VerificationReport {
        let mut report = VerificationReport::new();
        self.check_laminates(&mut report);
        self.check_assignments(&mut report);
        self.check_graph(&mut report);
        report
    }

    fn check_laminates(&self, report: &mut VerificationReport) {
        for laminate in &self.project.laminates {
            for ply in &laminate.plies {
                if let Some(problem) = ply.validate() {
                    report.add_error(
                        VerificationError::new(VerificationErrorKind::InvalidPly, problem)
                            .with_laminate(&laminate.name),
                    );
                }
            }

            if laminate.structural_count() == 0 {
                report.add_warning(VerificationWarning::new(
                    VerificationWarningKind::EmptyLaminate,
                    format!("Laminate {} has no structural plies", laminate.name),
                ));
                continue;
            }

            let symmetry = evaluate_symmetry(&laminate.plies);
            if !symmetry.is_symmetric {
                let detail = symmetry.first_mismatch.map_or_else(
                    || "no mirrored pair".to_string(),
                    |(a, b)| {
                        format!(
                            "ply {} ({}) does not mirror ply {} ({})",
                            a + 1,
                            format_orientation(laminate.plies[a].orientation),
                            b + 1,
                            format_orientation(laminate.plies[b].orientation)
                        )
                    },
                );
                report.add_error(
                    VerificationError::new(VerificationErrorKind::NotSymmetric, detail)
                        .with_laminate(&laminate.name),
                );
            }

            let balance = evaluate_balance(&laminate.plies);
            if !balance.is_balanced {
                let angles: Vec<String> = balance
                    .unbalanced_angles
                    .iter()
                    .map(|a| format!("\u{b1}{}", format_orientation(Some(*a))))
                    .collect();
                report.add_error(
                    VerificationError::new(
                        VerificationErrorKind::Unbalanced,
                        format!("unpaired angles {}", angles.join(", ")),
                    )
                    .with_laminate(&laminate.name),
                );
            }
        }
    }

    fn check_assignments(&self, report: &mut VerificationReport) {
        for (cell, name) in self.project.dangling_references() {
            report.add_error(
                VerificationError::new(
                    VerificationErrorKind::DanglingReference,
                    format!("laminate '{name}' does not exist"),
                )
                .with_cell(cell.clone()),
            );
        }
        for cell in self.project.unassigned_cells() {
            report.add_warning(VerificationWarning::new(
                VerificationWarningKind::UnassignedCell,
                format!("Cell {cell} has no laminate"),
            ));
        }
    }

    fn check_graph(&self, report: &mut VerificationReport) {
        let graph = &self.project.graph;

        for err in graph.disconnected_duplicates() {
            let cell = match &err {
                GraphError::DisconnectedDuplicates { cell, .. } => Some(cell.clone()),
                _ => None,
            };
            let mut error =
                VerificationError::new(VerificationErrorKind::DisconnectedDuplicate, err.to_string());
            if let Some(cell) = cell {
                error = error.with_cell(cell);
            }
            report.add_error(error);
        }

        for block in graph.disconnected_blocks() {
            let names: Vec<String> = block.iter().map(ToString::to_string).collect();
            report.add_warning(VerificationWarning::new(
                VerificationWarningKind::DisconnectedBlock,
                format!("Cells {} are not connected to the main block", names.join(", ")),
            ));
        }

        if graph.has_edges() {
            for cell in &self.project.cells {
                if graph.is_passive(cell) {
                    report.add_warning(VerificationWarning::new(
                        VerificationWarningKind::PassiveCell,
                        format!("Cell {cell} has no neighbors"),
                    ));
                }
            }
        }
    }
}

/// Verifies a project.
#[must_use]
pub fn verify_project(project: &Project) -> VerificationReport {
    ProjectVerifier::new(project).verify()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, GridPosition, Laminate, Ply};

    fn id(s: &str) -> CellId {
        CellId::parse(s).unwrap()
    }

    fn laminate(name: &str, angles: &[f64]) -> Laminate {
        let plies = angles
            .iter()
            .map(|a| Ply::new("CFRP", Some(*a)).unwrap())
            .collect();
        Laminate::with_plies(name, plies).unwrap()
    }

    fn clean_project() -> Project {
        let mut project = Project::new();
        project
            .add_laminate(laminate("L1", &[45.0, -45.0, 0.0, -45.0, 45.0]))
            .unwrap();
        project.assign(id("C1"), "L1").unwrap();
        project.assign(id("C2"), "L1").unwrap();
        project
            .graph
            .link(&id("C1"), Direction::Right, &id("C2"))
            .unwrap();
        project
    }

    #[test]
    fn test_clean_project_is_valid() {
        let report = verify_project(&clean_project());
        assert!(report.is_valid(), "{}", report.format_message());
        assert!(report.warnings.is_empty());
        assert!(report.format_message().is_empty());
    }

    #[test]
    fn test_laminate_errors() {
        let mut project = clean_project();
        project
            .add_laminate(laminate("L2", &[45.0, 45.0, 0.0, -45.0, 45.0]))
            .unwrap();
        project.add_laminate(laminate("L3", &[45.0, 0.0, 45.0])).unwrap();
        project.laminate_mut("L1").unwrap().plies[2].material.clear();

        let report = verify_project(&project);
        assert!(!report.is_valid());
        assert_eq!(report.count(VerificationErrorKind::NotSymmetric), 1);
        assert_eq!(report.count(VerificationErrorKind::Unbalanced), 2);
        assert_eq!(report.count(VerificationErrorKind::InvalidPly), 1);

        let symmetry = report
            .errors
            .iter()
            .find(|e| e.kind == VerificationErrorKind::NotSymmetric)
            .unwrap();
        assert_eq!(symmetry.laminate.as_deref(), Some("L2"));
        assert!(symmetry.message.contains("ply 2"));
        assert!(report.format_message().contains("[L3] Unbalanced"));
    }

    #[test]
    fn test_graph_and_assignment_findings() {
        let mut project = clean_project();
        project.cells.push(id("C3"));
        project.cell_to_laminate.insert(id("C4"), "Ghost".to_string());
        project.graph.place(GridPosition::new(5, 5), id("C1")).unwrap();
        project
            .graph
            .link(&id("C7"), Direction::Down, &id("C8"))
            .unwrap();

        let report = verify_project(&project);
        assert_eq!(report.count(VerificationErrorKind::DisconnectedDuplicate), 1);
        assert_eq!(report.count(VerificationErrorKind::DanglingReference), 1);

        let kinds: Vec<_> = report.warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&VerificationWarningKind::UnassignedCell));
        assert!(kinds.contains(&VerificationWarningKind::PassiveCell));
        assert!(kinds.contains(&VerificationWarningKind::DisconnectedBlock));
    }

    #[test]
    fn test_empty_laminate_is_a_warning() {
        let mut project = clean_project();
        project.add_laminate(Laminate::new("Blank").unwrap()).unwrap();
        let report = verify_project(&project);
        assert!(report.is_valid());
        assert_eq!(
            report.warnings[0].kind,
            VerificationWarningKind::EmptyLaminate
        );
    }
}
