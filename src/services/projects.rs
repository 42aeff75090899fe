//! Project file I/O service.
//!
//! Centralizes loading and saving project documents, and the workflows that
//! read a project, change it and write it back.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::models::{LabelDefaults, Project};
use crate::parser;
use crate::services::reorder::{reorder_by_neighborhood, ReorderOutcome};

/// Service for project file operations.
pub struct ProjectService;

impl ProjectService {
    /// Loads a project from a JSON file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use gridlam::services::ProjectService;
    ///
    /// let project = ProjectService::load(Path::new("wing.json"))?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &Path) -> Result<Project> {
        Self::load_with(path, &LabelDefaults::default())
    }

    /// Loads a project, labeling unlabeled laminates with `defaults`.
    pub fn load_with(path: &Path, defaults: &LabelDefaults) -> Result<Project> {
        parser::parse_project_with(path, defaults)
            .with_context(|| format!("Failed to load project from {}", path.display()))
    }

    /// Saves a project to a JSON file.
    ///
    /// This performs an atomic write using a temp file + rename pattern and
    /// stamps the project's `saved_at`.
    pub fn save(project: &mut Project, path: &Path) -> Result<()> {
        parser::save_project(project, path)
            .with_context(|| format!("Failed to save project to {}", path.display()))
    }

    /// Reorders every assigned cell by neighborhood and writes the result back
    /// into `project`.
    ///
    /// Returns the reorder outcome and the names of laminates created for
    /// cells whose sequence diverged from a shared laminate.
    pub fn reorder(
        project: &mut Project,
        defaults: &LabelDefaults,
    ) -> Result<(ReorderOutcome, Vec<String>)> {
        let cells = project.cell_laminates();
        let outcome = reorder_by_neighborhood(&project.graph, &cells, defaults)
            .context("Failed to reorder laminates")?;
        let created = project.apply_reorder(&outcome);
        info!(
            cells = outcome.cells.len(),
            rows_before = outcome.rows_before,
            rows_after = outcome.rows_after,
            created = created.len(),
            "Reordered project"
        );
        Ok((outcome, created))
    }
}
