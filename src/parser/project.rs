//! JSON project document reading and writing.
//!
//! The document carries the neighbor graph twice: as a node list
//! (`cell_neighbor_nodes`, authoritative when present) and as the legacy
//! `cell -> direction -> [cell]` map (`cell_neighbors`). Both are written on
//! save so older readers keep working.

use crate::models::{CellId, LabelDefaults, Laminate, Project};
use crate::services::neighbors::{LegacyNeighbors, NeighborGraph, NodeRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// On-disk shape of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Cells in display order
    #[serde(default)]
    pub cells: Vec<CellId>,
    /// Laminate name per cell
    #[serde(default)]
    pub cell_to_laminate: BTreeMap<CellId, String>,
    /// Laminate definitions
    #[serde(default)]
    pub laminates: Vec<Laminate>,
    /// Grid-position view of the neighbor graph
    #[serde(default)]
    pub cell_neighbor_nodes: Vec<NodeRecord>,
    /// Legacy cell-identifier view of the neighbor graph
    #[serde(default)]
    pub cell_neighbors: LegacyNeighbors,
    /// Last save time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl ProjectDocument {
    /// Converts the document into a project, rebuilding the graph.
    ///
    /// Ply indices and labels are re-synced; laminates without detectable
    /// labels take the schemes from `defaults`.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate laminate names or conflicting nodes.
    pub fn into_project(self, defaults: &LabelDefaults) -> Result<Project> {
        let graph = if self.cell_neighbor_nodes.is_empty() {
            debug!("Rebuilding neighbor graph from legacy mapping");
            NeighborGraph::from_legacy(&self.cell_neighbors)
        } else {
            NeighborGraph::from_nodes(&self.cell_neighbor_nodes)
                .context("Invalid cell_neighbor_nodes")?
        };

        let mut project = Project {
            cells: Vec::with_capacity(self.cells.len()),
            cell_to_laminate: self.cell_to_laminate,
            laminates: Vec::with_capacity(self.laminates.len()),
            graph,
            saved_at: self.saved_at,
        };

        for cell in self.cells {
            if !project.cells.contains(&cell) {
                project.cells.push(cell);
            }
        }
        // Cells only mentioned by the mapping are still cells.
        let mapped: Vec<CellId> = project.cell_to_laminate.keys().cloned().collect();
        for cell in mapped {
            if !project.cells.contains(&cell) {
                project.cells.push(cell);
            }
        }

        for mut laminate in self.laminates {
            laminate.resync(defaults);
            project.add_laminate(laminate)?;
        }
        project.sync_laminate_cells();
        Ok(project)
    }

    /// Captures a project, writing both graph views.
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        Self {
            cells: project.cells.clone(),
            cell_to_laminate: project.cell_to_laminate.clone(),
            laminates: project.laminates.clone(),
            cell_neighbor_nodes: project.graph.to_nodes(),
            cell_neighbors: project.graph.to_legacy(),
            saved_at: project.saved_at,
        }
    }
}

/// Parses a project from JSON text.
///
/// # Errors
///
/// Returns an error for malformed JSON, invalid cell identifiers or
/// orientations, and the conditions listed on
/// [`ProjectDocument::into_project`].
pub fn parse_project_str(content: &str, defaults: &LabelDefaults) -> Result<Project> {
    let document: ProjectDocument =
        serde_json::from_str(content).context("Failed to parse project JSON")?;
    document.into_project(defaults)
}

/// Loads a project file with the default label schemes.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn parse_project(path: &Path) -> Result<Project> {
    parse_project_with(path, &LabelDefaults::default())
}

/// Loads a project file, falling back to `defaults` for unlabeled laminates.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn parse_project_with(path: &Path, defaults: &LabelDefaults) -> Result<Project> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file: {}", path.display()))?;
    parse_project_str(&content, defaults)
        .with_context(|| format!("Failed to parse project file: {}", path.display()))
}

/// Serializes a project as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn project_to_string(project: &Project) -> Result<String> {
    serde_json::to_string_pretty(&ProjectDocument::from_project(project))
        .context("Failed to serialize project")
}

/// Saves a project, stamping `saved_at`.
///
/// Writes to a temporary file first and renames it into place.
///
/// # Errors
///
/// Returns an error on serialization or I/O failure.
pub fn save_project(project: &mut Project, path: &Path) -> Result<()> {
    project.saved_at = Some(Utc::now());
    let content = project_to_string(project)?;
    atomic_write(path, &content)
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    std::fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write to temporary file: {}", temp_path.display()))?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temporary file to: {}", path.display()))?;

    Ok(())
}
