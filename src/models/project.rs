//! Project: cells, their laminates and the neighbor graph.

use crate::models::{CellId, Laminate};
use crate::services::neighbors::NeighborGraph;
use crate::services::reorder::{CellLaminate, ReorderOutcome};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the engine operates on for one part.
///
/// # Validation
///
/// - Laminate names are unique
/// - `cell_to_laminate` values should name existing laminates (dangling
///   references are reported by verification, not rejected on load)
/// - Each laminate's `cells` list mirrors `cell_to_laminate`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    /// Cells in display order
    pub cells: Vec<CellId>,
    /// Laminate assigned to each cell
    pub cell_to_laminate: BTreeMap<CellId, String>,
    /// Laminates in display order
    pub laminates: Vec<Laminate>,
    /// Neighbor graph between cells
    pub graph: NeighborGraph,
    /// Timestamp of the last save, if known
    pub saved_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Creates an empty project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a laminate by name.
    #[must_use]
    pub fn laminate(&self, name: &str) -> Option<&Laminate> {
        self.laminates.iter().find(|l| l.name == name)
    }

    /// Looks up a laminate by name for mutation.
    pub fn laminate_mut(&mut self, name: &str) -> Option<&mut Laminate> {
        self.laminates.iter_mut().find(|l| l.name == name)
    }

    /// Laminate assigned to `cell`.
    #[must_use]
    pub fn laminate_for(&self, cell: &CellId) -> Option<&Laminate> {
        self.cell_to_laminate
            .get(cell)
            .and_then(|name| self.laminate(name))
    }

    /// Adds a laminate.
    ///
    /// # Errors
    ///
    /// Returns an error if a laminate with the same name already exists.
    pub fn add_laminate(&mut self, laminate: Laminate) -> Result<()> {
        if self.laminate(&laminate.name).is_some() {
            anyhow::bail!("Laminate '{}' already exists", laminate.name);
        }
        self.laminates.push(laminate);
        Ok(())
    }

    /// Assigns `cell` to the laminate `name`, registering the cell if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no laminate is called `name`.
    pub fn assign(&mut self, cell: CellId, name: &str) -> Result<()> {
        if self.laminate(name).is_none() {
            anyhow::bail!("Laminate '{name}' not found");
        }
        if !self.cells.contains(&cell) {
            self.cells.push(cell.clone());
        }
        self.cell_to_laminate.insert(cell, name.to_string());
        self.sync_laminate_cells();
        Ok(())
    }

    /// Cells without a laminate.
    #[must_use]
    pub fn unassigned_cells(&self) -> Vec<&CellId> {
        self.cells
            .iter()
            .filter(|c| !self.cell_to_laminate.contains_key(*c))
            .collect()
    }

    /// Cell assignments naming a laminate that does not exist.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<(&CellId, &str)> {
        self.cell_to_laminate
            .iter()
            .filter(|(_, name)| self.laminate(name).is_none())
            .map(|(cell, name)| (cell, name.as_str()))
            .collect()
    }

    /// Private laminate copy for every assigned cell, in cell order.
    ///
    /// Editing a copy never touches a laminate shared with other cells.
    #[must_use]
    pub fn cell_laminates(&self) -> Vec<CellLaminate> {
        self.cells
            .iter()
            .filter_map(|cell| {
                self.laminate_for(cell)
                    .map(|laminate| CellLaminate::new(cell.clone(), laminate.clone()))
            })
            .collect()
    }

    /// Writes reordered sequences back into the project.
    ///
    /// The first cell of each laminate (in cell order) writes the shared
    /// laminate. Other cells whose sequence diverges get their own laminate,
    /// named `"<laminate>-<cell>"`. Returns the names of laminates created.
    pub fn apply_reorder(&mut self, outcome: &ReorderOutcome) -> Vec<String> {
        let mut written: BTreeSet<String> = BTreeSet::new();
        let mut created = Vec::new();

        for entry in &outcome.cells {
            let Some(name) = self.cell_to_laminate.get(&entry.cell).cloned() else {
                continue;
            };
            let Some(shared) = self.laminate_mut(&name) else {
                continue;
            };

            if written.insert(name.clone()) {
                shared.plies.clone_from(&entry.laminate.plies);
                continue;
            }
            if shared.plies == entry.laminate.plies {
                continue;
            }

            let mut split = shared.clone();
            split.name = self.unique_name(&format!("{name}-{}", entry.cell));
            split.plies.clone_from(&entry.laminate.plies);
            self.cell_to_laminate
                .insert(entry.cell.clone(), split.name.clone());
            written.insert(split.name.clone());
            created.push(split.name.clone());
            self.laminates.push(split);
        }

        self.sync_laminate_cells();
        created
    }

    /// Rebuilds every laminate's `cells` list from `cell_to_laminate`.
    pub fn sync_laminate_cells(&mut self) {
        for laminate in &mut self.laminates {
            laminate.cells = self
                .cells
                .iter()
                .filter(|c| self.cell_to_laminate.get(*c) == Some(&laminate.name))
                .cloned()
                .collect();
        }
    }

    fn unique_name(&self, base: &str) -> String {
        if self.laminate(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}.{n}"))
            .find(|candidate| self.laminate(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabelDefaults, Ply};

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

    fn project() -> Project {
        let mut project = Project::new();
        project.add_laminate(laminate("L1", &[45.0, 0.0, 45.0])).unwrap();
        project.add_laminate(laminate("L2", &[0.0])).unwrap();
        project.assign(id("C1"), "L1").unwrap();
        project.assign(id("C2"), "L1").unwrap();
        project.cells.push(id("C3"));
        project
    }

    #[test]
    fn test_assign_and_lookup() {
        let mut project = project();
        assert_eq!(project.laminate_for(&id("C1")).unwrap().name, "L1");
        assert_eq!(project.laminate("L1").unwrap().cells, vec![id("C1"), id("C2")]);
        assert_eq!(project.unassigned_cells(), vec![&id("C3")]);
        assert!(project.assign(id("C3"), "missing").is_err());
        assert!(project.add_laminate(laminate("L1", &[])).is_err());
    }

    #[test]
    fn test_dangling_references() {
        let mut project = project();
        project.cell_to_laminate.insert(id("C9"), "Ghost".to_string());
        assert_eq!(project.dangling_references(), vec![(&id("C9"), "Ghost")]);
    }

    #[test]
    fn test_cell_laminates_are_private_copies() {
        let project = project();
        let mut copies = project.cell_laminates();
        assert_eq!(copies.len(), 2);
        copies[0].laminate.plies.clear();
        assert_eq!(project.laminate("L1").unwrap().len(), 3);
    }

    #[test]
    fn test_apply_reorder_splits_diverging_cells() {
        let mut project = project();
        let mut cells = project.cell_laminates();
        let (seq, ply) = cells[1].laminate.label_schemes(&LabelDefaults::default());
        cells[1]
            .laminate
            .replace_plies(vec![Ply::new("CFRP", Some(90.0)).unwrap()], &seq, &ply);
        let outcome = ReorderOutcome {
            cells,
            rows_before: 3,
            rows_after: 3,
        };

        let created = project.apply_reorder(&outcome);
        assert_eq!(created, vec!["L1-C2"]);
        assert_eq!(project.cell_to_laminate[&id("C2")], "L1-C2");
        assert_eq!(project.laminate("L1").unwrap().cells, vec![id("C1")]);
        assert_eq!(project.laminate("L1-C2").unwrap().cells, vec![id("C2")]);
        assert_eq!(project.laminate("L1-C2").unwrap().len(), 1);
    }
}
