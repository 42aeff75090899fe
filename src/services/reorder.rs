//! Neighborhood reordering of per-cell ply sequences.
//!
//! Plies that are connected through the neighbor graph and share an
//! orientation at a given row are grouped into the same output row, on the
//! same side of the stack. Rows are swept in mirrored pairs from the outside
//! in; the centre row(s) are split on their own connectivity.
//!
//! Stacks shorter than the longest one are centred in the row frame, so
//! their mirrored plies land on mirrored rows. When the length difference
//! is odd, one empty row is left at the stack's middle.
//!
//! The sweep runs twice. Pass A pairs every row including the innermost two;
//! pass B leaves the innermost row(s) to the centre split. The final stack
//! takes pass A's pairs for the rows pass B did not claim as centre rows,
//! and pass B's centre.

use crate::constants::angle_key;
use crate::models::{CellId, LabelDefaults, Laminate, Ply};
use crate::services::neighbors::{GraphError, NeighborGraph};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Reordering preconditions that were not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    /// The graph has no links between distinct cells.
    #[error("no neighbors defined")]
    NoNeighbors,
    /// The same cell was supplied twice.
    #[error("cell {0} was supplied more than once")]
    DuplicateCell(CellId),
    /// Duplicated cells are not connected to each other.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A cell together with its private laminate copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellLaminate {
    /// Cell identifier
    pub cell: CellId,
    /// Laminate owned by this cell for the duration of the operation
    pub laminate: Laminate,
}

impl CellLaminate {
    /// Pairs a cell with a laminate.
    pub const fn new(cell: CellId, laminate: Laminate) -> Self {
        Self { cell, laminate }
    }
}

/// Result of [`reorder_by_neighborhood`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderOutcome {
    /// Cells in input order with their reordered laminates
    pub cells: Vec<CellLaminate>,
    /// Longest ply sequence before reordering
    pub rows_before: usize,
    /// Ply count of every reordered sequence
    pub rows_after: usize,
}

/// One synthesized output row: a ply per input cell.
type Row = Vec<Ply>;

/// Output rows produced for one mirrored pair of input rows.
#[derive(Debug, Clone, PartialEq)]
struct PairBlock {
    top: usize,
    bottom: usize,
    front: Vec<Row>,
    back: Vec<Row>,
}

/// Outcome of a single sweep.
#[derive(Debug, Clone, PartialEq)]
struct SweepResult {
    pairs: Vec<PairBlock>,
    centre_rows: Vec<usize>,
    centre: Vec<Row>,
}

/// Reorders every cell's plies by neighborhood and orientation.
///
/// Cells earlier in `cells` win ties when groups are ordered. The input is
/// not modified; the new sequences are returned, renumbered with each
/// laminate's previously detected label schemes.
///
/// # Errors
///
/// Returns [`ReorderError::NoNeighbors`] if no two cells are linked,
/// [`ReorderError::Graph`] if a duplicated cell is disconnected, and
/// [`ReorderError::DuplicateCell`] if a cell appears twice in `cells`.
pub fn reorder_by_neighborhood(
    graph: &NeighborGraph,
    cells: &[CellLaminate],
    defaults: &LabelDefaults,
) -> Result<ReorderOutcome, ReorderError> {
    if !graph.has_edges() {
        return Err(ReorderError::NoNeighbors);
    }
    graph.validate_duplicates()?;

    let mut order: BTreeMap<&CellId, usize> = BTreeMap::new();
    for (idx, entry) in cells.iter().enumerate() {
        if order.insert(&entry.cell, idx).is_some() {
            return Err(ReorderError::DuplicateCell(entry.cell.clone()));
        }
    }

    let rows_before = cells.iter().map(|c| c.laminate.len()).max().unwrap_or(0);
    let sweeper = Sweeper {
        graph,
        cells,
        order,
        passive: cells.iter().map(|c| graph.is_passive(&c.cell)).collect(),
        rows: rows_before,
    };

    debug!(
        "Reordering {} cells ({} passive) over {} rows",
        cells.len(),
        sweeper.passive.iter().filter(|p| **p).count(),
        rows_before
    );

    let paired = sweeper.sweep(rows_before, true);
    let centred = sweeper.sweep(rows_before, false);
    let stack = compose(paired, centred);
    let rows_after = stack.len();

    let cells = cells
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let (sequence, labels) = entry.laminate.label_schemes(defaults);
            let plies = stack.iter().map(|row| row[idx].clone()).collect();
            let mut laminate = entry.laminate.clone();
            laminate.replace_plies(plies, &sequence, &labels);
            CellLaminate::new(entry.cell.clone(), laminate)
        })
        .collect();

    debug!("Reordering produced {} rows per cell", rows_after);
    Ok(ReorderOutcome {
        cells,
        rows_before,
        rows_after,
    })
}

/// Joins pass A and pass B into the final top-to-bottom row list.
///
/// Pass B's centre replaces any of pass A's pairs that touch its centre rows.
fn compose(paired: SweepResult, centred: SweepResult) -> Vec<Row> {
    let claimed: BTreeSet<usize> = centred.centre_rows.iter().copied().collect();
    let pairs: Vec<PairBlock> = paired
        .pairs
        .into_iter()
        .filter(|p| !claimed.contains(&p.top) && !claimed.contains(&p.bottom))
        .collect();

    let mut stack: Vec<Row> = pairs.iter().flat_map(|p| p.front.iter().cloned()).collect();
    stack.extend(centred.centre);
    let mut back: Vec<Row> = pairs.into_iter().flat_map(|p| p.back).collect();
    back.reverse();
    stack.extend(back);
    stack
}

struct Sweeper<'a> {
    graph: &'a NeighborGraph,
    cells: &'a [CellLaminate],
    order: BTreeMap<&'a CellId, usize>,
    passive: Vec<bool>,
    rows: usize,
}

/// Ply of a `len`-ply stack that sits at frame row `row` of a `rows`-row
/// frame, or `None` for padding.
fn frame_ply(len: usize, rows: usize, row: usize) -> Option<usize> {
    let pad = rows.checked_sub(len)?;
    let k = row.checked_sub(pad / 2)?;
    if pad % 2 == 0 {
        return (k < len).then_some(k);
    }
    let split = len.div_ceil(2);
    match k.cmp(&split) {
        std::cmp::Ordering::Less => Some(k),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => (k - 1 < len).then_some(k - 1),
    }
}

impl Sweeper<'_> {
    /// Sweeps `rows` input rows from the outside in.
    ///
    /// With `pair_innermost` false, an even row count leaves its two
    /// innermost rows to the centre split.
    fn sweep(&self, rows: usize, pair_innermost: bool) -> SweepResult {
        let mut pairs = Vec::new();
        let mut centre_rows = Vec::new();

        if rows > 0 {
            let (mut top, mut bottom) = (0, rows - 1);
            while top < bottom {
                if !pair_innermost && bottom - top == 1 {
                    break;
                }
                pairs.push(self.pair_block(top, bottom));
                top += 1;
                bottom -= 1;
            }
            if top == bottom {
                centre_rows.push(top);
            } else if top < bottom {
                centre_rows.extend([top, bottom]);
            }
        }

        // The lower of two centre rows belongs to the back half, so its
        // slots are laid out in mirror order.
        let centre = centre_rows
            .iter()
            .enumerate()
            .flat_map(|(n, row)| {
                let mut split = self.centre_split(*row);
                if n == 1 {
                    split.reverse();
                }
                split
            })
            .collect();

        SweepResult {
            pairs,
            centre_rows,
            centre,
        }
    }

    fn pair_block(&self, top: usize, bottom: usize) -> PairBlock {
        let top_groups = self.groups(top);
        let bottom_groups = self.groups(bottom);
        let mut slots = top_groups.len().max(bottom_groups.len());
        if slots == 0 && (self.passive_oriented(top) || self.passive_oriented(bottom)) {
            slots = 1;
        }

        let front = (0..slots)
            .map(|slot| self.synthesize(top, top_groups.get(slot), slot == 0))
            .collect();
        let back = (0..slots)
            .map(|slot| self.synthesize(bottom, bottom_groups.get(slot), slot == 0))
            .collect();

        PairBlock {
            top,
            bottom,
            front,
            back,
        }
    }

    fn centre_split(&self, row: usize) -> Vec<Row> {
        let groups = self.groups(row);
        if groups.is_empty() {
            if self.passive_oriented(row) {
                return vec![self.synthesize(row, None, true)];
            }
            return Vec::new();
        }
        groups
            .iter()
            .enumerate()
            .map(|(slot, group)| self.synthesize(row, Some(group), slot == 0))
            .collect()
    }

    /// Connected, same-orientation groups of non-passive cells at `row`,
    /// ordered by their smallest cell-order index.
    fn groups(&self, row: usize) -> Vec<Vec<usize>> {
        let scope: BTreeSet<CellId> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                !self.passive[*idx] && self.ply(*idx, row).is_some_and(Ply::has_orientation)
            })
            .map(|(_, entry)| entry.cell.clone())
            .collect();

        let mut groups: Vec<Vec<usize>> = Vec::new();
        for component in self.graph.connected_components(&scope) {
            let mut by_angle: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
            for cell in &component {
                let Some(&idx) = self.order.get(cell) else {
                    continue;
                };
                if let Some(angle) = self.ply(idx, row).and_then(|p| p.orientation) {
                    by_angle.entry(angle_key(angle)).or_default().push(idx);
                }
            }
            for mut group in by_angle.into_values() {
                group.sort_unstable();
                groups.push(group);
            }
        }
        groups.sort_by_key(|group| group.first().copied().unwrap_or(usize::MAX));
        groups
    }

    /// Builds one output row from input `row`: group members keep their ply,
    /// passive cells keep theirs when `with_passive`, everyone else gets an
    /// empty slot.
    fn synthesize(&self, row: usize, group: Option<&Vec<usize>>, with_passive: bool) -> Row {
        (0..self.cells.len())
            .map(|idx| {
                let keep = group.is_some_and(|g| g.contains(&idx))
                    || (with_passive && self.passive[idx]);
                if keep {
                    self.ply(idx, row).cloned().unwrap_or_else(Ply::empty)
                } else {
                    Ply::empty()
                }
            })
            .collect()
    }

    fn passive_oriented(&self, row: usize) -> bool {
        (0..self.cells.len())
            .any(|idx| self.passive[idx] && self.ply(idx, row).is_some_and(Ply::has_orientation))
    }

    fn ply(&self, idx: usize, row: usize) -> Option<&Ply> {
        let plies = &self.cells.get(idx)?.laminate.plies;
        plies.get(frame_ply(plies.len(), self.rows, row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, GridPosition};
    use crate::services::symmetry::is_symmetric;

    fn id(s: &str) -> CellId {
        CellId::parse(s).unwrap()
    }

    fn cell(name: &str, angles: &[Option<f64>]) -> CellLaminate {
        let plies = angles
            .iter()
            .map(|a| Ply::new(if a.is_some() { "CFRP" } else { "" }, *a).unwrap())
            .collect();
        CellLaminate::new(id(name), Laminate::with_plies(format!("L-{name}"), plies).unwrap())
    }

    fn angles(outcome: &ReorderOutcome, idx: usize) -> Vec<Option<f64>> {
        outcome.cells[idx].laminate.orientations()
    }

    fn linked(pairs: &[(&str, &str)]) -> NeighborGraph {
        let mut graph = NeighborGraph::new();
        for (a, b) in pairs {
            graph.link(&id(a), Direction::Right, &id(b)).unwrap();
        }
        graph
    }

    #[test]
    fn test_requires_neighbors() {
        let graph = NeighborGraph::new();
        let cells = vec![cell("C1", &[Some(0.0)])];
        assert_eq!(
            reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()),
            Err(ReorderError::NoNeighbors)
        );
    }

    #[test]
    fn test_rejects_disconnected_duplicates() {
        let mut graph = linked(&[("C1", "C2")]);
        graph.place(GridPosition::new(10, 10), id("C1")).unwrap();
        let cells = vec![cell("C1", &[Some(0.0)]), cell("C2", &[Some(0.0)])];
        assert!(matches!(
            reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()),
            Err(ReorderError::Graph(GraphError::DisconnectedDuplicates { .. }))
        ));
    }

    #[test]
    fn test_rejects_duplicate_cells() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![cell("C1", &[Some(0.0)]), cell("C1", &[Some(0.0)])];
        assert!(matches!(
            reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()),
            Err(ReorderError::DuplicateCell(_))
        ));
    }

    #[test]
    fn test_idempotent_on_uniform_grid() {
        let graph = linked(&[("C1", "C2"), ("C2", "C3")]);
        let stack = [Some(0.0), Some(45.0), Some(90.0), Some(45.0), Some(0.0)];
        let cells: Vec<_> = ["C1", "C2", "C3"].iter().map(|c| cell(c, &stack)).collect();

        let first = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        let second =
            reorder_by_neighborhood(&graph, &first.cells, &LabelDefaults::default()).unwrap();

        assert_eq!(first.cells, second.cells);
        assert_eq!(angles(&first, 0), stack.to_vec());
        assert_eq!(first.cells, cells);
    }

    #[test]
    fn test_splits_connected_cells_by_orientation() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(45.0), Some(0.0), Some(45.0)]),
            cell("C2", &[Some(-45.0), Some(0.0), Some(-45.0)]),
        ];

        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        assert_eq!(outcome.rows_before, 3);
        assert_eq!(outcome.rows_after, 5);
        assert_eq!(
            angles(&outcome, 0),
            vec![Some(45.0), None, Some(0.0), None, Some(45.0)]
        );
        assert_eq!(
            angles(&outcome, 1),
            vec![None, Some(-45.0), Some(0.0), Some(-45.0), None]
        );
    }

    #[test]
    fn test_two_centre_rows_mirror_their_slots() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(45.0), Some(45.0)]),
            cell("C2", &[Some(-45.0), Some(-45.0)]),
            cell("C3", &[Some(0.0), Some(0.0)]),
        ];

        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        // Each centre row splits in two; C3 rides with the first group.
        assert_eq!(angles(&outcome, 0), vec![Some(45.0), None, None, Some(45.0)]);
        assert_eq!(angles(&outcome, 1), vec![None, Some(-45.0), Some(-45.0), None]);
        assert_eq!(angles(&outcome, 2), vec![Some(0.0), None, None, Some(0.0)]);
    }

    #[test]
    fn test_passive_cell_only_in_first_slot_of_outer_pair() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(45.0), Some(0.0), Some(0.0), Some(45.0)]),
            cell("C2", &[Some(-45.0), Some(0.0), Some(0.0), Some(-45.0)]),
            cell("C3", &[Some(90.0), Some(0.0), Some(0.0), Some(90.0)]),
        ];

        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        assert_eq!(outcome.rows_after, 6);

        let passive = angles(&outcome, 2);
        assert_eq!(
            passive,
            vec![Some(90.0), None, Some(0.0), Some(0.0), None, Some(90.0)]
        );
        let (front, back) = passive.split_at(3);
        assert_eq!(front.iter().filter(|a| **a == Some(90.0)).count(), 1);
        assert_eq!(back.iter().filter(|a| **a == Some(90.0)).count(), 1);

        assert_eq!(
            angles(&outcome, 0),
            vec![Some(45.0), None, Some(0.0), Some(0.0), None, Some(45.0)]
        );
        assert_eq!(
            angles(&outcome, 1),
            vec![None, Some(-45.0), Some(0.0), Some(0.0), Some(-45.0), None]
        );
        for entry in &outcome.cells {
            assert!(is_symmetric(&entry.laminate.plies), "cell {}", entry.cell);
        }
    }

    #[test]
    fn test_passive_cell_keeps_outer_pair_alone() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[None, Some(45.0), Some(45.0), None]),
            cell("C2", &[None, Some(45.0), Some(45.0), None]),
            cell("C3", &[Some(0.0), Some(45.0), Some(45.0), Some(0.0)]),
        ];
        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        assert_eq!(
            angles(&outcome, 2),
            vec![Some(0.0), Some(45.0), Some(45.0), Some(0.0)]
        );
        assert_eq!(angles(&outcome, 0), vec![None, Some(45.0), Some(45.0), None]);

        // Nobody oriented in the outer pair: it disappears.
        let cells = vec![
            cell("C1", &[None, Some(45.0), Some(45.0), None]),
            cell("C2", &[None, Some(45.0), Some(45.0), None]),
            cell("C3", &[None, Some(0.0), Some(0.0), None]),
        ];
        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        assert_eq!(outcome.rows_after, 2);
        assert_eq!(angles(&outcome, 2), vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_short_stack_is_centred() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(45.0), Some(0.0), Some(0.0), Some(45.0)]),
            cell("C2", &[Some(45.0), Some(45.0)]),
        ];

        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        assert_eq!(outcome.rows_before, 4);
        assert_eq!(
            angles(&outcome, 0),
            vec![Some(45.0), Some(0.0), None, None, Some(0.0), Some(45.0)]
        );
        assert_eq!(
            angles(&outcome, 1),
            vec![None, None, Some(45.0), Some(45.0), None, None]
        );
        for entry in &outcome.cells {
            assert!(is_symmetric(&entry.laminate.plies), "cell {}", entry.cell);
        }
    }

    #[test]
    fn test_odd_length_difference_keeps_outer_plies_mirrored() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(45.0), Some(0.0), Some(0.0), Some(45.0)]),
            cell("C2", &[Some(30.0), Some(0.0), Some(30.0)]),
        ];

        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        // C2's 30s sit on mirrored rows; its single centre ply faces a gap.
        assert_eq!(
            angles(&outcome, 1),
            vec![None, Some(30.0), Some(0.0), None, Some(30.0), None]
        );
        assert_eq!(
            angles(&outcome, 0),
            vec![Some(45.0), None, Some(0.0), Some(0.0), None, Some(45.0)]
        );
    }

    #[test]
    fn test_frame_ply_mapping() {
        let even: Vec<_> = (0..4).map(|r| frame_ply(2, 4, r)).collect();
        assert_eq!(even, vec![None, Some(0), Some(1), None]);
        let odd: Vec<_> = (0..4).map(|r| frame_ply(3, 4, r)).collect();
        assert_eq!(odd, vec![Some(0), Some(1), None, Some(2)]);
        let odd: Vec<_> = (0..3).map(|r| frame_ply(2, 3, r)).collect();
        assert_eq!(odd, vec![Some(0), None, Some(1)]);
        assert_eq!(frame_ply(5, 4, 0), None);
    }

    #[test]
    fn test_never_fabricates_orientations() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(30.0), Some(0.0), Some(90.0), Some(-30.0)]),
            cell("C2", &[Some(30.0), None, Some(90.0), Some(30.0)]),
        ];
        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();

        for (idx, input) in cells.iter().enumerate() {
            let mut before: Vec<i64> = input
                .laminate
                .orientations()
                .into_iter()
                .flatten()
                .map(angle_key)
                .collect();
            let mut after: Vec<i64> = angles(&outcome, idx)
                .into_iter()
                .flatten()
                .map(angle_key)
                .collect();
            before.sort_unstable();
            after.sort_unstable();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn test_labels_follow_detected_scheme() {
        let graph = linked(&[("C1", "C2")]);
        let mut first = cell("C1", &[Some(45.0), Some(45.0)]);
        for (i, ply) in first.laminate.plies.iter_mut().enumerate() {
            ply.sequence_label = format!("S{}", i + 5);
        }
        let cells = vec![first, cell("C2", &[Some(-45.0), Some(-45.0)])];

        let outcome = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        let plies = &outcome.cells[0].laminate.plies;
        assert_eq!(plies.len(), 4);
        assert_eq!(plies[3].index, 3);
        assert_eq!(plies[0].sequence_label, "S5");
        assert_eq!(plies[3].sequence_label, "S8");
        assert_eq!(plies[3].ply_label, "Ply.4");
    }

    #[test]
    fn test_input_is_not_mutated() {
        let graph = linked(&[("C1", "C2")]);
        let cells = vec![
            cell("C1", &[Some(45.0), Some(0.0), Some(45.0)]),
            cell("C2", &[Some(-45.0), Some(0.0), Some(-45.0)]),
        ];
        let snapshot = cells.clone();
        let _ = reorder_by_neighborhood(&graph, &cells, &LabelDefaults::default()).unwrap();
        assert_eq!(cells, snapshot);
    }
}
