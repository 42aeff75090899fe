//! Directional neighbor graph between grid cells.
//!
//! The grid-position graph (placed nodes plus drawn connections) is the only
//! stored state. The cell-identifier relation used by the evaluators is an
//! index derived from it and rebuilt after every mutation, so the two views
//! cannot drift apart. Several positions may carry the same identifier; they
//! collapse to a single node in the derived relation.

use crate::models::{CellId, Direction, GridPosition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

/// Named neighbor-graph failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Occurrences of one identifier that cannot reach each other.
    #[error(
        "cell {cell} appears at positions not connected to {first}: {}",
        format_positions(.unreachable)
    )]
    DisconnectedDuplicates {
        /// Duplicated identifier
        cell: CellId,
        /// First occurrence, where the search started
        first: GridPosition,
        /// Occurrences that could not be reached
        unreachable: Vec<GridPosition>,
    },
    /// Every candidate slot next to the source cell is taken.
    #[error("no free grid position {direction} of {cell}")]
    NoFreePosition {
        /// Cell that could not be extended
        cell: CellId,
        /// Requested direction
        direction: Direction,
    },
    /// The cell is not placed on the grid.
    #[error("cell {0} is not on the grid")]
    UnknownCell(CellId),
    /// Two different identifiers claim one grid position.
    #[error("grid position {position} already holds {existing}")]
    PositionOccupied {
        /// Contested position
        position: GridPosition,
        /// Identifier already placed there
        existing: CellId,
    },
}

fn format_positions(positions: &[GridPosition]) -> String {
    positions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Neighbor entry of a serialized node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRef {
    /// Position of the neighbor node
    pub grid_position: GridPosition,
    /// Identifier at that position
    pub cell_id: CellId,
}

/// Serialized grid node with its per-direction neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Identifier at this position
    pub cell_id: CellId,
    /// Grid position of the node
    pub grid_position: GridPosition,
    /// Connected neighbor per direction
    #[serde(default)]
    pub neighbors: BTreeMap<Direction, NeighborRef>,
}

/// Legacy `cell -> direction -> [cell, ...]` mapping.
pub type LegacyNeighbors = BTreeMap<CellId, BTreeMap<Direction, Vec<CellId>>>;

type CellIndex = BTreeMap<CellId, BTreeMap<Direction, BTreeSet<CellId>>>;

/// Grid-position graph with a derived cell-identifier index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborGraph {
    nodes: BTreeMap<GridPosition, CellId>,
    edges: BTreeSet<(GridPosition, GridPosition)>,
    index: CellIndex,
}

const fn edge_key(a: GridPosition, b: GridPosition) -> (GridPosition, GridPosition) {
    if a.x < b.x || (a.x == b.x && a.y <= b.y) {
        (a, b)
    } else {
        (b, a)
    }
}

impl NeighborGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- grid-position level ---

    /// Places `cell` at `position`.
    ///
    /// Placing the same identifier twice at one position is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PositionOccupied`] if another identifier is there.
    pub fn place(&mut self, position: GridPosition, cell: CellId) -> Result<(), GraphError> {
        if let Some(existing) = self.nodes.get(&position) {
            if *existing == cell {
                return Ok(());
            }
            return Err(GraphError::PositionOccupied {
                position,
                existing: existing.clone(),
            });
        }
        self.nodes.insert(position, cell);
        self.rebuild_index();
        Ok(())
    }

    /// Removes the node at `position` and every connection touching it.
    pub fn remove_node(&mut self, position: GridPosition) -> Option<CellId> {
        let removed = self.nodes.remove(&position)?;
        self.edges.retain(|(a, b)| *a != position && *b != position);
        self.rebuild_index();
        Some(removed)
    }

    /// Connects two placed, orthogonally adjacent positions.
    ///
    /// Returns false without creating anything when either position is empty
    /// or the Manhattan distance is not 1.
    pub fn connect(&mut self, a: GridPosition, b: GridPosition) -> bool {
        if !a.is_adjacent(b) || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return false;
        }
        self.edges.insert(edge_key(a, b));
        self.rebuild_index();
        true
    }

    /// Removes the connection between two positions.
    pub fn disconnect(&mut self, a: GridPosition, b: GridPosition) -> bool {
        let removed = self.edges.remove(&edge_key(a, b));
        if removed {
            self.rebuild_index();
        }
        removed
    }

    /// Identifier placed at `position`.
    #[must_use]
    pub fn cell_at(&self, position: GridPosition) -> Option<&CellId> {
        self.nodes.get(&position)
    }

    /// Every grid position holding `cell`, in position order.
    #[must_use]
    pub fn positions_of(&self, cell: &CellId) -> Vec<GridPosition> {
        self.nodes
            .iter()
            .filter(|(_, id)| *id == cell)
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Number of placed grid nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of drawn connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.edges.len()
    }

    // --- cell-identifier level ---

    /// Links `src` to `dst` in `direction`, adding the inverse edge as well.
    ///
    /// An existing adjacent pair is reused. Otherwise `dst` is placed in the
    /// free slot next to an occurrence of `src` (or `src` next to `dst` when
    /// only `dst` is on the grid). Linking twice changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoFreePosition`] when no slot in `direction` is
    /// free.
    pub fn link(&mut self, src: &CellId, direction: Direction, dst: &CellId) -> Result<(), GraphError> {
        let src_positions = self.positions_of(src);

        let steps: Vec<(GridPosition, GridPosition)> = src_positions
            .iter()
            .filter_map(|pos| Some((*pos, pos.step(direction)?)))
            .collect();

        for (pos, target) in &steps {
            let (pos, target) = (*pos, *target);
            if self.nodes.get(&target) == Some(dst) {
                self.edges.insert(edge_key(pos, target));
                self.rebuild_index();
                return Ok(());
            }
        }

        for (pos, target) in &steps {
            let (pos, target) = (*pos, *target);
            if !self.nodes.contains_key(&target) {
                self.nodes.insert(target, dst.clone());
                self.edges.insert(edge_key(pos, target));
                self.rebuild_index();
                debug!("Placed {} at {} ({} of {})", dst, target, direction, src);
                return Ok(());
            }
        }

        if src_positions.is_empty() {
            let dst_positions = self.positions_of(dst);
            if dst_positions.is_empty() {
                let placement = self
                    .fresh_origin()
                    .and_then(|origin| Some((origin, origin.step(direction)?)));
                if let Some((origin, target)) = placement {
                    self.nodes.insert(origin, src.clone());
                    self.nodes.insert(target, dst.clone());
                    self.edges.insert(edge_key(origin, target));
                    self.rebuild_index();
                    return Ok(());
                }
            }
            for pos in dst_positions {
                let Some(source) = pos.step(direction.opposite()) else {
                    continue;
                };
                if !self.nodes.contains_key(&source) {
                    self.nodes.insert(source, src.clone());
                    self.edges.insert(edge_key(source, pos));
                    self.rebuild_index();
                    return Ok(());
                }
            }
        }

        Err(GraphError::NoFreePosition {
            cell: src.clone(),
            direction,
        })
    }

    /// Removes every connection from `src` to `dst` in `direction` (and so
    /// its inverse). Returns false when nothing was linked.
    pub fn unlink(&mut self, src: &CellId, direction: Direction, dst: &CellId) -> bool {
        let doomed: Vec<_> = self
            .nodes
            .iter()
            .filter(|(_, id)| *id == src)
            .filter_map(|(pos, _)| Some((*pos, pos.step(direction)?)))
            .filter(|(_, target)| self.nodes.get(target) == Some(dst))
            .map(|(a, b)| edge_key(a, b))
            .collect();

        let mut removed = false;
        for edge in doomed {
            removed |= self.edges.remove(&edge);
        }
        if removed {
            self.rebuild_index();
        }
        removed
    }

    /// Returns true when `cell` has at least one grid position.
    #[must_use]
    pub fn contains(&self, cell: &CellId) -> bool {
        self.index.contains_key(cell)
    }

    /// Placed cell identifiers in numeric order.
    pub fn cells(&self) -> impl Iterator<Item = &CellId> {
        self.index.keys()
    }

    /// Neighbors of `cell` in `direction`.
    pub fn neighbors(&self, cell: &CellId, direction: Direction) -> impl Iterator<Item = &CellId> {
        self.index
            .get(cell)
            .and_then(|dirs| dirs.get(&direction))
            .into_iter()
            .flatten()
    }

    /// Neighbors of `cell` in any direction.
    #[must_use]
    pub fn all_neighbors(&self, cell: &CellId) -> BTreeSet<&CellId> {
        self.index
            .get(cell)
            .map(|dirs| dirs.values().flatten().collect())
            .unwrap_or_default()
    }

    /// Returns true when `src` reaches `dst` through `direction`.
    #[must_use]
    pub fn has_link(&self, src: &CellId, direction: Direction, dst: &CellId) -> bool {
        self.neighbors(src, direction).any(|n| n == dst)
    }

    /// A passive cell has no neighbors at all (unplaced cells are passive).
    #[must_use]
    pub fn is_passive(&self, cell: &CellId) -> bool {
        self.index
            .get(cell)
            .is_none_or(|dirs| dirs.values().all(BTreeSet::is_empty))
    }

    /// Returns true when at least one pair of distinct cells is linked.
    #[must_use]
    pub fn has_edges(&self) -> bool {
        self.index
            .values()
            .any(|dirs| dirs.values().any(|set| !set.is_empty()))
    }

    /// Breadth-first components of the cell relation restricted to `scope`.
    ///
    /// Each component is sorted; components are ordered by their smallest
    /// member. Scope cells that are not on the grid form singletons.
    #[must_use]
    pub fn connected_components(&self, scope: &BTreeSet<CellId>) -> Vec<Vec<CellId>> {
        let mut seen: BTreeSet<&CellId> = BTreeSet::new();
        let mut components = Vec::new();

        for start in scope {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start.clone()];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for next in self.all_neighbors(current) {
                    if scope.contains(next) && seen.insert(next) {
                        component.push(next.clone());
                        queue.push_back(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// Checks that every duplicated identifier forms one connected group of
    /// grid positions.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError::DisconnectedDuplicates`] found.
    pub fn validate_duplicates(&self) -> Result<(), GraphError> {
        match self.disconnected_duplicates().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every disconnected duplicate, one error per identifier.
    #[must_use]
    pub fn disconnected_duplicates(&self) -> Vec<GraphError> {
        let mut occurrences: BTreeMap<&CellId, Vec<GridPosition>> = BTreeMap::new();
        for (pos, cell) in &self.nodes {
            occurrences.entry(cell).or_default().push(*pos);
        }

        let adjacency = self.position_adjacency();
        let mut errors = Vec::new();
        for (cell, positions) in occurrences {
            let [first, rest @ ..] = positions.as_slice() else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let reached = Self::reachable_from(&adjacency, *first);
            let unreachable: Vec<_> = rest.iter().filter(|p| !reached.contains(p)).copied().collect();
            if !unreachable.is_empty() {
                errors.push(GraphError::DisconnectedDuplicates {
                    cell: cell.clone(),
                    first: *first,
                    unreachable,
                });
            }
        }
        errors
    }

    /// Cell components other than the largest one.
    ///
    /// Returns nothing when the placed cells form a single component. Ties
    /// for largest keep the component with the smallest identifier.
    #[must_use]
    pub fn disconnected_blocks(&self) -> Vec<Vec<CellId>> {
        let scope: BTreeSet<CellId> = self.index.keys().cloned().collect();
        let mut components = self.connected_components(&scope);
        if components.len() <= 1 {
            return Vec::new();
        }
        let mut largest = 0;
        for (i, component) in components.iter().enumerate() {
            if component.len() > components[largest].len() {
                largest = i;
            }
        }
        components.remove(largest);
        components
    }

    /// Deletes every node whose identifier belongs to one of `blocks`.
    ///
    /// Returns the number of grid nodes removed.
    pub fn remove_blocks(&mut self, blocks: &[Vec<CellId>]) -> usize {
        let doomed: BTreeSet<&CellId> = blocks.iter().flatten().collect();
        let before = self.nodes.len();
        self.nodes.retain(|_, cell| !doomed.contains(cell));
        let nodes = &self.nodes;
        self.edges
            .retain(|(a, b)| nodes.contains_key(a) && nodes.contains_key(b));
        self.rebuild_index();
        before - self.nodes.len()
    }

    // --- serialized views ---

    /// Rebuilds the graph from serialized nodes.
    ///
    /// Neighbor entries that point at non-adjacent positions are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PositionOccupied`] when two records disagree
    /// about the identifier at one position.
    pub fn from_nodes(records: &[NodeRecord]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for record in records {
            graph.insert_node(record.grid_position, &record.cell_id)?;
        }
        for record in records {
            for neighbor in record.neighbors.values() {
                graph.insert_node(neighbor.grid_position, &neighbor.cell_id)?;
                if record.grid_position.is_adjacent(neighbor.grid_position) {
                    graph
                        .edges
                        .insert(edge_key(record.grid_position, neighbor.grid_position));
                }
            }
        }
        graph.rebuild_index();
        debug!(
            "Rebuilt neighbor graph from {} nodes ({} connections)",
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    /// Serializes the grid-position view.
    #[must_use]
    pub fn to_nodes(&self) -> Vec<NodeRecord> {
        let adjacency = self.position_adjacency();
        self.nodes
            .iter()
            .map(|(pos, cell)| {
                let neighbors = adjacency
                    .get(pos)
                    .into_iter()
                    .flatten()
                    .filter_map(|other| {
                        let direction = pos.direction_to(*other)?;
                        let cell_id = self.nodes.get(other)?.clone();
                        Some((
                            direction,
                            NeighborRef {
                                grid_position: *other,
                                cell_id,
                            },
                        ))
                    })
                    .collect();
                NodeRecord {
                    cell_id: cell.clone(),
                    grid_position: *pos,
                    neighbors,
                }
            })
            .collect()
    }

    /// Rebuilds the graph from the legacy cell mapping.
    ///
    /// Cells are laid out breadth-first from the smallest identifier at the
    /// origin; cells unreachable from earlier ones start a new island to the
    /// right. A link whose target slot is taken, or whose target already
    /// sits elsewhere, is dropped with a warning.
    #[must_use]
    pub fn from_legacy(map: &LegacyNeighbors) -> Self {
        let mut graph = Self::new();
        let mut all_cells: BTreeSet<&CellId> = map.keys().collect();
        for dirs in map.values() {
            all_cells.extend(dirs.values().flatten());
        }

        let mut placed: BTreeMap<&CellId, GridPosition> = BTreeMap::new();
        for start in all_cells {
            if placed.contains_key(start) {
                continue;
            }
            let Some(origin) = graph.fresh_origin() else {
                warn!("Dropping legacy cell {}: no free grid column", start);
                continue;
            };
            graph.nodes.insert(origin, start.clone());
            placed.insert(start, origin);

            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                let Some(&pos) = placed.get(current) else {
                    continue;
                };
                let Some(dirs) = map.get(current) else {
                    continue;
                };
                for (direction, targets) in dirs {
                    let Some(slot) = pos.step(*direction) else {
                        warn!("Dropping legacy links {} {}: off the grid", current, direction);
                        continue;
                    };
                    for target in targets.iter().filter(|t| *t != current) {
                        if let Some(&existing) = placed.get(target) {
                            if existing == slot {
                                graph.edges.insert(edge_key(pos, slot));
                            } else {
                                warn!(
                                    "Dropping legacy link {} {} {}: {} is already at {}",
                                    current, direction, target, target, existing
                                );
                            }
                            continue;
                        }
                        if graph.nodes.contains_key(&slot) {
                            warn!(
                                "Dropping legacy link {} {} {}: slot {} is taken",
                                current, direction, target, slot
                            );
                            continue;
                        }
                        graph.nodes.insert(slot, target.clone());
                        graph.edges.insert(edge_key(pos, slot));
                        placed.insert(target, slot);
                        queue.push_back(target);
                    }
                }
            }
        }
        graph.rebuild_index();
        graph
    }

    /// Serializes the cell-identifier view.
    #[must_use]
    pub fn to_legacy(&self) -> LegacyNeighbors {
        self.index
            .iter()
            .map(|(cell, dirs)| {
                let dirs = dirs
                    .iter()
                    .filter(|(_, set)| !set.is_empty())
                    .map(|(d, set)| (*d, set.iter().cloned().collect()))
                    .collect();
                (cell.clone(), dirs)
            })
            .collect()
    }

    // --- internals ---

    fn insert_node(&mut self, position: GridPosition, cell: &CellId) -> Result<(), GraphError> {
        match self.nodes.get(&position) {
            Some(existing) if existing == cell => Ok(()),
            Some(existing) => Err(GraphError::PositionOccupied {
                position,
                existing: existing.clone(),
            }),
            None => {
                self.nodes.insert(position, cell.clone());
                Ok(())
            }
        }
    }

    /// Origin for a new island two columns right of everything placed, or
    /// `None` when the grid is full to the right.
    fn fresh_origin(&self) -> Option<GridPosition> {
        match self.nodes.keys().map(|p| p.x).max() {
            None => Some(GridPosition::origin()),
            Some(x) => Some(GridPosition::new(x.checked_add(2)?, 0)),
        }
    }

    fn position_adjacency(&self) -> BTreeMap<GridPosition, Vec<GridPosition>> {
        let mut adjacency: BTreeMap<GridPosition, Vec<GridPosition>> = BTreeMap::new();
        for (a, b) in &self.edges {
            adjacency.entry(*a).or_default().push(*b);
            adjacency.entry(*b).or_default().push(*a);
        }
        adjacency
    }

    fn reachable_from(
        adjacency: &BTreeMap<GridPosition, Vec<GridPosition>>,
        start: GridPosition,
    ) -> BTreeSet<GridPosition> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in adjacency.get(&current).into_iter().flatten() {
                if seen.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        seen
    }

    fn rebuild_index(&mut self) {
        let mut index: CellIndex = BTreeMap::new();
        for cell in self.nodes.values() {
            index.entry(cell.clone()).or_default();
        }
        for (a, b) in &self.edges {
            let (Some(cell_a), Some(cell_b)) = (self.nodes.get(a), self.nodes.get(b)) else {
                continue;
            };
            let Some(direction) = a.direction_to(*b) else {
                continue;
            };
            // Occurrences of one identifier collapse to a single node.
            if cell_a == cell_b {
                continue;
            }
            index
                .entry(cell_a.clone())
                .or_default()
                .entry(direction)
                .or_default()
                .insert(cell_b.clone());
            index
                .entry(cell_b.clone())
                .or_default()
                .entry(direction.opposite())
                .or_default()
                .insert(cell_a.clone());
        }
        self.index = index;
    }
}
