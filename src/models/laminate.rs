//! Laminate data structures and ply operations.

use crate::constants::{DEFAULT_PLY_PREFIX, DEFAULT_SEQUENCE_PREFIX};
use crate::models::cell::CellId;
use crate::models::ply::Ply;
use crate::parser::labels::LabelScheme;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Label schemes used when a laminate carries no detectable labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDefaults {
    /// Fallback for sequence labels
    pub sequence: LabelScheme,
    /// Fallback for ply labels
    pub ply: LabelScheme,
}

impl Default for LabelDefaults {
    fn default() -> Self {
        Self {
            sequence: LabelScheme::new(DEFAULT_SEQUENCE_PREFIX, ".", 1),
            ply: LabelScheme::new(DEFAULT_PLY_PREFIX, ".", 1),
        }
    }
}

/// An ordered stacking sequence plus its metadata.
///
/// # Validation
///
/// - Name must be non-empty after trimming
/// - Ply indices always follow their position (re-synced on every mutation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laminate {
    /// Unique laminate name
    pub name: String,
    /// Laminate type label (free text)
    #[serde(default, rename = "type")]
    pub laminate_type: String,
    /// Color index or hex string, kept as text
    #[serde(default)]
    pub color: String,
    /// Free-text tag
    #[serde(default)]
    pub tag: String,
    /// Cells associated with this laminate
    #[serde(default)]
    pub cells: Vec<CellId>,
    /// Plies from top to bottom
    #[serde(default)]
    pub plies: Vec<Ply>,
}

impl Laminate {
    /// Creates an empty laminate.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("Laminate name cannot be empty");
        }
        Ok(Self {
            name,
            laminate_type: String::new(),
            color: String::new(),
            tag: String::new(),
            cells: Vec::new(),
            plies: Vec::new(),
        })
    }

    /// Creates a laminate from plies, re-indexing and labelling them.
    pub fn with_plies(name: impl Into<String>, plies: Vec<Ply>) -> Result<Self> {
        let mut laminate = Self::new(name)?;
        laminate.plies = plies;
        laminate.resync(&LabelDefaults::default());
        Ok(laminate)
    }

    /// Number of plies, including empty slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plies.len()
    }

    /// Returns true if the laminate has no plies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    /// Counts plies that carry an orientation.
    #[must_use]
    pub fn oriented_count(&self) -> usize {
        self.plies.iter().filter(|p| p.has_orientation()).count()
    }

    /// Counts structural plies that carry an orientation.
    #[must_use]
    pub fn structural_count(&self) -> usize {
        self.plies
            .iter()
            .filter(|p| p.is_structural() && p.has_orientation())
            .count()
    }

    /// Detects the sequence and ply label schemes currently in use.
    pub fn label_schemes(&self, defaults: &LabelDefaults) -> (LabelScheme, LabelScheme) {
        let sequence = LabelScheme::detect(
            self.plies.iter().map(|p| p.sequence_label.as_str()),
            &defaults.sequence,
        );
        let ply = LabelScheme::detect(
            self.plies.iter().map(|p| p.ply_label.as_str()),
            &defaults.ply,
        );
        (sequence, ply)
    }

    /// Replaces the plies and renumbers them with previously detected schemes.
    pub fn replace_plies(&mut self, plies: Vec<Ply>, sequence: &LabelScheme, ply: &LabelScheme) {
        self.plies = plies;
        self.renumber(sequence, ply);
    }

    /// Re-indexes plies and rewrites labels using the detected schemes.
    pub fn resync(&mut self, defaults: &LabelDefaults) {
        let (sequence, ply) = self.label_schemes(defaults);
        self.renumber(&sequence, &ply);
    }

    fn renumber(&mut self, sequence: &LabelScheme, ply: &LabelScheme) {
        for (idx, p) in self.plies.iter_mut().enumerate() {
            p.index = idx;
            p.sequence_label = sequence.label(idx);
            p.ply_label = ply.label(idx);
        }
    }

    /// Appends a ply.
    pub fn push_ply(&mut self, ply: Ply) {
        let (sequence, labels) = self.label_schemes(&LabelDefaults::default());
        self.plies.push(ply);
        self.renumber(&sequence, &labels);
    }

    /// Inserts a ply at `position`. Returns false if out of range.
    pub fn insert_ply(&mut self, position: usize, ply: Ply) -> bool {
        if position > self.plies.len() {
            return false;
        }
        let (sequence, labels) = self.label_schemes(&LabelDefaults::default());
        self.plies.insert(position, ply);
        self.renumber(&sequence, &labels);
        true
    }

    /// Removes the ply at `position`.
    pub fn remove_ply(&mut self, position: usize) -> Option<Ply> {
        if position >= self.plies.len() {
            return None;
        }
        let (sequence, labels) = self.label_schemes(&LabelDefaults::default());
        let removed = self.plies.remove(position);
        self.renumber(&sequence, &labels);
        Some(removed)
    }

    /// Moves a ply from `source` to `target`.
    pub fn move_ply(&mut self, source: usize, target: usize) -> bool {
        if source >= self.plies.len() || target >= self.plies.len() {
            return false;
        }
        if source == target {
            return true;
        }
        let (sequence, labels) = self.label_schemes(&LabelDefaults::default());
        let ply = self.plies.remove(source);
        self.plies.insert(target, ply);
        self.renumber(&sequence, &labels);
        true
    }

    /// Duplicates the ply at `position`, inserting the copy right after it.
    pub fn duplicate_ply(&mut self, position: usize) -> bool {
        let Some(original) = self.plies.get(position).cloned() else {
            return false;
        };
        self.insert_ply(position + 1, original)
    }

    /// Orientations from top to bottom.
    pub fn orientations(&self) -> Vec<Option<f64>> {
        self.plies.iter().map(|p| p.orientation).collect()
    }
}
