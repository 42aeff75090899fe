//! Ply definition data structures.

use crate::constants::DEFAULT_ROSETTE;
use crate::parser::orientation::{normalize_angle, normalize_orientation, OrientationError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Whether a ply counts for symmetry and balance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyKind {
    /// Counted by symmetry and balance checks
    #[default]
    Structural,
    /// Occupies a sequence position but is ignored by the evaluators
    NonStructural,
}

impl PlyKind {
    /// Parses a free-text ply type label.
    ///
    /// Accepts English and Portuguese spellings used by older spreadsheets.
    /// Unknown or empty labels are structural.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridlam::models::PlyKind;
    ///
    /// assert_eq!(PlyKind::from_label("Non structural Ply"), PlyKind::NonStructural);
    /// assert_eq!(PlyKind::from_label("N\u{e3}o Considerar"), PlyKind::NonStructural);
    /// assert_eq!(PlyKind::from_label("whatever"), PlyKind::Structural);
    /// ```
    pub fn from_label(label: &str) -> Self {
        match label_token(label).as_str() {
            "nonstructural" | "nonstructuralply" | "naoconsiderar" => Self::NonStructural,
            _ => Self::Structural,
        }
    }

    /// Returns true if a label names one of the known kinds.
    pub fn is_known_label(label: &str) -> bool {
        matches!(
            label_token(label).as_str(),
            "structural"
                | "structuralply"
                | "considerar"
                | "nonstructural"
                | "nonstructuralply"
                | "naoconsiderar"
        )
    }

    /// Returns true for structural plies.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(self, Self::Structural)
    }

    /// Display label
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Structural => "Structural",
            Self::NonStructural => "Non-structural",
        }
    }
}

impl fmt::Display for PlyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lowercase ASCII token with accents folded and punctuation dropped.
fn label_token(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            'ã' | 'á' | 'â' | 'à' | 'Ã' | 'Á' | 'Â' | 'À' => 'a',
            _ => c,
        })
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// One layer in a stacking sequence.
///
/// # Validation
///
/// - `orientation` is normalized (see [`crate::parser::orientation`])
/// - `material` may be empty only when `orientation` is empty
/// - `index` always equals the ply's position in its laminate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ply {
    /// Position within the laminate (0-based)
    #[serde(default)]
    pub index: usize,
    /// Material label (free text)
    #[serde(default)]
    pub material: String,
    /// Angle in degrees, `None` for an empty slot
    #[serde(default, deserialize_with = "deserialize_orientation")]
    pub orientation: Option<f64>,
    /// Structural or non-structural
    #[serde(default)]
    pub kind: PlyKind,
    /// Sequence label (e.g., "Seq.1")
    #[serde(default)]
    pub sequence_label: String,
    /// Ply label (e.g., "Ply.1")
    #[serde(default)]
    pub ply_label: String,
    /// Rosette reference
    #[serde(default = "default_rosette")]
    pub rosette: String,
}

fn default_rosette() -> String {
    DEFAULT_ROSETTE.to_string()
}

impl Ply {
    /// Creates a structural ply.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle is out of range or not finite.
    pub fn new(material: impl Into<String>, orientation: Option<f64>) -> Result<Self, OrientationError> {
        let orientation = orientation.map(normalize_angle).transpose()?;
        Ok(Self {
            index: 0,
            material: material.into(),
            orientation,
            kind: PlyKind::Structural,
            sequence_label: String::new(),
            ply_label: String::new(),
            rosette: default_rosette(),
        })
    }

    /// Creates a ply from orientation text.
    pub fn parse(material: impl Into<String>, orientation: &str) -> Result<Self, OrientationError> {
        Self::new(material, normalize_orientation(orientation)?)
    }

    /// Creates an empty structural slot.
    pub fn empty() -> Self {
        Self {
            index: 0,
            material: String::new(),
            orientation: None,
            kind: PlyKind::Structural,
            sequence_label: String::new(),
            ply_label: String::new(),
            rosette: default_rosette(),
        }
    }

    /// Sets the ply kind.
    #[must_use]
    pub fn with_kind(mut self, kind: PlyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns true if the ply has an orientation.
    #[must_use]
    pub const fn has_orientation(&self) -> bool {
        self.orientation.is_some()
    }

    /// Returns true if the ply is an empty slot.
    #[must_use]
    pub const fn is_empty_slot(&self) -> bool {
        self.orientation.is_none()
    }

    /// Returns true for structural plies.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }

    /// Clears orientation and material, turning the ply into an empty slot.
    pub fn clear(&mut self) {
        self.orientation = None;
        self.material.clear();
    }

    /// Checks the material/orientation invariant.
    ///
    /// Returns a message describing the violation, if any.
    pub fn validate(&self) -> Option<String> {
        if self.orientation.is_some() && self.material.trim().is_empty() {
            return Some(format!(
                "ply {} has an orientation but no material",
                self.index + 1
            ));
        }
        None
    }
}

/// Raw orientation as it may appear in a document.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrientation {
    Number(f64),
    Text(String),
}

fn deserialize_orientation<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawOrientation> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawOrientation::Number(value)) => normalize_angle(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(RawOrientation::Text(text)) => {
            normalize_orientation(&text).map_err(serde::de::Error::custom)
        }
    }
}
