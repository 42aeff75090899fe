//! Grid cell identifiers, positions and compass directions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CELL_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^C(\d+)$").expect("cell id pattern is a valid regex"));

/// Cell identifier in `C<number>` form.
///
/// Parsing is case-insensitive; the stored form is uppercase. Ordering is
/// numeric, so `C2 < C10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId {
    text: String,
    number: u64,
}

impl CellId {
    /// Parses a cell identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridlam::models::CellId;
    ///
    /// let id = CellId::parse("c12").unwrap();
    /// assert_eq!(id.as_str(), "C12");
    /// assert!(CellId::parse("X1").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        let caps = CELL_ID_PATTERN
            .captures(trimmed)
            .ok_or_else(|| format!("invalid cell identifier '{text}' (expected C<number>)"))?;
        let number: u64 = caps[1]
            .parse()
            .map_err(|_| format!("cell number out of range in '{text}'"))?;
        Ok(Self {
            text: format!("C{number}"),
            number,
        })
    }

    /// Canonical text form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric part of the identifier.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }
}

impl Ord for CellId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for CellId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for CellId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> Self {
        id.text
    }
}

/// Integer grid coordinates (x grows right, y grows down).
///
/// Deserializes from either `{"x": 1, "y": 2}` or `[1, 2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawPosition")]
pub struct GridPosition {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridPosition {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The grid origin.
    #[must_use]
    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Position one step away in `direction`, or `None` past the edge of
    /// the coordinate range.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.offset();
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Manhattan distance to another position, or `None` when it does not
    /// fit in a `u32`.
    #[must_use]
    pub fn manhattan(self, other: Self) -> Option<u32> {
        self.x.abs_diff(other.x).checked_add(self.y.abs_diff(other.y))
    }

    /// Returns true when `other` is one orthogonal step away.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == Some(1)
    }

    /// Direction from `self` to an orthogonally adjacent `other`.
    #[must_use]
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.step(*d) == Some(other))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Pair(i32, i32),
    Object { x: i32, y: i32 },
}

impl From<RawPosition> for GridPosition {
    fn from(raw: RawPosition) -> Self {
        match raw {
            RawPosition::Pair(x, y) | RawPosition::Object { x, y } => Self { x, y },
        }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction between neighboring cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards negative y
    Up,
    /// Towards positive y
    Down,
    /// Towards negative x
    Left,
    /// Towards positive x
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The inverse direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Grid offset `(dx, dy)`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// A grid cell and the laminate it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell identifier
    pub id: CellId,
    /// Name of the associated laminate, if any
    pub laminate: Option<String>,
}

impl Cell {
    /// Creates a cell without a laminate.
    pub const fn new(id: CellId) -> Self {
        Self { id, laminate: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_parse_case_insensitive() {
        let a = CellId::parse("c7").unwrap();
        let b = CellId::parse(" C7 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "C7");
        assert_eq!(a.number(), 7);
    }

    #[test]
    fn test_cell_id_rejects_invalid() {
        assert!(CellId::parse("").is_err());
        assert!(CellId::parse("C").is_err());
        assert!(CellId::parse("C1a").is_err());
        assert!(CellId::parse("D1").is_err());
    }

    #[test]
    fn test_cell_id_numeric_order() {
        let mut ids: Vec<CellId> = ["C10", "C2", "C1"]
            .iter()
            .map(|s| CellId::parse(s).unwrap())
            .collect();
        ids.sort();
        let names: Vec<&str> = ids.iter().map(CellId::as_str).collect();
        assert_eq!(names, vec!["C1", "C2", "C10"]);
    }

    #[test]
    fn test_cell_id_serde() {
        let id: CellId = serde_json::from_str("\"c3\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"C3\"");
        assert!(serde_json::from_str::<CellId>("\"nope\"").is_err());
        assert_eq!(CellId::parse("C007").unwrap(), CellId::parse("c7").unwrap());
    }

    #[test]
    fn test_grid_position_serde_forms() {
        let a: GridPosition = serde_json::from_str("[2, -1]").unwrap();
        let b: GridPosition = serde_json::from_str(r#"{"x": 2, "y": -1}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"x":2,"y":-1}"#);
    }

    #[test]
    fn test_direction_opposite_and_offsets() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            let (dx, dy) = d.offset();
            let (ox, oy) = d.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
        assert_eq!("Right".parse::<Direction>().unwrap(), Direction::Right);
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn test_grid_position_helpers() {
        let p = GridPosition::new(1, 1);
        assert_eq!(p.step(Direction::Up), Some(GridPosition::new(1, 0)));
        assert_eq!(p.manhattan(GridPosition::new(2, 3)), Some(3));
        assert!(p.is_adjacent(GridPosition::new(1, 2)));
        assert_eq!(
            p.direction_to(GridPosition::new(0, 1)),
            Some(Direction::Left)
        );
        assert_eq!(p.direction_to(GridPosition::new(2, 2)), None);
    }

    #[test]
    fn test_grid_position_edges_do_not_overflow() {
        let top = GridPosition::new(0, i32::MIN);
        assert_eq!(top.step(Direction::Up), None);
        assert_eq!(top.step(Direction::Down), Some(GridPosition::new(0, i32::MIN + 1)));
        assert_eq!(
            top.direction_to(GridPosition::new(0, i32::MIN + 1)),
            Some(Direction::Down)
        );

        let far = GridPosition::new(i32::MAX, i32::MAX);
        let near = GridPosition::new(i32::MIN, i32::MIN);
        assert_eq!(far.manhattan(near), None);
        assert!(!far.is_adjacent(near));
        assert_eq!(far.step(Direction::Right), None);
    }
}
