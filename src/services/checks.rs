//! Project-wide laminate checks: symmetry categories, duplicate stacks and
//! AML classification.

use crate::models::{Laminate, Ply};
use crate::natural_sort::{natural_cmp, natural_sort};
use crate::services::symmetry::is_symmetric;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Laminate names split by symmetry verdict, naturally sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymmetryReport {
    /// Symmetric laminates
    pub symmetric: Vec<String>,
    /// Laminates failing the symmetry check
    pub not_symmetric: Vec<String>,
}

/// Laminates sharing one stacking/type/color signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Normalized signature shared by the group
    pub signature: String,
    /// Short human-readable description
    pub summary: String,
    /// Laminate names, naturally sorted
    pub laminates: Vec<String>,
}

/// Result of [`run_all_checks`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecksReport {
    /// Symmetry categories
    pub symmetry: SymmetryReport,
    /// Duplicate groups, largest first
    pub duplicates: Vec<DuplicateGroup>,
}

/// Runs every laminate check.
#[must_use]
pub fn run_all_checks(laminates: &[Laminate]) -> ChecksReport {
    ChecksReport {
        symmetry: check_symmetry(laminates),
        duplicates: check_duplicates(laminates),
    }
}

/// Splits laminate names into symmetric and not symmetric.
#[must_use]
pub fn check_symmetry(laminates: &[Laminate]) -> SymmetryReport {
    let mut report = SymmetryReport::default();
    for laminate in laminates {
        if is_symmetric(&laminate.plies) {
            report.symmetric.push(laminate.name.clone());
        } else {
            report.not_symmetric.push(laminate.name.clone());
        }
    }
    natural_sort(&mut report.symmetric);
    natural_sort(&mut report.not_symmetric);
    report
}

/// Groups laminates with identical stacking, type and color.
///
/// Only groups of two or more distinct names are returned, sorted by size
/// (largest first) and then by summary.
#[must_use]
pub fn check_duplicates(laminates: &[Laminate]) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for laminate in laminates {
        let name = laminate.name.trim();
        if name.is_empty() {
            continue;
        }
        groups
            .entry(duplicate_signature(laminate))
            .or_default()
            .push(name.to_string());
    }

    let mut result: Vec<DuplicateGroup> = groups
        .into_iter()
        .filter_map(|(signature, mut names)| {
            natural_sort(&mut names);
            names.dedup();
            (names.len() >= 2).then(|| DuplicateGroup {
                summary: summarize(laminates, &names),
                signature,
                laminates: names,
            })
        })
        .collect();

    result.sort_by(|a, b| {
        b.laminates
            .len()
            .cmp(&a.laminates.len())
            .then_with(|| natural_cmp(&a.summary, &b.summary))
    });
    result
}

/// Normalized signature: per ply `MATERIAL@±angle@kind`, then type and color.
#[must_use]
pub fn duplicate_signature(laminate: &Laminate) -> String {
    let stacking = if laminate.plies.is_empty() {
        "stacking:empty".to_string()
    } else {
        laminate
            .plies
            .iter()
            .map(ply_token)
            .collect::<Vec<_>>()
            .join(";")
    };
    format!(
        "{}|{}|{}",
        stacking,
        laminate.laminate_type.trim().to_lowercase(),
        laminate.color.trim()
    )
}

fn ply_token(ply: &Ply) -> String {
    let material = ply
        .material
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    let orientation = ply
        .orientation
        .map_or_else(|| "none".to_string(), |a| format!("{a:+}"));
    let kind = if ply.is_structural() {
        "structural"
    } else {
        "non_structural"
    };
    format!("{material}@{orientation}@{kind}")
}

fn summarize(laminates: &[Laminate], names: &[String]) -> String {
    let Some(sample) = names
        .first()
        .and_then(|n| laminates.iter().find(|l| l.name.trim() == n))
    else {
        return "Duplicate stacking".to_string();
    };
    let kind = sample.laminate_type.trim().to_uppercase();
    let color = sample.color.trim();
    match (kind.is_empty(), color.is_empty()) {
        (false, false) => format!("Type: {kind} | Color: {color}"),
        (false, true) => format!("Type: {kind}"),
        (true, false) => format!("Color: {color}"),
        (true, true) => "Duplicate stacking".to_string(),
    }
}

/// Stiffness character of a laminate by orientation share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AmlType {
    /// Dominated by ±45° plies
    Soft,
    /// No dominant family
    #[serde(rename = "Quasi-iso")]
    QuasiIso,
    /// Dominated by 0° plies
    Hard,
}

impl fmt::Display for AmlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => write!(f, "Soft"),
            Self::QuasiIso => write!(f, "Quasi-iso"),
            Self::Hard => write!(f, "Hard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum AmlBucket {
    Zero,
    Plus45,
    Minus45,
    Ninety,
    Other,
}

const AML_TARGETS: [(f64, AmlBucket); 7] = [
    (0.0, AmlBucket::Zero),
    (45.0, AmlBucket::Plus45),
    (-45.0, AmlBucket::Minus45),
    (90.0, AmlBucket::Ninety),
    (-90.0, AmlBucket::Ninety),
    (180.0, AmlBucket::Zero),
    (-180.0, AmlBucket::Zero),
];

/// Angular window around each target family, in degrees.
const AML_WINDOW: f64 = 10.0;

/// Share a family needs to dominate.
const AML_THRESHOLD: f64 = 0.45;

fn aml_bucket(angle: f64) -> AmlBucket {
    let mut best = AML_TARGETS[0];
    for target in AML_TARGETS {
        if (angle - target.0).abs() < (angle - best.0).abs() {
            best = target;
        }
    }
    if (angle - best.0).abs() <= AML_WINDOW {
        best.1
    } else {
        AmlBucket::Other
    }
}

/// Classifies a laminate as Hard, Soft or Quasi-iso.
///
/// Every oriented ply counts (including non-structural ones). Returns
/// `None` when the laminate has no oriented plies.
///
/// # Examples
///
/// ```
/// use gridlam::models::{Laminate, Ply};
/// use gridlam::services::checks::{classify_aml, AmlType};
///
/// let plies = [0.0, 0.0, 45.0, -45.0, 0.0]
///     .iter()
///     .map(|a| Ply::new("CFRP", Some(*a)).unwrap())
///     .collect();
/// let laminate = Laminate::with_plies("L1", plies).unwrap();
/// assert_eq!(classify_aml(&laminate), Some(AmlType::Hard));
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify_aml(laminate: &Laminate) -> Option<AmlType> {
    let mut counts: BTreeMap<AmlBucket, usize> = BTreeMap::new();
    for angle in laminate.plies.iter().filter_map(|p| p.orientation) {
        *counts.entry(aml_bucket(angle)).or_default() += 1;
    }
    let total: usize = counts.values().sum();
    if total == 0 {
        return None;
    }

    let share = |buckets: &[AmlBucket]| {
        buckets
            .iter()
            .map(|b| counts.get(b).copied().unwrap_or(0))
            .sum::<usize>() as f64
            / total as f64
    };
    let zero = share(&[AmlBucket::Zero]);
    let pm45 = share(&[AmlBucket::Plus45, AmlBucket::Minus45]);
    let ninety = share(&[AmlBucket::Ninety]);

    if zero >= AML_THRESHOLD && zero >= pm45 && zero >= ninety {
        Some(AmlType::Hard)
    } else if pm45 >= AML_THRESHOLD && pm45 >= zero && pm45 >= ninety {
        Some(AmlType::Soft)
    } else {
        Some(AmlType::QuasiIso)
    }
}
