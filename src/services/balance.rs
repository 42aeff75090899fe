//! Balance evaluation under the classical lamination parity rule.
//!
//! A laminate is balanced when, for every orientation other than 0° and 90°,
//! the number of `+angle` plies equals the number of `-angle` plies. Angles
//! are folded into a 0°–45° bucket first, so 30° and 60° share one bucket.

use crate::constants::{angle_key, angles_equal};
use crate::models::Ply;
use serde::Serialize;
use std::collections::BTreeMap;

/// Positive/negative ply counts for one folded angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleBucket {
    /// Folded magnitude in degrees
    pub angle: f64,
    /// Plies at `+angle` (including exactly 0 after folding)
    pub positive: usize,
    /// Plies at `-angle`
    pub negative: usize,
}

impl AngleBucket {
    /// Returns true when both signs have the same count.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.positive == self.negative
    }
}

/// Result of [`evaluate_balance`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceEvaluation {
    /// Whether every bucket is balanced
    pub is_balanced: bool,
    /// Folded angles whose counts differ, ascending
    pub unbalanced_angles: Vec<f64>,
    /// Every bucket seen, ascending by angle
    pub angle_pairs: Vec<AngleBucket>,
}

/// Folds an absolute angle into its 0°–45° representative.
///
/// # Examples
///
/// ```
/// use gridlam::services::balance::fold_angle;
///
/// assert_eq!(fold_angle(60.0), 30.0);
/// assert_eq!(fold_angle(-45.0), 45.0);
/// assert_eq!(fold_angle(100.0), 10.0);
/// ```
#[must_use]
pub fn fold_angle(angle: f64) -> f64 {
    let mut folded = angle.abs();
    while folded > 90.0 {
        folded -= 90.0;
    }
    if folded > 45.0 {
        folded = 90.0 - folded;
    }
    folded
}

/// Counts `±angle` plies and reports unbalanced buckets.
///
/// Non-structural plies, empty slots and plies at 0° or 90° are skipped.
/// An empty sequence is balanced.
#[must_use]
pub fn evaluate_balance(plies: &[Ply]) -> BalanceEvaluation {
    let mut buckets: BTreeMap<i64, AngleBucket> = BTreeMap::new();

    for ply in plies.iter().filter(|p| p.is_structural()) {
        let Some(angle) = ply.orientation else {
            continue;
        };
        if angles_equal(angle.abs(), 0.0) || angles_equal(angle.abs(), 90.0) {
            continue;
        }
        let folded = fold_angle(angle);
        let bucket = buckets.entry(angle_key(folded)).or_insert(AngleBucket {
            angle: folded,
            positive: 0,
            negative: 0,
        });
        if angle >= 0.0 {
            bucket.positive += 1;
        } else {
            bucket.negative += 1;
        }
    }

    let angle_pairs: Vec<AngleBucket> = buckets.into_values().collect();
    let unbalanced_angles: Vec<f64> = angle_pairs
        .iter()
        .filter(|b| !b.is_balanced())
        .map(|b| b.angle)
        .collect();

    BalanceEvaluation {
        is_balanced: unbalanced_angles.is_empty(),
        unbalanced_angles,
        angle_pairs,
    }
}

/// Convenience wrapper returning only the verdict.
#[must_use]
pub fn is_balanced(plies: &[Ply]) -> bool {
    evaluate_balance(plies).is_balanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlyKind;

    fn plies(angles: &[f64]) -> Vec<Ply> {
        angles
            .iter()
            .map(|a| Ply::new("CFRP", Some(*a)).unwrap())
            .collect()
    }

    #[test]
    fn test_paired_angles_are_balanced() {
        let eval = evaluate_balance(&plies(&[45.0, -45.0, 30.0, -30.0, 0.0, 90.0]));
        assert!(eval.is_balanced);
        assert!(eval.unbalanced_angles.is_empty());
        assert_eq!(eval.angle_pairs.len(), 2);
        assert_eq!(eval.angle_pairs[0].angle, 30.0);
        assert_eq!(eval.angle_pairs[1].positive, 1);
        assert_eq!(eval.angle_pairs[1].negative, 1);
    }

    #[test]
    fn test_unpaired_angle_is_reported() {
        let eval = evaluate_balance(&plies(&[45.0, 45.0, -45.0, 0.0]));
        assert!(!eval.is_balanced);
        assert_eq!(eval.unbalanced_angles, vec![45.0]);
    }

    #[test]
    fn test_zero_and_ninety_are_ignored() {
        assert!(is_balanced(&plies(&[0.0, 90.0, -90.0, 0.0, 90.0])));
    }

    #[test]
    fn test_folding_merges_reflected_angles() {
        // 60° folds onto the 30° bucket, so +60/-30 balance each other.
        let eval = evaluate_balance(&plies(&[60.0, -30.0]));
        assert!(eval.is_balanced);
        assert_eq!(eval.angle_pairs.len(), 1);
        assert_eq!(eval.angle_pairs[0].angle, 30.0);
    }

    #[test]
    fn test_non_structural_and_empty_are_skipped() {
        let mut stack = plies(&[45.0, -45.0]);
        stack.push(Ply::new("Peel", Some(45.0)).unwrap().with_kind(PlyKind::NonStructural));
        stack.push(Ply::empty());
        assert!(is_balanced(&stack));
    }

    #[test]
    fn test_empty_sequence_is_balanced() {
        let eval = evaluate_balance(&[]);
        assert!(eval.is_balanced);
        assert!(eval.angle_pairs.is_empty());
    }

    #[test]
    fn test_unbalanced_angles_sorted() {
        let eval = evaluate_balance(&plies(&[45.0, 15.0, 30.0]));
        assert_eq!(eval.unbalanced_angles, vec![15.0, 30.0, 45.0]);
    }
}
