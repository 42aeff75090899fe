//! Mirror-symmetry evaluation of a laminate's structural plies.

use crate::constants::orientations_equal;
use crate::models::Ply;
use serde::Serialize;

/// Result of [`evaluate_symmetry`].
///
/// All indices refer to positions in the evaluated ply slice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SymmetryEvaluation {
    /// Positions of the structural plies, top to bottom
    pub structural_rows: Vec<usize>,
    /// One (odd count) or two (even count) positions on the symmetry axis
    pub centers: Vec<usize>,
    /// Whether every mirrored pair matches
    pub is_symmetric: bool,
    /// First pair, scanning outwards from the axis, that does not match
    pub first_mismatch: Option<(usize, usize)>,
}

/// Decides whether the structural plies mirror around their centre.
///
/// Non-structural plies are skipped. Empty slots take part in pairing, so an
/// empty slot must face another empty slot. Pairs are compared from the axis
/// outwards and the scan stops at the first mismatch.
///
/// # Examples
///
/// ```
/// use gridlam::models::Ply;
/// use gridlam::services::symmetry::evaluate_symmetry;
///
/// let plies: Vec<Ply> = [45.0, -45.0, 0.0, -45.0, 45.0]
///     .iter()
///     .map(|a| Ply::new("CFRP", Some(*a)).unwrap())
///     .collect();
/// let eval = evaluate_symmetry(&plies);
/// assert!(eval.is_symmetric);
/// assert_eq!(eval.centers, vec![2]);
/// ```
#[must_use]
pub fn evaluate_symmetry(plies: &[Ply]) -> SymmetryEvaluation {
    let structural_rows: Vec<usize> = plies
        .iter()
        .enumerate()
        .filter(|(_, ply)| ply.is_structural())
        .map(|(idx, _)| idx)
        .collect();

    let count = structural_rows.len();
    if count == 0 {
        return SymmetryEvaluation::default();
    }

    let row = |k: usize| structural_rows.get(k).and_then(|&idx| plies.get(idx));
    let pos = |k: usize| structural_rows.get(k).copied().unwrap_or(k);

    let (centers, pairs): (Vec<usize>, Vec<(usize, usize)>) = if count % 2 == 1 {
        let mid = count / 2;
        let pairs = (1..=mid).map(|offset| (mid - offset, mid + offset)).collect();
        (vec![pos(mid)], pairs)
    } else {
        let mid_left = count / 2 - 1;
        let mid_right = count / 2;
        let pairs = (0..=mid_left)
            .map(|offset| (mid_left - offset, mid_right + offset))
            .collect();
        (vec![pos(mid_left), pos(mid_right)], pairs)
    };

    let first_mismatch = pairs
        .into_iter()
        .find(|&(a, b)| !rows_match(row(a), row(b)))
        .map(|(a, b)| (pos(a), pos(b)));

    SymmetryEvaluation {
        structural_rows,
        centers,
        is_symmetric: first_mismatch.is_none(),
        first_mismatch,
    }
}

/// Convenience wrapper returning only the verdict.
#[must_use]
pub fn is_symmetric(plies: &[Ply]) -> bool {
    evaluate_symmetry(plies).is_symmetric
}

fn rows_match(a: Option<&Ply>, b: Option<&Ply>) -> bool {
    let orientation_a = a.and_then(|p| p.orientation);
    let orientation_b = b.and_then(|p| p.orientation);
    if !orientations_equal(orientation_a, orientation_b) {
        return false;
    }

    let material_a = normalize_material(a.map_or("", |p| p.material.as_str()));
    let material_b = normalize_material(b.map_or("", |p| p.material.as_str()));
    if material_a.is_empty() && material_b.is_empty() {
        return true;
    }
    material_a == material_b
}

/// Trims, collapses inner whitespace and uppercases a material label.
fn normalize_material(material: &str) -> String {
    material
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
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
    fn test_odd_symmetric() {
        let eval = evaluate_symmetry(&plies(&[45.0, -45.0, 0.0, -45.0, 45.0]));
        assert!(eval.is_symmetric);
        assert_eq!(eval.centers, vec![2]);
        assert_eq!(eval.first_mismatch, None);
        assert_eq!(eval.structural_rows, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_odd_mismatch_reported_from_axis_outwards() {
        // The outer pair (0, 4) matches; (1, 3) is the first failure.
        let eval = evaluate_symmetry(&plies(&[45.0, 45.0, 0.0, -45.0, 45.0]));
        assert!(!eval.is_symmetric);
        assert_eq!(eval.first_mismatch, Some((1, 3)));
    }

    #[test]
    fn test_outer_mismatch() {
        let eval = evaluate_symmetry(&plies(&[45.0, 0.0, 90.0, 0.0, -45.0]));
        assert!(!eval.is_symmetric);
        assert_eq!(eval.first_mismatch, Some((0, 4)));
    }

    #[test]
    fn test_even_centers_must_match() {
        let eval = evaluate_symmetry(&plies(&[0.0, 45.0, 45.0, 0.0]));
        assert!(eval.is_symmetric);
        assert_eq!(eval.centers, vec![1, 2]);

        let eval = evaluate_symmetry(&plies(&[0.0, 45.0, -45.0, 0.0]));
        assert!(!eval.is_symmetric);
        assert_eq!(eval.first_mismatch, Some((1, 2)));
    }

    #[test]
    fn test_empty_structural_set_is_not_symmetric() {
        let eval = evaluate_symmetry(&[]);
        assert!(!eval.is_symmetric);
        assert!(eval.centers.is_empty());
        assert!(eval.first_mismatch.is_none());

        let only_markers = vec![Ply::new("Peel", Some(0.0))
            .unwrap()
            .with_kind(PlyKind::NonStructural)];
        assert!(!evaluate_symmetry(&only_markers).is_symmetric);
    }

    #[test]
    fn test_non_structural_plies_are_skipped() {
        let mut stack = plies(&[45.0, 0.0, 45.0]);
        stack.insert(1, Ply::new("Peel", Some(90.0)).unwrap().with_kind(PlyKind::NonStructural));
        let eval = evaluate_symmetry(&stack);
        assert!(eval.is_symmetric);
        assert_eq!(eval.structural_rows, vec![0, 2, 3]);
        assert_eq!(eval.centers, vec![2]);
    }

    #[test]
    fn test_empty_slot_must_mirror_empty_slot() {
        let mut stack = plies(&[45.0, 0.0, 45.0]);
        stack[0] = Ply::empty();
        assert!(!is_symmetric(&stack));
        stack[2] = Ply::empty();
        assert!(is_symmetric(&stack));
    }

    #[test]
    fn test_material_comparison_is_normalized() {
        let mut stack = plies(&[45.0, 0.0, 45.0]);
        stack[0].material = "  carbon   ud ".to_string();
        stack[2].material = "CARBON UD".to_string();
        assert!(is_symmetric(&stack));
        stack[2].material = "Glass".to_string();
        assert!(!is_symmetric(&stack));
    }

    #[test]
    fn test_center_count_matches_parity() {
        for n in 1..8 {
            let stack = plies(&vec![0.0; n]);
            let eval = evaluate_symmetry(&stack);
            let expected = if n % 2 == 1 { 1 } else { 2 };
            assert_eq!(eval.centers.len(), expected, "n = {n}");
            if n % 2 == 0 {
                assert_eq!(eval.centers[1], eval.centers[0] + 1);
            }
        }
    }

    #[test]
    fn test_tolerance() {
        let stack = plies(&[45.0, 0.0, 45.000_000_5]);
        assert!(is_symmetric(&stack));
        let stack = plies(&[45.0, 0.0, 45.001]);
        assert!(!is_symmetric(&stack));
    }
}
