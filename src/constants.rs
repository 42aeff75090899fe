//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the numeric tolerances shared by the
//! stacking evaluators.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "GridLam";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "gridlam";

/// Directory name used under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "GridLam";

/// Absolute tolerance used whenever two orientation angles are compared.
pub const ORIENTATION_TOLERANCE: f64 = 1e-6;

/// Lowest orientation accepted by the normalizer (degrees).
pub const ORIENTATION_MIN: f64 = -100.0;

/// Highest orientation accepted by the normalizer (degrees).
pub const ORIENTATION_MAX: f64 = 100.0;

/// Default prefix for sequence labels (`Seq.1`, `Seq.2`, ...).
pub const DEFAULT_SEQUENCE_PREFIX: &str = "Seq";

/// Default prefix for ply labels (`Ply.1`, `Ply.2`, ...).
pub const DEFAULT_PLY_PREFIX: &str = "Ply";

/// Default rosette reference for new plies.
pub const DEFAULT_ROSETTE: &str = "Rosette.1";

/// Returns true when two angles are equal within [`ORIENTATION_TOLERANCE`].
#[must_use]
pub fn angles_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= ORIENTATION_TOLERANCE
}

/// Returns true when two optional orientations match (both empty, or both
/// present and equal within tolerance).
#[must_use]
pub fn orientations_equal(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => angles_equal(a, b),
        _ => false,
    }
}

/// Integer key for bucketing angles in ordered maps.
///
/// The angle is rounded to the nearest multiple of the tolerance. Two angles
/// closer than the tolerance can still straddle a rounding boundary and get
/// adjacent keys.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn angle_key(angle: f64) -> i64 {
    (angle / ORIENTATION_TOLERANCE).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientations_equal() {
        assert!(orientations_equal(None, None));
        assert!(orientations_equal(Some(45.0), Some(45.000_000_1)));
        assert!(!orientations_equal(Some(45.0), Some(-45.0)));
        assert!(!orientations_equal(Some(0.0), None));
    }

    #[test]
    fn test_angle_key_rounds_to_tolerance_grid() {
        assert_eq!(angle_key(45.0), angle_key(45.000_000_4));
        assert_eq!(angle_key(-30.0), angle_key(-30.000_000_1));
        assert_ne!(angle_key(45.0), angle_key(-45.0));
        // Within tolerance, but on either side of a rounding boundary.
        assert!(angles_equal(45.000_000_4, 45.000_000_6));
        assert_eq!(angle_key(45.000_000_6) - angle_key(45.000_000_4), 1);
    }
}
