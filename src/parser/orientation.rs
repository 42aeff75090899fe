//! Orientation normalization.
//!
//! Every orientation entering the engine passes through this module. The
//! evaluators assume a normalized `Option<f64>`: `None` is an empty slot,
//! `Some(angle)` is a finite angle in `[ORIENTATION_MIN, ORIENTATION_MAX]`
//! with negative zero folded to `0.0`.

use crate::constants::{ORIENTATION_MAX, ORIENTATION_MIN};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static ORIENTATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\d+(?:\.\d+)?$").expect("orientation pattern is a valid regex")
});

/// Degree markers stripped before parsing.
const DEGREE_TOKENS: [&str; 4] = ["\u{00b0}", "\u{00ba}", "deg", "DEG"];

/// Orientation input that could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrientationError {
    /// Text that is not a plain decimal angle.
    #[error("invalid orientation '{0}'")]
    Unparsable(String),
    /// NaN or infinite values.
    #[error("orientation must be a finite number")]
    NotFinite,
    /// Angle outside the accepted range.
    #[error("orientation {value} outside the allowed range [{min}, {max}]")]
    OutOfRange {
        /// The rejected angle
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

/// Normalizes a numeric angle.
///
/// # Examples
///
/// ```
/// use gridlam::parser::orientation::normalize_angle;
///
/// assert_eq!(normalize_angle(-0.0).unwrap(), 0.0);
/// assert!(normalize_angle(120.0).is_err());
/// ```
pub fn normalize_angle(value: f64) -> Result<f64, OrientationError> {
    if !value.is_finite() {
        return Err(OrientationError::NotFinite);
    }
    if !(ORIENTATION_MIN..=ORIENTATION_MAX).contains(&value) {
        return Err(OrientationError::OutOfRange {
            value,
            min: ORIENTATION_MIN,
            max: ORIENTATION_MAX,
        });
    }
    if value.abs() <= 1e-9 {
        return Ok(0.0);
    }
    Ok(value)
}

/// Normalizes orientation text.
///
/// Blank text is an empty slot (`Ok(None)`). Degree signs, `deg` suffixes and
/// decimal commas are accepted.
///
/// # Examples
///
/// ```
/// use gridlam::parser::orientation::normalize_orientation;
///
/// assert_eq!(normalize_orientation("-45°").unwrap(), Some(-45.0));
/// assert_eq!(normalize_orientation("22,5").unwrap(), Some(22.5));
/// assert_eq!(normalize_orientation("  ").unwrap(), None);
/// assert!(normalize_orientation("abc").is_err());
/// ```
pub fn normalize_orientation(text: &str) -> Result<Option<f64>, OrientationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("empty") {
        return Ok(None);
    }

    let mut cleaned = trimmed.to_string();
    for token in DEGREE_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    let cleaned = cleaned.trim().replace(',', ".");

    if !ORIENTATION_PATTERN.is_match(&cleaned) {
        return Err(OrientationError::Unparsable(text.to_string()));
    }
    let number: f64 = cleaned
        .parse()
        .map_err(|_| OrientationError::Unparsable(text.to_string()))?;

    normalize_angle(number).map(Some)
}

/// Formats an orientation for display (`45°`, `-22.5°`, empty for `None`).
#[must_use]
pub fn format_orientation(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(angle) => {
            let angle = if angle.abs() <= 1e-9 { 0.0 } else { angle };
            if (angle - angle.round()).abs() < 1e-9 {
                format!("{}\u{00b0}", angle.round())
            } else {
                format!("{angle}\u{00b0}")
            }
        }
    }
}
