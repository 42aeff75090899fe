//! Sequence and ply label conventions.
//!
//! Labels follow `prefix + separator + number` (`Seq.1`, `Ply3`). A laminate's
//! scheme is detected from the first label that matches the pattern and is
//! reused whenever the stack is renumbered.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[A-Za-z][A-Za-z0-9_-]*?)(?P<sep>\.?)(?P<number>\d+)$")
        .expect("label pattern is a valid regex")
});

/// Prefix, separator and start number used to renumber labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelScheme {
    /// Text before the separator (e.g., "Seq")
    pub prefix: String,
    /// Either "." or empty
    pub separator: String,
    /// Number given to the first ply
    pub start: usize,
}

impl LabelScheme {
    /// Creates a scheme.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>, start: usize) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            start: start.max(1),
        }
    }

    /// Detects the scheme from existing labels.
    ///
    /// The first label matching the convention fixes prefix and separator; the
    /// start number is inferred from that label's number and its position.
    /// Falls back to `fallback` when nothing matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridlam::parser::labels::LabelScheme;
    ///
    /// let fallback = LabelScheme::new("Seq", ".", 1);
    /// let scheme = LabelScheme::detect(["", "S-2", "S-3"], &fallback);
    /// assert_eq!(scheme.prefix, "S-");
    /// assert_eq!(scheme.separator, "");
    /// assert_eq!(scheme.start, 1);
    /// ```
    pub fn detect<'a, I>(labels: I, fallback: &LabelScheme) -> LabelScheme
    where
        I: IntoIterator<Item = &'a str>,
    {
        for (position, label) in labels.into_iter().enumerate() {
            let Some(caps) = LABEL_PATTERN.captures(label.trim()) else {
                continue;
            };
            let number: usize = match caps["number"].parse() {
                Ok(number) => number,
                Err(_) => continue,
            };
            let start = number.checked_sub(position).filter(|start| *start >= 1).unwrap_or(1);
            return LabelScheme::new(&caps["prefix"], &caps["sep"], start);
        }
        fallback.clone()
    }

    /// Label for the ply at `index` (0-based).
    pub fn label(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, self.separator, self.start + index)
    }
}

/// Returns true when `label` follows the `prefix[.]number` convention.
pub fn is_valid_label(label: &str) -> bool {
    LABEL_PATTERN.is_match(label.trim())
}
