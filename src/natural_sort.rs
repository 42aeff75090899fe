//! Natural ordering of laminate and cell names (`L2 < L10 < L25.1`).

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("number pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
}

impl Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// Splits `text` into lowercase text runs and numbers, skipping blank runs.
fn tokens(text: &str) -> Vec<Token> {
    fn push_text(run: &str, out: &mut Vec<Token>) {
        let run = run.trim();
        if !run.is_empty() {
            out.push(Token::Text(run.to_lowercase()));
        }
    }

    let mut out = Vec::new();
    let mut last = 0;
    for m in NUMBER_PATTERN.find_iter(text) {
        push_text(&text[last..m.start()], &mut out);
        match m.as_str().parse::<f64>() {
            Ok(number) => out.push(Token::Number(number)),
            Err(_) => push_text(m.as_str(), &mut out),
        }
        last = m.end();
    }
    push_text(&text[last..], &mut out);
    out
}

/// Compares two names naturally (case-insensitive, numbers by value).
///
/// # Examples
///
/// ```
/// use gridlam::natural_sort::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("L2", "L10"), Ordering::Less);
/// assert_eq!(natural_cmp("l25.1", "L25"), Ordering::Greater);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ta, tb) = (tokens(a), tokens(b));
    for (x, y) in ta.iter().zip(&tb) {
        let ord = x.cmp(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ta.len().cmp(&tb.len()).then_with(|| a.cmp(b))
}

/// Sorts names in place using [`natural_cmp`].
pub fn natural_sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}
