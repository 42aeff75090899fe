//! Intermediate laminate synthesis by symmetric ply removal.
//!
//! Given a thick laminate and a thin one, blanks `reduce_by` plies of the
//! thick laminate so that the result stays symmetric and balanced. Only
//! orientations the thick laminate has in excess of the thin one may be
//! removed, and removal happens in mirrored pairs `(i, len - 1 - i)` plus,
//! for an odd reduction, the centre ply.

use crate::constants::{angle_key, angles_equal, orientations_equal};
use crate::models::{Laminate, Ply};
use crate::services::balance::is_balanced;
use crate::services::symmetry::is_symmetric;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Why no intermediate laminate could be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntermediateError {
    /// `reduce_by` was zero.
    #[error("reduction must remove at least one ply")]
    InvalidReduction,
    /// The thick laminate does not have more structural plies.
    #[error("{max} ({max_count} plies) is not thicker than {min} ({min_count} plies)")]
    NotThicker {
        /// Name of the thick laminate
        max: String,
        /// Its structural ply count
        max_count: usize,
        /// Name of the thin laminate
        min: String,
        /// Its structural ply count
        min_count: usize,
    },
    /// No orientation occurs more often in the thick laminate.
    #[error("no removable excess orientations")]
    NoRemovableExcess,
    /// Fewer excess plies than requested removals.
    #[error("cannot remove {requested} plies: only {available} excess plies available")]
    ReductionExceedsExcess {
        /// Requested removals
        requested: usize,
        /// Total excess plies
        available: usize,
    },
    /// An odd reduction needs a removable centre ply.
    #[error("an odd reduction requires a removable centre ply")]
    NoCenterPly,
    /// Every combination broke symmetry or balance.
    #[error("no symmetric and balanced combination found{}", search_scope(.tried_non_45))]
    NoValidCombination {
        /// Whether non-±45° pairs were searched too
        tried_non_45: bool,
    },
}

fn search_scope(tried_non_45: &bool) -> &'static str {
    if *tried_non_45 {
        ""
    } else {
        " using \u{b1}45\u{b0} pairs"
    }
}

/// A successfully synthesized intermediate laminate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateLaminate {
    /// Copy of the thick laminate with the removed plies blanked
    pub laminate: Laminate,
    /// Blanked positions, ascending
    pub removed_indices: Vec<usize>,
    /// Whether a non-±45° pair was removed
    pub used_non_45: bool,
}

/// Remaining removable plies per orientation key.
type Budget = BTreeMap<i64, usize>;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    top: usize,
    bottom: usize,
    top_key: i64,
    bottom_key: i64,
    preferred: bool,
    score: u8,
}

/// Builds an intermediate laminate between `max` and `min`.
///
/// The result is a deep copy of `max` with exactly `reduce_by` positions
/// blanked (orientation and material cleared). Ply count is unchanged.
/// Pairs of ±45° plies are tried first; other pairs only when
/// `allow_non_45` is set and the ±45° search failed.
///
/// # Errors
///
/// See [`IntermediateError`]. None of the failures is fatal; callers may
/// retry with `allow_non_45 = true`.
pub fn build_intermediate_laminate(
    max: &Laminate,
    min: &Laminate,
    reduce_by: usize,
    allow_non_45: bool,
) -> Result<IntermediateLaminate, IntermediateError> {
    if reduce_by == 0 {
        return Err(IntermediateError::InvalidReduction);
    }
    let (max_count, min_count) = (max.structural_count(), min.structural_count());
    if max_count <= min_count {
        return Err(IntermediateError::NotThicker {
            max: max.name.clone(),
            max_count,
            min: min.name.clone(),
            min_count,
        });
    }

    let mut budget = excess(&max.plies, &min.plies);
    if budget.is_empty() {
        return Err(IntermediateError::NoRemovableExcess);
    }
    let available: usize = budget.values().sum();
    if reduce_by > available {
        return Err(IntermediateError::ReductionExceedsExcess {
            requested: reduce_by,
            available,
        });
    }

    let mut fixed = Vec::new();
    if reduce_by % 2 == 1 {
        let centre = centre_ply(&max.plies, &budget).ok_or(IntermediateError::NoCenterPly)?;
        if let Some(key) = removable_key(&max.plies[centre]) {
            take(&mut budget, key);
        }
        fixed.push(centre);
    }
    let pairs_needed = reduce_by / 2;

    let candidates = candidates(&max.plies, &min.plies, &budget);
    let preferred: Vec<Candidate> = candidates.iter().filter(|c| c.preferred).copied().collect();
    debug!(
        "Intermediate search: {} pairs needed, {} preferred / {} total candidates",
        pairs_needed,
        preferred.len(),
        candidates.len()
    );

    let search = Search { max, fixed: &fixed };
    let mut found = search.run(&preferred, pairs_needed, &budget);
    if found.is_none() && allow_non_45 {
        debug!("No \u{b1}45\u{b0} combination; widening to all orientations");
        let mut widened = preferred.clone();
        widened.extend(candidates.iter().filter(|c| !c.preferred).copied());
        found = search.run(&widened, pairs_needed, &budget);
    }

    let Some(chosen) = found else {
        return Err(IntermediateError::NoValidCombination {
            tried_non_45: allow_non_45,
        });
    };

    let used_non_45 = chosen.iter().any(|c| !c.preferred);
    let removed_indices = search.removed(&chosen);
    info!(
        "Intermediate laminate from {}: removed plies {:?}",
        max.name, removed_indices
    );
    Ok(IntermediateLaminate {
        laminate: search.materialize(&removed_indices),
        removed_indices,
        used_non_45,
    })
}

/// `count_in_max - count_in_min` per orientation, positive entries only.
fn excess(max: &[Ply], min: &[Ply]) -> Budget {
    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for key in max.iter().filter_map(removable_key) {
        *counts.entry(key).or_default() += 1;
    }
    for key in min.iter().filter_map(removable_key) {
        *counts.entry(key).or_default() -= 1;
    }
    counts
        .into_iter()
        .filter_map(|(key, n)| usize::try_from(n).ok().filter(|n| *n > 0).map(|n| (key, n)))
        .collect()
}

/// Orientation key of a structural, oriented ply.
fn removable_key(ply: &Ply) -> Option<i64> {
    ply.orientation
        .filter(|_| ply.is_structural())
        .map(angle_key)
}

fn is_plus_minus_45(ply: &Ply) -> bool {
    ply.orientation.is_some_and(|a| angles_equal(a.abs(), 45.0))
}

fn take(budget: &mut Budget, key: i64) -> bool {
    match budget.get_mut(&key) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}

fn centre_ply(plies: &[Ply], budget: &Budget) -> Option<usize> {
    if plies.len() % 2 == 0 {
        return None;
    }
    let centre = plies.len() / 2;
    let key = removable_key(&plies[centre])?;
    budget.get(&key).filter(|n| **n > 0).map(|_| centre)
}

/// Mirrored pairs whose orientations are both in excess.
///
/// Pairs that differ from `min` at the same (and mirrored) position score
/// higher; highest score first, then outermost first.
fn candidates(max: &[Ply], min: &[Ply], budget: &Budget) -> Vec<Candidate> {
    let len = max.len();
    let differs = |ply: &Ply, other: Option<&Ply>| {
        other.is_none_or(|o| !orientations_equal(ply.orientation, o.orientation))
    };

    let mut list: Vec<Candidate> = (0..len / 2)
        .filter_map(|top| {
            let bottom = len - 1 - top;
            let (a, b) = (&max[top], &max[bottom]);
            let top_key = removable_key(a).filter(|k| budget.contains_key(k))?;
            let bottom_key = removable_key(b).filter(|k| budget.contains_key(k))?;
            let mirror = min.len().checked_sub(1 + top).and_then(|i| min.get(i));
            let score = u8::from(differs(a, min.get(top))) + u8::from(differs(b, mirror));
            Some(Candidate {
                top,
                bottom,
                top_key,
                bottom_key,
                preferred: is_plus_minus_45(a) && is_plus_minus_45(b),
                score,
            })
        })
        .collect();

    list.sort_by(|x, y| y.score.cmp(&x.score).then(x.top.cmp(&y.top)));
    list
}

struct Search<'a> {
    max: &'a Laminate,
    fixed: &'a [usize],
}

impl Search<'_> {
    fn run(&self, candidates: &[Candidate], needed: usize, budget: &Budget) -> Option<Vec<Candidate>> {
        self.step(candidates, 0, needed, budget, &[])
    }

    /// Include-or-skip recursion. The budget is copied on every include so
    /// sibling branches never see each other's removals.
    fn step(
        &self,
        candidates: &[Candidate],
        start: usize,
        needed: usize,
        budget: &Budget,
        chosen: &[Candidate],
    ) -> Option<Vec<Candidate>> {
        if needed == 0 {
            let removed = self.removed(chosen);
            let blanked = self.materialize(&removed);
            if is_symmetric(&blanked.plies) && is_balanced(&blanked.plies) {
                return Some(chosen.to_vec());
            }
            return None;
        }
        if candidates.len() - start < needed {
            return None;
        }

        let candidate = candidates[start];
        let mut next_budget = budget.clone();
        if take(&mut next_budget, candidate.top_key) && take(&mut next_budget, candidate.bottom_key) {
            let mut next_chosen = chosen.to_vec();
            next_chosen.push(candidate);
            if let Some(found) = self.step(candidates, start + 1, needed - 1, &next_budget, &next_chosen) {
                return Some(found);
            }
        }
        self.step(candidates, start + 1, needed, budget, chosen)
    }

    fn removed(&self, chosen: &[Candidate]) -> Vec<usize> {
        let mut removed: Vec<usize> = self.fixed.to_vec();
        removed.extend(chosen.iter().flat_map(|c| [c.top, c.bottom]));
        removed.sort_unstable();
        removed
    }

    fn materialize(&self, removed: &[usize]) -> Laminate {
        let mut laminate = self.max.clone();
        for idx in removed {
            if let Some(ply) = laminate.plies.get_mut(*idx) {
                ply.clear();
            }
        }
        laminate
    }
}
