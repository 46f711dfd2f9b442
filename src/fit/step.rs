//! One grid-search step: parallel neighbourhood evaluation plus argmax.
//!
//! Every lattice point is scored independently (rayon map over the enumerated
//! indices). Each worker only reads the shared dataset and the step's center
//! and writes its own result slot; `collect` is the join barrier before the
//! reduction.

use rayon::prelude::*;

use crate::domain::CoefficientVector;
use crate::fit::evaluator::CandidateEvaluator;
use crate::fit::lattice::{CENTER_INDEX, Lattice, offsets};

/// Best point of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Lattice index of the winner (`CENTER_INDEX` when nothing improves).
    pub index: usize,
    /// Total log-likelihood at the winner.
    pub score: f64,
}

impl StepOutcome {
    /// True when no neighbour strictly improves on the center.
    pub fn is_center(&self) -> bool {
        self.index == CENTER_INDEX
    }
}

/// Step size in exponent space for a precision level (`10^-precision`).
pub fn precision_step(precision: u32) -> f64 {
    10f64.powi(-(precision as i32))
}

/// Evaluate every lattice neighbour of `center` at `precision` and return the
/// best one.
pub fn grid_search_step(
    evaluator: &CandidateEvaluator<'_>,
    lattice: &Lattice,
    center: &CoefficientVector,
    precision: u32,
) -> StepOutcome {
    let step = precision_step(precision);
    let scores: Vec<f64> = lattice
        .indices()
        .par_iter()
        .map(|&index| evaluator.score(&center.shifted(&offsets(index), step)))
        .collect();
    select_best(lattice, &scores)
}

/// Deterministic argmax over `scores` (aligned with `lattice.indices()`).
///
/// The center wins unless some point strictly beats it. Among points sharing
/// the maximal score, axis-aligned neighbours (slot order, `-ε` first) are
/// preferred, then scan order.
fn select_best(lattice: &Lattice, scores: &[f64]) -> StepOutcome {
    let score_at = |index: usize| lattice.position(index).map(|pos| scores[pos]);

    let center_score = score_at(CENTER_INDEX).unwrap_or(f64::NEG_INFINITY);
    let best_score = scores.iter().copied().fold(center_score, f64::max);
    if best_score <= center_score {
        return StepOutcome {
            index: CENTER_INDEX,
            score: center_score,
        };
    }

    let index = lattice
        .axis_neighbours()
        .iter()
        .copied()
        .find(|&i| score_at(i) == Some(best_score))
        .or_else(|| {
            lattice
                .indices()
                .iter()
                .zip(scores.iter())
                .find(|(_, s)| **s == best_score)
                .map(|(&i, _)| i)
        })
        .unwrap_or(CENTER_INDEX);

    StepOutcome {
        index,
        score: best_score,
    }
}
