//! Candidate evaluation: total log-likelihood of one coefficient vector.

use crate::domain::{CoefficientVector, Dataset, SLOT_COUNT, ShapeLayout, SignPattern};
use crate::models::total_log_likelihood;

/// Scores coefficient vectors for one (shape, sign pattern) over a dataset.
///
/// The evaluator is immutable and only borrows the dataset, so it is shared
/// by reference across all workers of a step.
#[derive(Debug, Clone, Copy)]
pub struct CandidateEvaluator<'a> {
    dataset: &'a Dataset,
    layout: ShapeLayout,
    signs: SignPattern,
}

impl<'a> CandidateEvaluator<'a> {
    pub fn new(dataset: &'a Dataset, layout: ShapeLayout, signs: SignPattern) -> Self {
        Self {
            dataset,
            layout,
            signs,
        }
    }

    pub fn layout(&self) -> &ShapeLayout {
        &self.layout
    }

    pub fn signs(&self) -> SignPattern {
        self.signs
    }

    /// Actual signed coefficients for an exponent-space vector.
    pub fn coefficients(&self, candidate: &CoefficientVector) -> [f64; SLOT_COUNT] {
        self.layout.signed_coefficients(candidate, &self.signs)
    }

    /// Total log-likelihood of `candidate` (sequential over the dataset).
    pub fn score(&self, candidate: &CoefficientVector) -> f64 {
        total_log_likelihood(
            &self.layout,
            self.dataset.observations(),
            &self.coefficients(candidate),
        )
    }
}
