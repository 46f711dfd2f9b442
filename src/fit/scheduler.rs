//! Coordinate-ascent schedule over precision levels.
//!
//! Starting at precision 0 (step `1.0` in exponent space) the scheduler steps
//! until a level converges (the step returns the center), then refines the
//! step by a factor of ten, up to `max_precision`.
//!
//! Stagnation backoff: when the same lattice move is returned more than
//! `stagnation_limit` times in a row at a refined level, the search is walking
//! a long slope in tiny increments, so it goes back to the coarser level.

use log::{debug, info, warn};

use crate::domain::{CoefficientVector, FitConfig, FunctionShape, SearchStatus};
use crate::fit::cancel::CancellationToken;
use crate::fit::evaluator::CandidateEvaluator;
use crate::fit::lattice::{Lattice, offsets};
use crate::fit::step::{grid_search_step, precision_step};

/// Number of level transitions between two heartbeat log lines.
const HEARTBEAT_INTERVAL: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub max_precision: u32,
    pub stagnation_limit: usize,
    pub max_steps: usize,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self::from(&FitConfig::default())
    }
}

impl From<&FitConfig> for ScheduleOptions {
    fn from(config: &FitConfig) -> Self {
        Self {
            max_precision: config.max_precision,
            stagnation_limit: config.stagnation_limit,
            max_steps: config.max_steps,
        }
    }
}

/// Hook for callers that want to follow a search level by level.
pub trait ProgressObserver: Sync {
    /// Called each time a precision level converges.
    fn on_level_converged(&self, _shape: FunctionShape, _precision: u32, _score: f64) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Where a single ascent ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AscentOutcome {
    pub center: CoefficientVector,
    pub score: f64,
    pub status: SearchStatus,
    pub steps: usize,
}

/// Climb the likelihood surface from `seed` for the evaluator's shape and signs.
///
/// Inactive slots are pinned before the first evaluation. The returned center
/// always carries the score it was evaluated with, also when the search was
/// cut short.
pub fn ascend(
    evaluator: &CandidateEvaluator<'_>,
    seed: &CoefficientVector,
    options: ScheduleOptions,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> AscentOutcome {
    let layout = *evaluator.layout();
    let shape = layout.shape();
    let name = shape.display_name();
    let lattice = Lattice::for_active(&layout.active_slots());

    let mut center = layout.pin_inactive(seed);
    let mut score = evaluator.score(&center);
    let mut steps = 0usize;

    let mut precision = 0u32;
    let mut last_move: Option<usize> = None;
    let mut repeats = 0usize;
    let mut transitions = 0usize;
    let mut heartbeat_score: Option<f64> = None;

    let mut enter_level = |precision: u32, score: f64| {
        transitions += 1;
        info!("Fitting {name} with precision {:.4}", precision_step(precision));
        if transitions % HEARTBEAT_INTERVAL == 0 {
            match heartbeat_score {
                Some(prev) => info!(
                    "{name}: log-likelihood is still increasing, {score:.10} now vs {prev:.10} {HEARTBEAT_INTERVAL} levels ago"
                ),
                None => info!("{name}: log-likelihood is still increasing, {score:.10} now"),
            }
            heartbeat_score = Some(score);
        }
    };
    enter_level(precision, score);

    let status = loop {
        if cancel.is_cancelled() {
            break SearchStatus::Cancelled;
        }
        if steps >= options.max_steps {
            warn!(
                "{name}: step budget of {} exhausted at precision {:.4}, keeping log-likelihood {score:.10}",
                options.max_steps,
                precision_step(precision)
            );
            break SearchStatus::StepBudgetExhausted;
        }

        let outcome = grid_search_step(evaluator, &lattice, &center, precision);
        steps += 1;

        if outcome.is_center() {
            score = outcome.score;
            observer.on_level_converged(shape, precision, score);
            if precision >= options.max_precision {
                break SearchStatus::Converged;
            }
            if cancel.is_cancelled() {
                break SearchStatus::Cancelled;
            }
            precision += 1;
            last_move = None;
            repeats = 0;
            enter_level(precision, score);
            continue;
        }

        center = center.shifted(&offsets(outcome.index), precision_step(precision));
        score = outcome.score;
        debug!(
            "{name}: step {steps} moved to lattice point {} at precision {precision}, log-likelihood {score:.10}",
            outcome.index
        );

        if last_move == Some(outcome.index) {
            repeats += 1;
        } else {
            last_move = Some(outcome.index);
            repeats = 1;
        }

        if repeats > options.stagnation_limit && precision > 0 {
            precision -= 1;
            last_move = None;
            repeats = 0;
            warn!(
                "{name}: ascent is too slow, fitting with precision {:.4} again",
                precision_step(precision)
            );
            enter_level(precision, score);
        }
    };

    AscentOutcome {
        center,
        score,
        status,
        steps,
    }
}
