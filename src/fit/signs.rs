//! Sign-pattern exploration for one shape.
//!
//! The search works on magnitudes in exponent space, so each coefficient's
//! sign has to be chosen up front. In fixed mode the caller's pattern is the
//! only one tried. In sweep mode the active slots form a binary counter
//! (lowest active slot = lowest bit) which runs from the caller's pattern up
//! to all-negative.

use log::info;

use crate::domain::{Dataset, FitConfig, FitResult, SLOT_COUNT, ShapeLayout, SignPattern};
use crate::fit::cancel::CancellationToken;
use crate::fit::evaluator::CandidateEvaluator;
use crate::fit::scheduler::{AscentOutcome, ProgressObserver, ScheduleOptions, ascend};

/// Sign patterns to try for `layout`, in order.
///
/// For floor-and-ceiling shapes the sweep ends before the first pattern that
/// makes both the floor and the ceiling negative; the starting pattern is
/// always included.
pub fn sign_patterns(layout: &ShapeLayout, start: SignPattern, sweep: bool) -> Vec<SignPattern> {
    if !sweep {
        return vec![start];
    }

    let active = layout.active_slot_indices();
    let width = active.len();
    let first = compress(&active, &start);
    let top_two = 0b11u32 << (width - 2);

    let mut patterns = Vec::new();
    for counter in first..(1u32 << width) {
        if layout.shape().has_floor_ceiling() && counter != first && counter & top_two == top_two {
            break;
        }
        patterns.push(expand(&active, counter));
    }
    patterns
}

fn compress(active: &[usize], pattern: &SignPattern) -> u32 {
    active
        .iter()
        .enumerate()
        .filter(|(_, slot)| pattern.is_negative(**slot))
        .fold(0, |acc, (bit, _)| acc | (1 << bit))
}

fn expand(active: &[usize], counter: u32) -> SignPattern {
    let mut negative = [false; SLOT_COUNT];
    for (bit, &slot) in active.iter().enumerate() {
        negative[slot] = counter & (1 << bit) != 0;
    }
    SignPattern::new(negative)
}

/// Fit `layout` under every sign pattern the configuration asks for and keep
/// the best result.
///
/// Every pattern starts from the configured seed. A later pattern replaces the
/// kept result only if it strictly improves the log-likelihood. Cancellation
/// ends the sweep after the pattern in progress.
pub fn explore_signs(
    dataset: &Dataset,
    layout: ShapeLayout,
    config: &FitConfig,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> Option<FitResult> {
    let options = ScheduleOptions::from(config);
    let patterns = sign_patterns(&layout, config.sign_pattern, config.sweep_signs);
    let mut best: Option<FitResult> = None;

    for signs in patterns {
        if config.sweep_signs {
            info!(
                "{}: trying sign pattern {:08b}",
                layout.shape().display_name(),
                signs.bits()
            );
        }
        let evaluator = CandidateEvaluator::new(dataset, layout, signs);
        let outcome = ascend(&evaluator, &config.seed, options, cancel, observer);
        let result = to_fit_result(&evaluator, &outcome);

        if best
            .as_ref()
            .is_none_or(|b| result.log_likelihood > b.log_likelihood)
        {
            best = Some(result);
        }
        if cancel.is_cancelled() {
            break;
        }
    }
    best
}

fn to_fit_result(evaluator: &CandidateEvaluator<'_>, outcome: &AscentOutcome) -> FitResult {
    let layout = evaluator.layout();
    FitResult {
        shape: layout.shape(),
        signs: evaluator.signs(),
        degree: layout.degree(),
        exponents: *outcome.center.exponents(),
        coefficients: evaluator.coefficients(&outcome.center),
        log_likelihood: outcome.score,
        status: outcome.status,
        steps: outcome.steps,
    }
}
