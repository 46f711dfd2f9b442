//! Function-shape selection by maximum likelihood.
//!
//! The selector fits every enabled shape (ascending id order), prunes
//! coefficients that make no difference at the reference age, and picks the
//! shape with the highest log-likelihood.
//!
//! Selection rules:
//! 1. The best fit is the first one (in id order) reaching the maximal
//!    log-likelihood.
//! 2. Gudermannian-derived shapes can win by fitting noise with a curve that
//!    does not rise with age. When one wins, the best of the remaining
//!    (monotonic) shapes is reported as `second_best` as well.

use log::{info, warn};
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, FitConfig, FitResult, FunctionShape, SLOT_COUNT, ShapeLayout};
use crate::error::FitError;
use crate::fit::cancel::CancellationToken;
use crate::fit::scheduler::{NoProgress, ProgressObserver};
use crate::fit::signs::explore_signs;
use crate::models::{probability, total_log_likelihood};

/// Output of fitting + selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSelection {
    pub best: FitResult,
    /// Best monotonic fit, reported only when `best` may not be monotonic.
    pub second_best: Option<FitResult>,
    /// Pruned results for every shape that was fitted, in id order.
    pub fits: Vec<FitResult>,
    /// True when the run was cancelled; some shapes may be missing or partial.
    pub cancelled: bool,
}

/// Fit every enabled shape and select the best one.
pub fn fit_and_select(
    dataset: &Dataset,
    config: &FitConfig,
    cancel: &CancellationToken,
) -> Result<FitSelection, FitError> {
    fit_and_select_observed(dataset, config, cancel, &NoProgress)
}

/// Same as [`fit_and_select`], reporting every converged precision level to
/// `observer`.
pub fn fit_and_select_observed(
    dataset: &Dataset,
    config: &FitConfig,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> Result<FitSelection, FitError> {
    config.validate()?;

    let mut shapes = config.shapes.clone();
    shapes.sort_by_key(|s| s.id());
    shapes.dedup();

    match config.threads {
        Some(threads) => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| FitError::ThreadPool(e.to_string()))?;
            pool.install(|| fit_shapes(dataset, &shapes, config, cancel, observer))
        }
        None => fit_shapes(dataset, &shapes, config, cancel, observer),
    }
}

fn fit_shapes(
    dataset: &Dataset,
    shapes: &[FunctionShape],
    config: &FitConfig,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> Result<FitSelection, FitError> {
    let mut fits = Vec::with_capacity(shapes.len());
    for &shape in shapes {
        if cancel.is_cancelled() {
            break;
        }
        let layout = ShapeLayout::new(shape, config.polynomial_order)?;
        info!("Started fitting the mortality data to {}", shape.display_name());

        if let Some(fit) = explore_signs(dataset, layout, config, cancel, observer) {
            let fit = prune_insignificant(&fit, dataset, config.reference_age);
            info!(
                "{}: log-likelihood {:.10} after {} steps ({:?})",
                shape.display_name(),
                fit.log_likelihood,
                fit.steps,
                fit.status
            );
            fits.push(fit);
        }
    }

    let cancelled = cancel.is_cancelled();
    if fits.is_empty() {
        return Err(if cancelled {
            FitError::Cancelled
        } else {
            FitError::NoShapes
        });
    }
    if cancelled {
        warn!(
            "Fitting was cancelled; reporting {} of {} shapes",
            fits.len(),
            shapes.len()
        );
    }

    let (best, second_best) = choose(&fits);
    info!("Chosen function: {}", best.shape.display_name());
    if let Some(second) = &second_best {
        warn!(
            "{} may not be monotonic in age; second best is {}",
            best.shape.display_name(),
            second.shape.display_name()
        );
    }

    Ok(FitSelection {
        best,
        second_best,
        fits,
        cancelled,
    })
}

/// Best fit (first maximum) and, for non-monotonic winners, the best
/// monotonic one.
///
/// Both Gudermannian shapes (ids 4 and 5) are left out of the second-best
/// pool, so when one of them wins the other is never reported as the
/// alternative.
fn choose(fits: &[FitResult]) -> (FitResult, Option<FitResult>) {
    let best = first_max(fits.iter()).cloned().unwrap_or_else(|| fits[0].clone());
    let second_best = if best.shape.is_monotonic() {
        None
    } else {
        first_max(fits.iter().filter(|f| f.shape.is_monotonic())).cloned()
    };
    (best, second_best)
}

fn first_max<'a>(fits: impl Iterator<Item = &'a FitResult>) -> Option<&'a FitResult> {
    fits.fold(None, |best: Option<&FitResult>, f| match best {
        Some(b) if f.log_likelihood <= b.log_likelihood => Some(b),
        _ => Some(f),
    })
}

/// Zero every coefficient whose removal leaves both the modelled probability
/// at `reference_age` and the total log-likelihood over `dataset` unchanged.
///
/// Slots are tried in order against the current (partially pruned) state
/// until a full pass removes nothing, so pruning twice is the same as pruning
/// once. Exponents and the reported log-likelihood are kept as fitted, and the
/// pruned coefficients still score exactly that log-likelihood.
pub fn prune_insignificant(fit: &FitResult, dataset: &Dataset, reference_age: f64) -> FitResult {
    let layout = fit.layout();
    let observations = dataset.observations();
    let mut coefficients = fit.coefficients;
    let mut score = total_log_likelihood(&layout, observations, &coefficients);

    loop {
        let mut changed = false;
        for slot in 0..SLOT_COUNT {
            if coefficients[slot] == 0.0 {
                continue;
            }
            let mut trial = coefficients;
            trial[slot] = 0.0;
            let before = probability(&layout, reference_age, &coefficients);
            let after = probability(&layout, reference_age, &trial);
            if !same_probability(before, after) {
                continue;
            }
            let trial_score = total_log_likelihood(&layout, observations, &trial);
            if trial_score.to_bits() == score.to_bits() {
                coefficients = trial;
                score = trial_score;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    FitResult {
        coefficients,
        ..fit.clone()
    }
}

fn same_probability(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
        (None, None) => true,
        _ => false,
    }
}
