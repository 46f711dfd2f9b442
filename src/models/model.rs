//! Likelihood model for the ten function shapes.
//!
//! The fitter relies on two primitive operations:
//! - the modelled probability of death at an age, given actual coefficients
//! - the log-likelihood contribution of one observation
//!
//! Both dispatch on the shape through `ShapeLayout`; there is no per-shape
//! function table.

use crate::domain::{CEILING_SLOT, FLOOR_SLOT, Observation, SLOT_COUNT, ShapeLayout};
use crate::math::{apply_link, polynomial};

/// Score of anything that does not represent a probability.
///
/// Every valid log-likelihood term is `<= 0`, so this is the worst possible
/// value and the search moves away from it.
pub const DOMAIN_PENALTY: f64 = -f64::MAX;

/// Modelled probability of death at `age`.
///
/// Returns `None` when `P(age)` is not strictly positive (its logarithm is
/// undefined). The returned value is not clamped: floor-and-ceiling shapes can
/// leave `(0, 1]` and the likelihood treats that as a domain violation.
pub fn probability(layout: &ShapeLayout, age: f64, coefficients: &[f64; SLOT_COUNT]) -> Option<f64> {
    let p_age = polynomial(age, &coefficients[..=layout.degree()]);
    if !(p_age.is_finite() && p_age > 0.0) {
        return None;
    }
    let s = apply_link(layout.shape().link(), p_age.ln());

    let p = if layout.shape().has_floor_ceiling() {
        let floor = coefficients[FLOOR_SLOT];
        let ceiling = coefficients[CEILING_SLOT];
        s * (0.5 - ceiling) + 0.5 - ceiling + floor
    } else {
        s * 0.5 + 0.5
    };
    p.is_finite().then_some(p)
}

/// Log-likelihood of a single observation.
///
/// `ln p` for a death, `ln(1 - p)` otherwise; `DOMAIN_PENALTY` whenever the
/// argument of the logarithm falls outside `(0, 1]`.
pub fn log_likelihood(layout: &ShapeLayout, age: f64, died: bool, coefficients: &[f64; SLOT_COUNT]) -> f64 {
    let Some(p) = probability(layout, age, coefficients) else {
        return DOMAIN_PENALTY;
    };
    verified_ln(if died { p } else { 1.0 - p })
}

/// Sum of per-observation log-likelihoods.
///
/// A single domain violation makes the whole candidate score `DOMAIN_PENALTY`,
/// so the result is always finite and `<= 0`.
pub fn total_log_likelihood(
    layout: &ShapeLayout,
    observations: &[Observation],
    coefficients: &[f64; SLOT_COUNT],
) -> f64 {
    let mut total = 0.0;
    for obs in observations {
        let term = log_likelihood(layout, obs.age, obs.died, coefficients);
        if term == DOMAIN_PENALTY {
            return DOMAIN_PENALTY;
        }
        total += term;
    }
    if total.is_finite() { total } else { DOMAIN_PENALTY }
}

fn verified_ln(x: f64) -> f64 {
    if x > 0.0 && x <= 1.0 {
        x.ln()
    } else {
        DOMAIN_PENALTY
    }
}
