//! End-to-end fitting scenarios.
//!
//! Coverage
//! --------
//! - `fit::selection`: full runs from a validated dataset to a `FitSelection`,
//!   including pruning, second-best reporting and cancellation.
//! - `fit::signs`: fixed vs sweep sign modes.
//! - `data::sample`: synthetic datasets with a known true curve.
//!
//! Polynomial orders are kept low so the whole file runs quickly; the
//! lattice search itself is covered by unit tests.

use deathcurve::data::{RiskCurve, SampleSpec, generate_sample, step_dataset};
use deathcurve::domain::{Dataset, FitConfig, FitResult, FunctionShape, LinkKind, SignPattern};
use deathcurve::fit::{CancellationToken, ProgressObserver, fit_and_select, fit_and_select_observed};
use deathcurve::models::total_log_likelihood;

fn config_for(shapes: &[u8]) -> FitConfig {
    FitConfig {
        shapes: FitConfig::shapes_from_ids(shapes).unwrap(),
        polynomial_order: 2,
        ..FitConfig::default()
    }
}

/// Log-likelihood of the best constant-risk model (the empirical death rate).
fn flat_log_likelihood(dataset: &Dataset) -> f64 {
    let stats = dataset.stats();
    let r = stats.death_rate;
    stats.n as f64 * (r * r.ln() + (1.0 - r) * (1.0 - r).ln())
}

fn crossing_age(fit: &FitResult) -> Option<f64> {
    (0..=120)
        .map(f64::from)
        .find(|&age| fit.probability(age).is_some_and(|p| p >= 0.5))
}

#[test]
fn step_data_gives_a_rising_curve_crossing_near_the_step() {
    let dataset = step_dataset(100, 0.0, 99.0, 60.0).unwrap();
    let config = config_for(&[2]);

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    let best = &sel.best;
    assert!(!sel.cancelled);
    assert_eq!(best.shape, FunctionShape::Plain(LinkKind::Tanh));
    assert!(!best.is_partial());

    let p30 = best.probability(30.0).unwrap();
    let p90 = best.probability(90.0).unwrap();
    assert!(p30 < 0.5, "p(30) = {p30}");
    assert!(p90 > 0.5, "p(90) = {p90}");

    let crossing = crossing_age(best).expect("curve never reaches 0.5");
    assert!((45.0..=75.0).contains(&crossing), "crossing at {crossing}");

    // Near-perfect separation: far above the constant-risk model.
    assert!(best.log_likelihood <= 0.0);
    assert!(best.log_likelihood > 0.5 * flat_log_likelihood(&dataset));
}

#[test]
fn pruned_coefficients_reproduce_the_reported_log_likelihood() {
    let dataset = step_dataset(100, 0.0, 99.0, 60.0).unwrap();
    let config = config_for(&[2]);

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    for fit in &sel.fits {
        let recomputed = total_log_likelihood(&fit.layout(), dataset.observations(), &fit.coefficients);
        assert_eq!(recomputed, fit.log_likelihood, "{:?}", fit.coefficients);
    }
    for obs in dataset.observations() {
        assert!(sel.best.probability(obs.age).is_some(), "p({}) undefined", obs.age);
    }
}

#[test]
fn coin_flip_data_gives_a_nearly_flat_curve() {
    let spec = SampleSpec {
        count: 400,
        curve: RiskCurve::Constant { rate: 0.5 },
        ..SampleSpec::default()
    };
    let dataset = generate_sample(&spec).unwrap();
    let config = config_for(&[2]);

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    for age in [20.0, 50.0, 80.0] {
        let p = sel.best.probability(age).unwrap();
        assert!((0.3..=0.7).contains(&p), "p({age}) = {p}");
    }
    assert!(sel.best.log_likelihood >= flat_log_likelihood(&dataset) - 1e-3);
}

#[test]
fn coin_flip_data_fits_every_plain_shape_about_equally() {
    let spec = SampleSpec {
        count: 300,
        curve: RiskCurve::Constant { rate: 0.5 },
        seed: 11,
        ..SampleSpec::default()
    };
    let dataset = generate_sample(&spec).unwrap();
    let rate = dataset.stats().death_rate;
    let config = FitConfig {
        max_precision: 2,
        ..config_for(&[0, 2, 4, 6, 8])
    };

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    assert_eq!(sel.fits.len(), 5);
    for fit in &sel.fits {
        let p = fit.probability(50.0).unwrap();
        assert!((p - rate).abs() < 0.1, "{:?}: p(50) = {p}, rate = {rate}", fit.shape);
    }
    let (lo, hi) = sel
        .fits
        .iter()
        .map(|f| f.log_likelihood)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), ll| (lo.min(ll), hi.max(ll)));
    assert!(hi - lo < 2.0, "log-likelihoods range from {lo} to {hi}");
}

#[test]
fn repeated_runs_are_identical() {
    let dataset = generate_sample(&SampleSpec::default()).unwrap();
    let config = FitConfig {
        max_precision: 2,
        ..config_for(&[0, 2])
    };
    let a = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    let b = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    assert_eq!(a, b);
}

/// Cancels the run as soon as the first precision level converges.
struct CancelAfterFirstLevel(CancellationToken);

impl ProgressObserver for CancelAfterFirstLevel {
    fn on_level_converged(&self, _shape: FunctionShape, _precision: u32, _score: f64) {
        self.0.cancel();
    }
}

#[test]
fn cancellation_returns_a_labelled_partial_result() {
    let dataset = step_dataset(100, 0.0, 99.0, 60.0).unwrap();
    let config = config_for(&[0, 2]);

    let cancel = CancellationToken::new();
    let observer = CancelAfterFirstLevel(cancel.clone());
    let partial = fit_and_select_observed(&dataset, &config, &cancel, &observer).unwrap();

    assert!(partial.cancelled);
    assert_eq!(partial.fits.len(), 1, "shapes after the cancellation must not start");
    assert_eq!(partial.best.shape, FunctionShape::Plain(LinkKind::Erf));
    assert!(partial.best.is_partial());
    assert!(partial.best.log_likelihood.is_finite());

    let full = fit_and_select(&dataset, &config_for(&[0]), &CancellationToken::new()).unwrap();
    assert!(!full.cancelled);
    assert!(partial.best.log_likelihood <= full.best.log_likelihood);
}

#[test]
fn fixed_sign_mode_uses_the_given_pattern() {
    let dataset = step_dataset(80, 1.0, 99.0, 50.0).unwrap();
    // A negative intercept keeps P(age) positive for ages >= 1 once it is small.
    let pattern = SignPattern::from_bits(0b001);
    let config = FitConfig {
        sign_pattern: pattern,
        max_precision: 2,
        ..config_for(&[2])
    };

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    assert_eq!(sel.best.signs, pattern);
    assert!(sel.best.coefficients[0] <= 0.0);
    assert!(sel.best.coefficients[1] >= 0.0);
    assert!(sel.best.coefficients[2] >= 0.0);
    assert!(sel.best.log_likelihood > flat_log_likelihood(&dataset));
}

#[test]
fn sign_sweep_is_never_worse_than_its_starting_pattern() {
    let dataset = step_dataset(80, 1.0, 99.0, 50.0).unwrap();
    let fixed = FitConfig {
        max_precision: 2,
        ..config_for(&[2])
    };
    let sweep = FitConfig {
        sweep_signs: true,
        ..fixed.clone()
    };

    let fixed = fit_and_select(&dataset, &fixed, &CancellationToken::new()).unwrap();
    let swept = fit_and_select(&dataset, &sweep, &CancellationToken::new()).unwrap();
    assert!(swept.best.log_likelihood >= fixed.best.log_likelihood);
}

#[test]
fn second_best_is_reported_only_for_non_monotonic_winners() {
    let dataset = generate_sample(&SampleSpec::default()).unwrap();
    let config = FitConfig {
        max_precision: 2,
        ..config_for(&[2, 4])
    };

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    assert_eq!(sel.fits.len(), 2);
    if sel.best.shape.is_monotonic() {
        assert!(sel.second_best.is_none());
    } else {
        let second = sel.second_best.as_ref().expect("missing second best");
        assert_eq!(second.shape, FunctionShape::Plain(LinkKind::Tanh));
    }
    let max = sel
        .fits
        .iter()
        .map(|f| f.log_likelihood)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(sel.best.log_likelihood, max);
}

#[test]
fn floor_and_ceiling_shape_fits_within_the_unit_interval() {
    let dataset = generate_sample(&SampleSpec::default()).unwrap();
    let config = FitConfig {
        max_precision: 1,
        ..config_for(&[3])
    };

    let sel = fit_and_select(&dataset, &config, &CancellationToken::new()).unwrap();
    assert_eq!(sel.best.shape, FunctionShape::FloorCeiling(LinkKind::Tanh));
    assert!(sel.best.log_likelihood.is_finite() && sel.best.log_likelihood <= 0.0);
    for age in [5.0, 30.0, 60.0, 90.0] {
        if let Some(p) = sel.best.probability(age) {
            assert!((0.0..=1.0).contains(&p), "p({age}) = {p}");
        }
    }
}
