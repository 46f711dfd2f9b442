//! Synthetic mortality samples with a known risk curve.
//!
//! Used by the `demo` subcommand and by tests that need data whose true
//! shape is known in advance.

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, Observation};
use crate::error::FitError;

/// True probability of death as a function of age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RiskCurve {
    /// Certain death at or above `threshold`, certain survival below it.
    Step { threshold: f64 },
    /// `1 / (1 + exp(-(age - midpoint) / scale))`.
    Logistic { midpoint: f64, scale: f64 },
    /// Same risk at every age.
    Constant { rate: f64 },
}

impl RiskCurve {
    pub fn probability(&self, age: f64) -> f64 {
        match *self {
            RiskCurve::Step { threshold } => {
                if age >= threshold {
                    1.0
                } else {
                    0.0
                }
            }
            RiskCurve::Logistic { midpoint, scale } => 1.0 / (1.0 + (-(age - midpoint) / scale).exp()),
            RiskCurve::Constant { rate } => rate,
        }
    }

    fn validate(&self) -> Result<(), FitError> {
        let ok = match *self {
            RiskCurve::Step { threshold } => threshold.is_finite(),
            RiskCurve::Logistic { midpoint, scale } => {
                midpoint.is_finite() && scale.is_finite() && scale > 0.0
            }
            RiskCurve::Constant { rate } => (0.0..=1.0).contains(&rate),
        };
        if ok {
            Ok(())
        } else {
            Err(FitError::InvalidSetting(format!("Invalid risk curve {self:?}.")))
        }
    }
}

/// Parameters of a synthetic sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSpec {
    pub count: usize,
    pub age_min: f64,
    pub age_max: f64,
    pub curve: RiskCurve,
    pub seed: u64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            count: 400,
            age_min: 0.0,
            age_max: 100.0,
            curve: RiskCurve::Logistic {
                midpoint: 60.0,
                scale: 8.0,
            },
            seed: 42,
        }
    }
}

impl SampleSpec {
    fn validate(&self) -> Result<(), FitError> {
        if self.count == 0 {
            return Err(FitError::InvalidSetting("Sample count must be > 0.".to_string()));
        }
        if !(self.age_min.is_finite()
            && self.age_max.is_finite()
            && self.age_min >= 0.0
            && self.age_max > self.age_min)
        {
            return Err(FitError::InvalidSetting(format!(
                "Invalid age range [{}, {}] for sample generation.",
                self.age_min, self.age_max
            )));
        }
        self.curve.validate()
    }
}

/// Draw `spec.count` subjects with uniform ages and outcomes from the curve.
///
/// The same spec (including the seed) always yields the same dataset.
pub fn generate_sample(spec: &SampleSpec) -> Result<Dataset, FitError> {
    spec.validate()?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let observations = (0..spec.count)
        .map(|_| {
            let age = rng.gen_range(spec.age_min..=spec.age_max);
            let roll: f64 = rng.r#gen();
            Observation {
                age,
                died: roll < spec.curve.probability(age),
            }
        })
        .collect();
    Dataset::from_observations(observations)
}

/// Evenly spaced ages with a hard threshold; no randomness involved.
pub fn step_dataset(count: usize, age_min: f64, age_max: f64, threshold: f64) -> Result<Dataset, FitError> {
    let spec = SampleSpec {
        count,
        age_min,
        age_max,
        curve: RiskCurve::Step { threshold },
        seed: 0,
    };
    spec.validate()?;

    let span = age_max - age_min;
    let observations = (0..count)
        .map(|i| {
            let age = if count == 1 {
                age_min
            } else {
                age_min + span * i as f64 / (count - 1) as f64
            };
            Observation {
                age,
                died: age >= threshold,
            }
        })
        .collect();
    Dataset::from_observations(observations)
}
