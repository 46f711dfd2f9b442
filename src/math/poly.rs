//! Polynomial evaluation for `P(age) = Σ b_k · age^k`.

/// Evaluate `Σ coefficients[k] · x^k` with Horner's scheme.
pub fn polynomial(x: f64, coefficients: &[f64]) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &b| acc * x + b)
}
