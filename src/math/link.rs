//! Sigmoid-like link functions.
//!
//! Every link maps the real line onto `(-1, 1)` and is odd and increasing:
//!
//! - `erf(t)`
//! - `tanh(t)`
//! - `atan(tanh(t)) * 4/π` (Gudermannian-derived)
//! - `t / sqrt(1 + t^2)`
//! - `t / (1 + |t|)`
//!
//! Numerical notes:
//! - `t / sqrt(1 + t^2)` is evaluated as `t / hypot(1, t)` so that `t^2` cannot
//!   overflow for large `|t|`.
//! - erf and tanh saturate to exactly `±1.0` in f64 for moderate `|t|`; the
//!   likelihood layer treats the resulting zero probabilities as domain
//!   violations.

use std::f64::consts::FRAC_1_PI;

use statrs::function::erf::erf;

use crate::domain::LinkKind;

/// Apply `kind` to `t`.
pub fn apply_link(kind: LinkKind, t: f64) -> f64 {
    match kind {
        LinkKind::Erf => erf(t),
        LinkKind::Tanh => t.tanh(),
        LinkKind::Gudermannian => t.tanh().atan() * 4.0 * FRAC_1_PI,
        LinkKind::AlgebraicSqrt => t / 1f64.hypot(t),
        LinkKind::AlgebraicAbs => t / (1.0 + t.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_odd_and_bounded() {
        for kind in LinkKind::ALL {
            assert_eq!(apply_link(kind, 0.0), 0.0, "{kind:?} at 0");
            for &t in &[0.1, 0.5, 1.0, 3.0, 10.0, 1e6] {
                let up = apply_link(kind, t);
                let down = apply_link(kind, -t);
                assert!(up > 0.0 && up <= 1.0, "{kind:?}({t}) = {up}");
                assert!((up + down).abs() < 1e-12, "{kind:?} not odd at {t}");
            }
        }
    }

    #[test]
    fn links_are_increasing() {
        for kind in LinkKind::ALL {
            let mut prev = apply_link(kind, -5.0);
            for i in 1..=100 {
                let t = -5.0 + i as f64 * 0.1;
                let v = apply_link(kind, t);
                assert!(v >= prev, "{kind:?} decreasing at {t}");
                prev = v;
            }
        }
    }

    #[test]
    fn gudermannian_scaling_reaches_unit_asymptote() {
        // atan(tanh(t)) tends to π/4, so the scaled link tends to 1.
        let v = apply_link(LinkKind::Gudermannian, 50.0);
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn algebraic_sqrt_survives_huge_inputs() {
        let v = apply_link(LinkKind::AlgebraicSqrt, 1e200);
        assert!((v - 1.0).abs() < 1e-12);
    }
}
