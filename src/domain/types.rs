//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - shared read-only across evaluation workers during fitting
//! - exported to JSON
//! - compared in tests without touching the search machinery

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Number of coefficient slots (`b0..b7`) every shape is expressed over.
pub const SLOT_COUNT: usize = 8;

/// Smallest accepted polynomial order (degree).
pub const MIN_POLYNOMIAL_ORDER: usize = 2;

/// Largest accepted polynomial order (degree).
pub const MAX_POLYNOMIAL_ORDER: usize = 7;

/// Highest polynomial degree a floor-and-ceiling shape can use; slots 6 and 7
/// carry the floor and ceiling instead.
pub const FLOOR_CEILING_MAX_DEGREE: usize = 5;

pub const FLOOR_SLOT: usize = 6;
pub const CEILING_SLOT: usize = 7;

/// Exponent pinned into slots that take no part in a shape.
///
/// `10^-400` underflows to `0.0`, so a pinned slot contributes nothing.
pub const INACTIVE_EXPONENT: f64 = -400.0;

/// Starting exponents for `b0..b7`.
///
/// Both the speed of the search and the local maximum it settles in depend on
/// these values.
pub const DEFAULT_SEED_EXPONENTS: [f64; SLOT_COUNT] = [
    -13.9234, -2.5907, -4.4888, -18.2855, -22.5474, -78.2407, -82.5504, -87.5504,
];

/// Age at which significance pruning compares model predictions.
pub const DEFAULT_REFERENCE_AGE: f64 = 100.0;

/// One subject: age and whether the outcome was death.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub age: f64,
    pub died: bool,
}

/// A validated, non-empty, read-only set of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Build a dataset from two parallel sequences.
    pub fn new(ages: &[f64], died: &[bool]) -> Result<Self, FitError> {
        if ages.len() != died.len() {
            return Err(FitError::LengthMismatch {
                ages: ages.len(),
                outcomes: died.len(),
            });
        }
        let observations = ages
            .iter()
            .zip(died.iter())
            .map(|(&age, &died)| Observation { age, died })
            .collect();
        Self::from_observations(observations)
    }

    pub fn from_observations(observations: Vec<Observation>) -> Result<Self, FitError> {
        if observations.is_empty() {
            return Err(FitError::EmptyDataset);
        }
        if let Some((index, obs)) = observations
            .iter()
            .enumerate()
            .find(|(_, o)| !(o.age.is_finite() && o.age >= 0.0))
        {
            return Err(FitError::InvalidAge {
                index,
                age: obs.age,
            });
        }
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn stats(&self) -> DatasetStats {
        let deaths = self.observations.iter().filter(|o| o.died).count();
        let (age_min, age_max) = self
            .observations
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| {
                (lo.min(o.age), hi.max(o.age))
            });
        DatasetStats {
            n: self.observations.len(),
            deaths,
            death_rate: deaths as f64 / self.observations.len() as f64,
            age_min,
            age_max,
        }
    }
}

/// Summary statistics of a dataset (for reporting).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n: usize,
    pub deaths: usize,
    pub death_rate: f64,
    pub age_min: f64,
    pub age_max: f64,
}

/// Sigmoid-like link applied to `ln P(age)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Erf,
    Tanh,
    Gudermannian,
    AlgebraicSqrt,
    AlgebraicAbs,
}

impl LinkKind {
    pub const ALL: [LinkKind; 5] = [
        LinkKind::Erf,
        LinkKind::Tanh,
        LinkKind::Gudermannian,
        LinkKind::AlgebraicSqrt,
        LinkKind::AlgebraicAbs,
    ];

    fn index(self) -> u8 {
        match self {
            LinkKind::Erf => 0,
            LinkKind::Tanh => 1,
            LinkKind::Gudermannian => 2,
            LinkKind::AlgebraicSqrt => 3,
            LinkKind::AlgebraicAbs => 4,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LinkKind::Erf => "Erf-derived function",
            LinkKind::Tanh => "Logistic-derived function",
            LinkKind::Gudermannian => "Gudermannian-derived function",
            LinkKind::AlgebraicSqrt => "Algebraic function derived from x over sqrt(1 + x^2)",
            LinkKind::AlgebraicAbs => "Algebraic function derived from x over (1 + abs(x))",
        }
    }
}

/// One of the ten fitted function shapes.
///
/// A floor-and-ceiling shape reassigns slot 6 to the floor and slot 7 to the
/// ceiling, so its polynomial is limited to `b0..b5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionShape {
    Plain(LinkKind),
    FloorCeiling(LinkKind),
}

impl FunctionShape {
    /// All shapes in id order.
    pub const ALL: [FunctionShape; 10] = [
        FunctionShape::Plain(LinkKind::Erf),
        FunctionShape::FloorCeiling(LinkKind::Erf),
        FunctionShape::Plain(LinkKind::Tanh),
        FunctionShape::FloorCeiling(LinkKind::Tanh),
        FunctionShape::Plain(LinkKind::Gudermannian),
        FunctionShape::FloorCeiling(LinkKind::Gudermannian),
        FunctionShape::Plain(LinkKind::AlgebraicSqrt),
        FunctionShape::FloorCeiling(LinkKind::AlgebraicSqrt),
        FunctionShape::Plain(LinkKind::AlgebraicAbs),
        FunctionShape::FloorCeiling(LinkKind::AlgebraicAbs),
    ];

    pub fn from_id(id: u8) -> Result<Self, FitError> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(FitError::UnknownShape(id))
    }

    /// Shape id: `2 * link + 1` for floor-and-ceiling shapes, `2 * link` otherwise.
    pub fn id(self) -> u8 {
        match self {
            FunctionShape::Plain(link) => 2 * link.index(),
            FunctionShape::FloorCeiling(link) => 2 * link.index() + 1,
        }
    }

    pub fn link(self) -> LinkKind {
        match self {
            FunctionShape::Plain(link) | FunctionShape::FloorCeiling(link) => link,
        }
    }

    pub fn has_floor_ceiling(self) -> bool {
        matches!(self, FunctionShape::FloorCeiling(_))
    }

    /// Whether a winning fit of this shape can be trusted to rise with age.
    ///
    /// Gudermannian-derived fits can win by fitting noise with a curve that
    /// is not monotonic in age, which is invalid for a mortality risk curve.
    pub fn is_monotonic(self) -> bool {
        self.link() != LinkKind::Gudermannian
    }

    pub fn display_name(self) -> String {
        match self {
            FunctionShape::Plain(link) => link.display_name().to_string(),
            FunctionShape::FloorCeiling(link) => {
                format!("{} with floor and ceiling", link.display_name())
            }
        }
    }

    pub fn max_degree(self) -> usize {
        match self {
            FunctionShape::Plain(_) => MAX_POLYNOMIAL_ORDER,
            FunctionShape::FloorCeiling(_) => FLOOR_CEILING_MAX_DEGREE,
        }
    }
}

/// Per-slot sign selection (true means the coefficient is negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SignPattern([bool; SLOT_COUNT]);

impl SignPattern {
    pub const ALL_POSITIVE: SignPattern = SignPattern([false; SLOT_COUNT]);

    pub fn new(negative: [bool; SLOT_COUNT]) -> Self {
        Self(negative)
    }

    /// Decode an 8-bit mask (bit `k` set means slot `k` is negative).
    pub fn from_bits(bits: u8) -> Self {
        let mut negative = [false; SLOT_COUNT];
        for (slot, flag) in negative.iter_mut().enumerate() {
            *flag = bits & (1 << slot) != 0;
        }
        Self(negative)
    }

    pub fn bits(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, negative)| **negative)
            .fold(0u8, |acc, (slot, _)| acc | (1 << slot))
    }

    pub fn is_negative(&self, slot: usize) -> bool {
        self.0[slot]
    }

    pub fn with_negative(mut self, slot: usize, negative: bool) -> Self {
        self.0[slot] = negative;
        self
    }

    /// `-1.0` for a negative slot, `1.0` otherwise.
    pub fn sign(&self, slot: usize) -> f64 {
        if self.0[slot] { -1.0 } else { 1.0 }
    }
}

/// Working coefficients in base-10 exponent space (`|b_k| = 10^exponent_k`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientVector {
    exponents: [f64; SLOT_COUNT],
}

impl Default for CoefficientVector {
    fn default() -> Self {
        Self::new(DEFAULT_SEED_EXPONENTS)
    }
}

impl CoefficientVector {
    pub fn new(exponents: [f64; SLOT_COUNT]) -> Self {
        Self { exponents }
    }

    pub fn exponents(&self) -> &[f64; SLOT_COUNT] {
        &self.exponents
    }

    pub fn exponent(&self, slot: usize) -> f64 {
        self.exponents[slot]
    }

    /// Move every slot by `offset * step` in exponent space.
    ///
    /// A zero offset leaves the exponent bit-for-bit unchanged.
    pub fn shifted(&self, offsets: &[i8; SLOT_COUNT], step: f64) -> Self {
        let mut exponents = self.exponents;
        for (e, &o) in exponents.iter_mut().zip(offsets.iter()) {
            if o != 0 {
                *e += f64::from(o) * step;
            }
        }
        Self { exponents }
    }

    fn with_exponent(mut self, slot: usize, exponent: f64) -> Self {
        self.exponents[slot] = exponent;
        self
    }
}

/// A shape together with its effective polynomial degree.
///
/// The layout decides which slots take part in a fit and in which role:
/// polynomial terms `b0..b_K`, plus the floor (`b6`) and ceiling (`b7`) for
/// floor-and-ceiling shapes. Every other slot is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLayout {
    shape: FunctionShape,
    degree: usize,
}

impl ShapeLayout {
    pub fn new(shape: FunctionShape, polynomial_order: usize) -> Result<Self, FitError> {
        if !(MIN_POLYNOMIAL_ORDER..=MAX_POLYNOMIAL_ORDER).contains(&polynomial_order) {
            return Err(FitError::PolynomialOrder(polynomial_order));
        }
        Ok(Self {
            shape,
            degree: polynomial_order.min(shape.max_degree()),
        })
    }

    pub(crate) fn from_parts(shape: FunctionShape, degree: usize) -> Self {
        Self {
            shape,
            degree: degree.min(shape.max_degree()),
        }
    }

    pub fn shape(&self) -> FunctionShape {
        self.shape
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn is_active(&self, slot: usize) -> bool {
        slot <= self.degree
            || (self.shape.has_floor_ceiling() && (slot == FLOOR_SLOT || slot == CEILING_SLOT))
    }

    pub fn active_slots(&self) -> [bool; SLOT_COUNT] {
        let mut active = [false; SLOT_COUNT];
        for (slot, flag) in active.iter_mut().enumerate() {
            *flag = self.is_active(slot);
        }
        active
    }

    /// Active slot indices in ascending order.
    pub fn active_slot_indices(&self) -> Vec<usize> {
        (0..SLOT_COUNT).filter(|&s| self.is_active(s)).collect()
    }

    /// Pin every inactive slot to `INACTIVE_EXPONENT`.
    pub fn pin_inactive(&self, coefficients: &CoefficientVector) -> CoefficientVector {
        (0..SLOT_COUNT)
            .filter(|&s| !self.is_active(s))
            .fold(*coefficients, |c, s| c.with_exponent(s, INACTIVE_EXPONENT))
    }

    /// Actual coefficients `sign * 10^exponent`; inactive slots are exactly zero.
    pub fn signed_coefficients(
        &self,
        coefficients: &CoefficientVector,
        signs: &SignPattern,
    ) -> [f64; SLOT_COUNT] {
        let mut out = [0.0; SLOT_COUNT];
        for (slot, value) in out.iter_mut().enumerate() {
            if self.is_active(slot) {
                *value = signs.sign(slot) * 10f64.powf(coefficients.exponent(slot));
            }
        }
        out
    }
}

/// How a single (shape, sign pattern) search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Converged at the finest precision level.
    Converged,
    /// Stopped early by cancellation; the result is the best point found so far.
    Cancelled,
    /// Stopped early because the step budget ran out.
    StepBudgetExhausted,
}

/// Result of fitting one shape with one sign pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub shape: FunctionShape,
    pub signs: SignPattern,
    pub degree: usize,
    /// Fitted exponents (`|b_k| = 10^exponent_k`).
    pub exponents: [f64; SLOT_COUNT],
    /// Actual coefficients with signs applied (pruned slots are zero).
    pub coefficients: [f64; SLOT_COUNT],
    pub log_likelihood: f64,
    pub status: SearchStatus,
    pub steps: usize,
}

impl FitResult {
    pub fn layout(&self) -> ShapeLayout {
        ShapeLayout::from_parts(self.shape, self.degree)
    }

    /// Modelled probability of death at `age`, or `None` where the
    /// polynomial is not positive.
    pub fn probability(&self, age: f64) -> Option<f64> {
        crate::models::probability(&self.layout(), age, &self.coefficients)
    }

    pub fn is_partial(&self) -> bool {
        self.status != SearchStatus::Converged
    }
}

/// A full run's configuration as understood by the fitting pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Shapes to fit.
    pub shapes: Vec<FunctionShape>,
    /// Starting (sweep) or only (fixed) sign pattern.
    pub sign_pattern: SignPattern,
    /// Sweep sign patterns instead of using `sign_pattern` alone.
    pub sweep_signs: bool,
    /// Polynomial degree; floor-and-ceiling shapes cap it at 5.
    pub polynomial_order: usize,
    /// Starting point of every (shape, sign pattern) search.
    pub seed: CoefficientVector,
    /// Finest precision level (step `10^-max_precision`).
    pub max_precision: u32,
    /// Consecutive identical moves tolerated before coarsening the precision.
    pub stagnation_limit: usize,
    /// Step budget for a single (shape, sign pattern) search.
    pub max_steps: usize,
    /// Age at which significance pruning compares predictions.
    pub reference_age: f64,
    /// Worker pool size (`None` uses one worker per CPU).
    pub threads: Option<usize>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            shapes: FunctionShape::ALL.to_vec(),
            sign_pattern: SignPattern::ALL_POSITIVE,
            sweep_signs: false,
            polynomial_order: MAX_POLYNOMIAL_ORDER,
            seed: CoefficientVector::default(),
            max_precision: 4,
            stagnation_limit: 25,
            max_steps: 100_000,
            reference_age: DEFAULT_REFERENCE_AGE,
            threads: None,
        }
    }
}

impl FitConfig {
    /// Resolve shape ids into shapes (ascending, deduplicated).
    pub fn shapes_from_ids(ids: &[u8]) -> Result<Vec<FunctionShape>, FitError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().map(FunctionShape::from_id).collect()
    }

    /// Fail fast on settings the search cannot run with.
    pub fn validate(&self) -> Result<(), FitError> {
        if self.shapes.is_empty() {
            return Err(FitError::NoShapes);
        }
        if !(MIN_POLYNOMIAL_ORDER..=MAX_POLYNOMIAL_ORDER).contains(&self.polynomial_order) {
            return Err(FitError::PolynomialOrder(self.polynomial_order));
        }
        if self.seed.exponents().iter().any(|e| !e.is_finite()) {
            return Err(FitError::InvalidSetting(
                "seed exponents must be finite".to_string(),
            ));
        }
        if self.max_precision > 15 {
            return Err(FitError::InvalidSetting(format!(
                "max_precision {} is finer than f64 exponents can resolve",
                self.max_precision
            )));
        }
        if self.max_steps == 0 {
            return Err(FitError::InvalidSetting("max_steps must be > 0".to_string()));
        }
        if self.stagnation_limit == 0 {
            return Err(FitError::InvalidSetting(
                "stagnation_limit must be > 0".to_string(),
            ));
        }
        if !(self.reference_age.is_finite() && self.reference_age >= 0.0) {
            return Err(FitError::InvalidSetting(format!(
                "reference_age {} must be finite and >= 0",
                self.reference_age
            )));
        }
        if self.threads == Some(0) {
            return Err(FitError::InvalidSetting("threads must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_rejects_bad_input() {
        assert_eq!(
            Dataset::new(&[1.0, 2.0], &[true]).unwrap_err(),
            FitError::LengthMismatch {
                ages: 2,
                outcomes: 1
            }
        );
        assert_eq!(Dataset::new(&[], &[]).unwrap_err(), FitError::EmptyDataset);
        assert!(matches!(
            Dataset::new(&[10.0, -1.0], &[true, false]).unwrap_err(),
            FitError::InvalidAge { index: 1, .. }
        ));
    }

    #[test]
    fn dataset_stats() {
        let ds = Dataset::new(&[10.0, 20.0, 30.0, 40.0], &[false, false, true, true]).unwrap();
        let stats = ds.stats();
        assert_eq!(stats.n, 4);
        assert_eq!(stats.deaths, 2);
        assert!((stats.death_rate - 0.5).abs() < 1e-12);
        assert_eq!(stats.age_min, 10.0);
        assert_eq!(stats.age_max, 40.0);
    }

    #[test]
    fn shape_ids_round_trip_in_order() {
        for (i, shape) in FunctionShape::ALL.iter().enumerate() {
            assert_eq!(shape.id() as usize, i);
            assert_eq!(FunctionShape::from_id(i as u8).unwrap(), *shape);
            assert_eq!(shape.has_floor_ceiling(), i % 2 == 1);
        }
        assert_eq!(FunctionShape::from_id(10), Err(FitError::UnknownShape(10)));
    }

    #[test]
    fn only_gudermannian_shapes_are_non_monotonic() {
        let non_monotonic: Vec<u8> = FunctionShape::ALL
            .iter()
            .filter(|s| !s.is_monotonic())
            .map(|s| s.id())
            .collect();
        assert_eq!(non_monotonic, vec![4, 5]);
    }

    #[test]
    fn sign_pattern_bits() {
        let p = SignPattern::from_bits(0b1000_0101);
        assert!(p.is_negative(0));
        assert!(!p.is_negative(1));
        assert!(p.is_negative(2));
        assert!(p.is_negative(7));
        assert_eq!(p.bits(), 0b1000_0101);
        assert_eq!(p.sign(0), -1.0);
        assert_eq!(p.sign(1), 1.0);
        assert_eq!(SignPattern::ALL_POSITIVE.bits(), 0);
        assert_eq!(p.with_negative(0, false).bits(), 0b1000_0100);
    }

    #[test]
    fn layout_roles() {
        let plain = ShapeLayout::new(FunctionShape::Plain(LinkKind::Tanh), 2).unwrap();
        assert_eq!(plain.degree(), 2);
        assert_eq!(plain.active_slot_indices(), vec![0, 1, 2]);

        let fc = ShapeLayout::new(FunctionShape::FloorCeiling(LinkKind::Erf), 7).unwrap();
        assert_eq!(fc.degree(), 5);
        assert_eq!(fc.active_slot_indices(), vec![0, 1, 2, 3, 4, 5, 6, 7]);

        let fc_low = ShapeLayout::new(FunctionShape::FloorCeiling(LinkKind::Erf), 3).unwrap();
        assert_eq!(fc_low.active_slot_indices(), vec![0, 1, 2, 3, 6, 7]);

        assert_eq!(
            ShapeLayout::new(FunctionShape::Plain(LinkKind::Erf), 8).unwrap_err(),
            FitError::PolynomialOrder(8)
        );
        assert_eq!(
            ShapeLayout::new(FunctionShape::Plain(LinkKind::Erf), 1).unwrap_err(),
            FitError::PolynomialOrder(1)
        );
    }

    #[test]
    fn pinned_slots_contribute_zero() {
        let layout = ShapeLayout::new(FunctionShape::Plain(LinkKind::Tanh), 2).unwrap();
        let pinned = layout.pin_inactive(&CoefficientVector::default());
        assert_eq!(pinned.exponent(0), DEFAULT_SEED_EXPONENTS[0]);
        assert_eq!(pinned.exponent(5), INACTIVE_EXPONENT);
        assert_eq!(10f64.powf(INACTIVE_EXPONENT), 0.0);

        let signs = SignPattern::from_bits(0b0000_0010);
        let coeffs = layout.signed_coefficients(&CoefficientVector::new([0.0; 8]), &signs);
        assert_eq!(coeffs, [1.0, -1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn shifted_leaves_zero_offsets_untouched() {
        let c = CoefficientVector::default();
        let moved = c.shifted(&[0, 1, -1, 0, 0, 0, 0, 0], 0.1);
        assert_eq!(moved.exponent(0).to_bits(), c.exponent(0).to_bits());
        assert!((moved.exponent(1) - (c.exponent(1) + 0.1)).abs() < 1e-12);
        assert!((moved.exponent(2) - (c.exponent(2) - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn config_validation() {
        assert!(FitConfig::default().validate().is_ok());
        let bad_order = FitConfig {
            polynomial_order: 9,
            ..FitConfig::default()
        };
        assert_eq!(bad_order.validate(), Err(FitError::PolynomialOrder(9)));
        let no_shapes = FitConfig {
            shapes: vec![],
            ..FitConfig::default()
        };
        assert_eq!(no_shapes.validate(), Err(FitError::NoShapes));
        let no_stagnation = FitConfig {
            stagnation_limit: 0,
            ..FitConfig::default()
        };
        assert!(matches!(
            no_stagnation.validate(),
            Err(FitError::InvalidSetting(_))
        ));
        assert_eq!(
            FitConfig::shapes_from_ids(&[3, 1, 3]).unwrap(),
            vec![
                FunctionShape::FloorCeiling(LinkKind::Erf),
                FunctionShape::FloorCeiling(LinkKind::Tanh)
            ]
        );
    }
}
