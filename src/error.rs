use thiserror::Error;

/// Errors raised by the fitting library.
///
/// Only invalid input and configuration are errors. Parameter-space regions
/// that produce invalid probabilities are scored, not reported, and a
/// cancelled search yields a labelled partial result instead of failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("Ages and outcomes differ in length: {ages} ages vs {outcomes} outcomes.")]
    LengthMismatch { ages: usize, outcomes: usize },
    #[error("The dataset is empty.")]
    EmptyDataset,
    #[error("Observation {index} has an invalid age {age} (must be finite and >= 0).")]
    InvalidAge { index: usize, age: f64 },
    #[error("Polynomial order must be between 2 and 7, but was {0}.")]
    PolynomialOrder(usize),
    #[error("Unknown function shape id {0} (valid ids are 0..=9).")]
    UnknownShape(u8),
    #[error("No function shapes are enabled.")]
    NoShapes,
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
    #[error("Failed to build the worker pool: {0}")]
    ThreadPool(String),
    #[error("The fit was cancelled before any function shape produced a result.")]
    Cancelled,
}

/// Process-level error carrying the exit code of the `deathcurve` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::Cancelled => 3,
            FitError::ThreadPool(_) => 4,
            _ => 2,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
