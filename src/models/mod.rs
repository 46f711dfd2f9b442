//! Parametric mortality-curve models.
//!
//! Models are implemented as small, pure functions so that the search code can
//! stay generic over the ten shapes.

pub mod model;

pub use model::*;
