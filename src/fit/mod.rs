//! Maximum-likelihood fitting.
//!
//! Responsibilities:
//!
//! - score candidate coefficient vectors against the dataset
//! - climb the likelihood surface with a parallel lattice search
//! - explore coefficient sign patterns per shape
//! - prune and select the best shape

pub mod cancel;
pub mod evaluator;
pub mod lattice;
pub mod scheduler;
pub mod selection;
pub mod signs;
pub mod step;

pub use cancel::*;
pub use evaluator::*;
pub use scheduler::*;
pub use selection::*;
pub use signs::*;
pub use step::*;
