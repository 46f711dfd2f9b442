//! Mathematical utilities: link functions and polynomial evaluation.

pub mod link;
pub mod poly;

pub use link::*;
pub use poly::*;
