//! Synthetic mortality data.

pub mod sample;

pub use sample::*;
