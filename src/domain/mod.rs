//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations and the validated `Dataset`
//! - function shapes, sign patterns and coefficient vectors
//! - fit outputs (`FitResult`) and the run configuration (`FitConfig`)

pub mod types;

pub use types::*;
