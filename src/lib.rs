//! `deathcurve` library crate.
//!
//! The binary (`deathcurve`) is a thin wrapper around this library so that:
//!
//! - the fitting engine is testable without spawning processes
//! - the engine can be embedded without the CLI, CSV or stop-file layers
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
