//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - run export to JSON (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
