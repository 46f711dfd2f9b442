//! Run export to JSON.
//!
//! The export is the portable record of a run:
//! - when it was produced and with which settings
//! - dataset summary statistics
//! - the full selection (every fitted shape, best, second best)
//! - a precomputed probability grid of the best fit for quick plotting

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::domain::{DatasetStats, FitConfig, FitResult};
use crate::error::AppError;
use crate::fit::FitSelection;

/// Number of grid points written for the best curve.
const GRID_POINTS: usize = 121;

/// Modelled probability of death on an age grid (`None` where undefined).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub ages: Vec<f64>,
    pub probability: Vec<Option<f64>>,
}

/// Schema of an exported run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub tool: String,
    /// RFC 3339 local time the run finished.
    pub generated_at: String,
    pub dataset: DatasetStats,
    pub config: FitConfig,
    pub selection: FitSelection,
    pub grid: CurveGrid,
}

impl RunFile {
    pub fn new(stats: DatasetStats, config: &FitConfig, selection: &FitSelection) -> Self {
        Self {
            tool: "deathcurve".to_string(),
            generated_at: Local::now().to_rfc3339(),
            dataset: stats,
            config: config.clone(),
            selection: selection.clone(),
            grid: build_grid(&selection.best, 0.0, stats.age_max.max(config.reference_age), GRID_POINTS),
        }
    }
}

/// Write a run JSON file.
pub fn write_run_json(path: &Path, run: &RunFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    write_run_json_to(file, run)
}

pub fn write_run_json_to<W: Write>(writer: W, run: &RunFile) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, run)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))
}

/// Read a run JSON file.
pub fn read_run_json(path: &Path) -> Result<RunFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open export JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid export JSON: {e}")))
}

fn build_grid(best: &FitResult, age_min: f64, age_max: f64, n: usize) -> CurveGrid {
    let n = n.max(2);
    let (a0, a1) = if age_max.is_finite() && age_max > age_min {
        (age_min, age_max)
    } else {
        (0.0, 120.0)
    };

    let ages: Vec<f64> = (0..n)
        .map(|i| a0 + (a1 - a0) * i as f64 / (n as f64 - 1.0))
        .collect();
    let probability = ages.iter().map(|&a| best.probability(a)).collect();
    CurveGrid { ages, probability }
}
