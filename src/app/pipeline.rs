//! Shared "fit pipeline" logic used by the `fit` and `demo` subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! dataset -> stop-file watcher -> fit/search -> selection -> optional export
//!
//! The subcommands only differ in where the dataset comes from.

use std::path::Path;

use log::info;

use crate::app::stop::StopFileWatcher;
use crate::domain::{Dataset, DatasetStats, FitConfig};
use crate::error::AppError;
use crate::fit::{CancellationToken, FitSelection, fit_and_select};
use crate::io::export::{RunFile, write_run_json};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: DatasetStats,
    pub selection: FitSelection,
}

/// Run the fit for `dataset`, honoring the stop file and writing the export.
pub fn run_fit(
    dataset: &Dataset,
    config: &FitConfig,
    stop_file: &Path,
    export: Option<&Path>,
) -> Result<RunOutput, AppError> {
    let stats = dataset.stats();
    info!(
        "Fitting {} subjects ({} deaths), ages {:.2} to {:.2}",
        stats.n, stats.deaths, stats.age_min, stats.age_max
    );

    let cancel = CancellationToken::new();
    let selection = {
        let _watcher = StopFileWatcher::spawn(stop_file, cancel.clone())?;
        fit_and_select(dataset, config, &cancel)?
    };

    if let Some(path) = export {
        write_run_json(path, &RunFile::new(stats, config, &selection))?;
        info!("Wrote run export to '{}'", path.display());
    }

    Ok(RunOutput { stats, selection })
}
