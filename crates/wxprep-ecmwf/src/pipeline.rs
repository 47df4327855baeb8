//! The clean pipeline: one month folder in, daily files out.
//!
//! ```text
//! YYYY/MM/{pressure,accum,instant}.nc
//!   -> merge (flatten levels, inner-align, override-merge)
//!   -> unit conversions
//!   -> timezone shift
//!   -> variable selection
//!   -> <processed>/<destination>/YYYY/MM/YYYYMMDD.nc
//! ```

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use wxprep_core::{Config, DatasetStore, Error, Result};

use crate::discover::find_year_month_folders;
use crate::merge::merge_accum_instant_pressure;
use crate::select::select_variables;
use crate::split::store_year_month_day;
use crate::timezone::convert_valid_time_timezone;
use crate::units::apply_unit_conversions;

/// Outcome of [`run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Month folders discovered
    pub months_found: usize,
    /// Month folders that produced output
    pub processed: Vec<PathBuf>,
    /// Month folders that failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
    /// Daily files written across all months
    pub days_written: usize,
}

impl CleanReport {
    /// True when no month failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cleans one `YYYY/MM` folder and returns the daily files written.
pub fn process_month(
    month_dir: &Path,
    config: &Config,
    store: &dyn DatasetStore,
) -> Result<Vec<PathBuf>> {
    tracing::info!(month = %month_dir.display(), "processing");

    let ds = merge_accum_instant_pressure(month_dir, store, &config.pressure_levels)?;
    let ds = apply_unit_conversions(&ds)?;
    let ds = convert_valid_time_timezone(&ds, config.timezone_shift_hours)?;
    let ds = select_variables(&ds, config.ecmwf_vars()?)?;

    store_year_month_day(
        &ds,
        config.processed_dir()?,
        &config.destination_folder,
        store,
    )
}

/// Runs the clean pipeline over every month folder.
///
/// A month failing on bad data is logged and recorded; the others still
/// run. Errors no month can recover from (configuration, missing I/O
/// backend) abort the run. Months are processed on a pool of `config.jobs`
/// threads.
pub fn run(config: &Config, store: &dyn DatasetStore) -> Result<CleanReport> {
    if !config.preprocess {
        tracing::info!("preprocess: false. Nothing to do");
        return Ok(CleanReport::default());
    }
    // Settings every month needs; fail once instead of once per month
    let base = config.untar_dir()?;
    config.processed_dir()?;
    config.ecmwf_vars()?;

    let folders = find_year_month_folders(base);
    if folders.is_empty() {
        tracing::warn!(base = %base.display(), "no YYYY/MM folders found");
        return Ok(CleanReport::default());
    }
    tracing::info!(count = folders.len(), jobs = config.jobs, "found month folders");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| Error::config(format!("cannot start {} workers: {e}", config.jobs)))?;
    let outcomes: Vec<(PathBuf, Result<Vec<PathBuf>>)> = pool.install(|| {
        folders
            .par_iter()
            .map(|dir| (dir.clone(), process_month(dir, config, store)))
            .collect()
    });

    let mut report = CleanReport {
        months_found: folders.len(),
        ..CleanReport::default()
    };
    for (dir, outcome) in outcomes {
        match outcome {
            Ok(days) => {
                tracing::info!(month = %dir.display(), days = days.len(), "month done");
                report.days_written += days.len();
                report.processed.push(dir);
            }
            Err(e) if !e.is_skippable() => return Err(e),
            Err(e) => {
                tracing::error!(month = %dir.display(), error = %e, "error processing month");
                report.failed.push((dir, e.to_string()));
            }
        }
    }
    tracing::info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        days = report.days_written,
        "ECMWF preprocessing complete"
    );
    Ok(report)
}
