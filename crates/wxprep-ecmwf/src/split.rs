//! Daily split of cleaned month datasets.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use wxprep_core::{Dataset, DatasetWriter, Error, Result, VALID_TIME};

/// Output path of one day: `<base>/YYYY/MM/YYYYMMDD.nc`.
pub fn day_path(base: &Path, day: NaiveDate) -> PathBuf {
    base.join(format!("{:04}", day.year()))
        .join(format!("{:02}", day.month()))
        .join(format!("{}.nc", day.format("%Y%m%d")))
}

/// Writes one file per calendar day of `valid_time`.
///
/// Files go to `<processed_dir>/<destination>/YYYY/MM/YYYYMMDD.nc`, in
/// ascending date order. Returns the paths written.
pub fn store_year_month_day(
    ds: &Dataset,
    processed_dir: &Path,
    destination: &str,
    writer: &dyn DatasetWriter,
) -> Result<Vec<PathBuf>> {
    if ds.time_values(VALID_TIME).is_none() {
        return Err(Error::MissingTimeCoordinate);
    }
    let base = processed_dir.join(destination);
    fs::create_dir_all(&base).map_err(|e| Error::io_with_path(e, &base))?;

    let mut written = Vec::new();
    for day in ds.dates(VALID_TIME) {
        let day_ds = ds.day_slice(VALID_TIME, day)?;
        if day_ds.dim_len(VALID_TIME).unwrap_or(0) == 0 {
            continue;
        }
        let path = day_path(&base, day);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
        }
        writer.write(&day_ds, &path)?;
        tracing::debug!(path = %path.display(), steps = day_ds.dim_len(VALID_TIME), "wrote day");
        written.push(path);
    }
    Ok(written)
}
