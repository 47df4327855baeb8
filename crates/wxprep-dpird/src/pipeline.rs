//! Config-driven DPIRD commands.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use wxprep_core::{Config, DatasetWriter, Error, Result};

use crate::exclusion::compare_csv_to_metadata;
use crate::metadata::StationMetadata;
use crate::stations::{combine_stations, loop_over_all_dpird, month_dirs};

/// Loads every station, stacks them and writes the combined dataset.
///
/// Returns the path written: `<processed_data_dir>/<output_file>`.
pub fn combine(config: &Config, writer: &dyn DatasetWriter) -> Result<PathBuf> {
    let src = config.dpird()?;
    let out = config.processed_dir()?.join(&src.output_file);

    let meta = StationMetadata::from_csv(&src.metadata_csv)?;
    let stations = loop_over_all_dpird(&src.raw_dir, &src.excluded_stations)?;
    tracing::info!(
        raw_dir = %src.raw_dir.display(),
        stations = stations.len(),
        "loaded station series"
    );
    let ds = combine_stations(&stations, &meta)?;

    if let Some(dir) = out.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
    }
    writer.write(&ds, &out)?;
    tracing::info!(path = %out.display(), "wrote combined stations");
    Ok(out)
}

/// Newest month folder under the raw root, by name.
pub fn latest_month_dir(raw_dir: &Path) -> Result<PathBuf> {
    month_dirs(raw_dir)?
        .pop()
        .ok_or_else(|| Error::config(format!("no month folders in {}", raw_dir.display())))
}

/// Stations in `dir` (default: newest month) that lack metadata.
pub fn check(config: &Config, dir: Option<&Path>) -> Result<BTreeSet<String>> {
    let src = config.dpird()?;
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => latest_month_dir(&src.raw_dir)?,
    };
    let meta = StationMetadata::from_csv(&src.metadata_csv)?;
    tracing::info!(dir = %dir.display(), known = meta.len(), "checking stations against metadata");
    compare_csv_to_metadata(&dir, &src.excluded_stations, &meta)
}
