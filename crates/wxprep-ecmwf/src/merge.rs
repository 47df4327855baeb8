//! Merging of the three ERA5 files that make up one month.
//!
//! A month folder holds a pressure-level file, an accumulated-fields file
//! (`tp`, `cp`, `lsp`, `e`...) and an instantaneous-fields file (`t2m`,
//! `d2m`, `u10`, `v10`, `sp`, `cape`...). They are recognised by name.

use std::fs;
use std::path::{Path, PathBuf};

use wxprep_core::{Dataset, DatasetReader, Error, Result};

use crate::pressure::extract_pressure_levels;

/// Role of a NetCDF file within a month folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// Pressure-level variables
    Pressure,
    /// Accumulated surface fields
    Accum,
    /// Instantaneous surface fields
    Instant,
}

impl FileRole {
    /// Classifies a file by its lowercase name.
    pub fn classify(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("pressure") {
            Some(FileRole::Pressure)
        } else if name.contains("accum") {
            Some(FileRole::Accum)
        } else if name.contains("instant") {
            Some(FileRole::Instant)
        } else {
            None
        }
    }
}

/// Files of one month, by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthFiles {
    /// Pressure-level file
    pub pressure: PathBuf,
    /// Accumulated-fields file
    pub accum: PathBuf,
    /// Instantaneous-fields file
    pub instant: PathBuf,
}

impl MonthFiles {
    /// Locates the three files in `month_dir`.
    pub fn locate(month_dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = fs::read_dir(month_dir)
            .map_err(|e| Error::io_with_path(e, month_dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "nc"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(Error::NoInputs {
                dir: month_dir.to_path_buf(),
            });
        }

        let (mut pressure, mut accum, mut instant) = (None, None, None);
        for f in &files {
            let name = f.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            match FileRole::classify(&name) {
                Some(FileRole::Pressure) => pressure = Some(f.clone()),
                Some(FileRole::Accum) => accum = Some(f.clone()),
                Some(FileRole::Instant) => instant = Some(f.clone()),
                None => {}
            }
        }

        match (pressure, accum, instant) {
            (Some(pressure), Some(accum), Some(instant)) => Ok(Self {
                pressure,
                accum,
                instant,
            }),
            _ => Err(Error::MissingInputs {
                dir: month_dir.to_path_buf(),
                found: files
                    .iter()
                    .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
                    .collect(),
            }),
        }
    }
}

/// Loads, flattens, aligns and merges the three files of one month.
///
/// The result has matching `valid_time`, latitude and longitude across all
/// variables; time steps not present in every file are dropped.
pub fn merge_accum_instant_pressure(
    month_dir: &Path,
    reader: &dyn DatasetReader,
    levels: &[i64],
) -> Result<Dataset> {
    let files = MonthFiles::locate(month_dir)?;
    tracing::debug!(month = %month_dir.display(), ?files, "located month files");

    let pressure = reader.read(&files.pressure)?.ensure_valid_time()?;
    let accum = reader.read(&files.accum)?.ensure_valid_time()?;
    let instant = reader.read(&files.instant)?.ensure_valid_time()?;

    let flattened = extract_pressure_levels(&pressure, levels)?;
    let mut parts = [accum, instant, flattened];
    Dataset::align_inner(&mut parts)?;
    Dataset::merge(&parts)
}
