//! In-place extraction of ZIP archives disguised as `.nc` files.
//!
//! CDS downloads of single-level ERA5 data arrive as `*single*.nc` files
//! that are really ZIP archives holding the `accum` and `instant` NetCDF
//! files. Each month folder is extracted once and then marked with a
//! `.unzipped` file so reruns skip it.

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use wxprep_core::{Error, Result};
use zip::result::ZipError;

use crate::discover::find_year_month_folders;

/// Marker file written into a month folder once it has been handled.
pub const UNZIPPED_MARKER: &str = ".unzipped";

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
const EMPTY_ZIP_MAGIC: [u8; 4] = *b"PK\x05\x06";

/// Outcome of [`unzip_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnzipReport {
    /// Month folders found under the base directory
    pub folders_scanned: usize,
    /// Folders skipped because they were already marked
    pub folders_skipped: usize,
    /// Folders marked during this run
    pub folders_marked: usize,
    /// Archives that were extracted
    pub archives_extracted: usize,
    /// Folders left unmarked because extraction failed
    pub failed: Vec<(PathBuf, String)>,
}

fn looks_like_zip(path: &Path) -> Result<bool> {
    let mut file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ZIP_MAGIC || magic == EMPTY_ZIP_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(Error::io_with_path(e, path)),
    }
}

/// Read errors caused by the archive bytes themselves, as opposed to the
/// filesystem failing underneath the extraction.
fn is_corrupt_data(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof
    )
}

fn netcdf_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io_with_path(e, dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "nc"))
        .collect();
    files.sort();
    Ok(files)
}

/// Extracts `path` into its own folder if it is a ZIP archive.
///
/// - missing file: `[]`
/// - ZIP archive: extracted next to itself, optionally deleted; returns the
///   sorted `.nc` files now in the folder
/// - corrupt archive: warning, `[]`
/// - filesystem failure while extracting: `Error::Io`
/// - anything else: `[path]`
pub fn extract_zip(path: &Path, remove_zip: bool) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    if !looks_like_zip(path)? {
        return Ok(vec![path.to_path_buf()]);
    }

    let workdir = path.parent().unwrap_or_else(|| Path::new("."));
    let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
    let extracted = zip::ZipArchive::new(file).and_then(|mut archive| {
        let entries = archive.len();
        archive.extract(workdir).map(|()| entries)
    });
    let entries = match extracted {
        Ok(n) => n,
        Err(ZipError::Io(e)) if !is_corrupt_data(&e) => {
            return Err(Error::io_with_path(e, path));
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "not a readable zip, skipping");
            return Ok(Vec::new());
        }
    };
    tracing::debug!(file = %path.display(), entries, "extracted archive");

    if remove_zip {
        tracing::info!(file = %path.display(), "removing original zip");
        fs::remove_file(path).map_err(|e| Error::io_with_path(e, path))?;
    }
    netcdf_files_in(workdir)
}

fn touch(path: &Path) -> Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| Error::io_with_path(e, path))
}

fn single_level_candidates(folder: &Path) -> Result<Vec<PathBuf>> {
    Ok(netcdf_files_in(folder)?
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase().contains("single"))
                .unwrap_or(false)
        })
        .collect())
}

fn unzip_folder(folder: &Path, remove_zip: bool) -> Result<usize> {
    let candidates = single_level_candidates(folder)?;
    if candidates.is_empty() {
        tracing::info!(month = %folder.display(), "no 'single' file found, skipping");
        return Ok(0);
    }

    let mut extracted_archives = 0;
    for file in candidates {
        let extracted = extract_zip(&file, remove_zip)?;
        if extracted.len() == 1 && extracted[0] == file {
            tracing::info!(file = %file.display(), "not a zip, nothing to extract");
        } else if extracted.is_empty() {
            tracing::info!(file = %file.display(), "nothing extracted");
        } else {
            extracted_archives += 1;
            tracing::info!(file = %file.display(), files = extracted.len(), "extracted");
        }
    }
    Ok(extracted_archives)
}

/// Extracts every unmarked month folder under `base`.
///
/// Folders whose extraction fails are reported and left unmarked so the
/// next run retries them.
pub fn unzip_all(base: &Path, remove_zip: bool) -> Result<UnzipReport> {
    tracing::info!(base = %base.display(), "scanning base folder");
    let folders = find_year_month_folders(base);
    let mut report = UnzipReport {
        folders_scanned: folders.len(),
        ..UnzipReport::default()
    };

    for folder in folders {
        let marker = folder.join(UNZIPPED_MARKER);
        if marker.exists() {
            report.folders_skipped += 1;
            continue;
        }
        match unzip_folder(&folder, remove_zip).and_then(|n| touch(&marker).map(|()| n)) {
            Ok(n) => {
                report.archives_extracted += n;
                report.folders_marked += 1;
            }
            Err(e) => {
                tracing::error!(month = %folder.display(), error = %e, "extraction failed");
                report.failed.push((folder, e.to_string()));
            }
        }
    }
    Ok(report)
}
