//! Dataset storage backends.
//!
//! Pipelines only talk to [`DatasetReader`] and [`DatasetWriter`]. The
//! NetCDF backend lives behind the `netcdf` feature because it links the
//! system `libnetcdf`; [`MemoryStore`] is always available.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Loads a dataset from a path.
pub trait DatasetReader: Send + Sync {
    /// Reads the dataset stored at `path`.
    fn read(&self, path: &Path) -> Result<Dataset>;
}

/// Persists a dataset at a path.
pub trait DatasetWriter: Send + Sync {
    /// Writes `dataset` to `path`, replacing any existing file.
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()>;
}

/// Something that can both read and write datasets.
pub trait DatasetStore: DatasetReader + DatasetWriter {}

impl<T: DatasetReader + DatasetWriter> DatasetStore for T {}

/// In-memory store keyed by path.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<PathBuf, Dataset>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset under `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, dataset: Dataset) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(path.into(), dataset);
        }
    }

    /// Returns a copy of the dataset stored under `path`.
    pub fn get(&self, path: &Path) -> Option<Dataset> {
        self.inner.lock().ok()?.get(path).cloned()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .inner
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

impl DatasetReader for MemoryStore {
    fn read(&self, path: &Path) -> Result<Dataset> {
        self.get(path).ok_or_else(|| {
            Error::io_with_path(
                std::io::Error::new(std::io::ErrorKind::NotFound, "no dataset stored"),
                path,
            )
        })
    }
}

impl DatasetWriter for MemoryStore {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        self.insert(path, dataset.clone());
        Ok(())
    }
}

/// The on-disk store compiled into this build.
#[cfg(feature = "netcdf")]
pub fn default_store() -> Result<Box<dyn DatasetStore>> {
    Ok(Box::new(crate::netcdf_store::NetcdfStore::new()))
}

/// The on-disk store compiled into this build.
#[cfg(not(feature = "netcdf"))]
pub fn default_store() -> Result<Box<dyn DatasetStore>> {
    Err(Error::Unsupported(
        "NetCDF I/O; rebuild with `--features netcdf`",
    ))
}
