//! Error types for wxprep.

use std::path::{Path, PathBuf};

/// Errors that can occur while preprocessing weather data.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error tied to a specific path
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Malformed input (CF units, CSV cells, timestamps)
    #[error("Parse error: {message}")]
    Parse {
        /// What could not be parsed
        message: String,
    },

    /// Dimension lengths disagree inside a dataset
    #[error("Shape error: {message}")]
    Shape {
        /// Which dimension or variable is inconsistent
        message: String,
    },

    /// Dataset carries no datetime coordinate
    #[error("Dataset has no time coordinate")]
    MissingTimeCoordinate,

    /// None of the requested variables are present
    #[error("No requested variables are present in dataset: {requested:?}")]
    MissingVariables {
        /// Variables that were asked for
        requested: Vec<String>,
    },

    /// A month folder lacks one of the pressure/accum/instant files
    #[error("Missing required ECMWF files in {dir}; found: {found:?}")]
    MissingInputs {
        /// Folder that was inspected
        dir: PathBuf,
        /// File names that were present
        found: Vec<String>,
    },

    /// A month folder holds no NetCDF files at all
    #[error("No .nc files in {dir}")]
    NoInputs {
        /// Folder that was inspected
        dir: PathBuf,
    },

    /// ZIP archive failure
    #[error("Archive error in {path}: {message}")]
    Archive {
        /// Archive path
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// CSV reader failure
    #[error("CSV error: {0}")]
    Csv(String),

    /// NetCDF library failure
    #[error("NetCDF error at {path}: {message}")]
    Netcdf {
        /// File being read or written
        path: PathBuf,
        /// Library message
        message: String,
    },

    /// Capability not compiled into this build
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

/// Convenience `Result` type alias for wxprep operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether a batch run should log this error and continue with
    /// the next unit of work.
    ///
    /// Data problems local to one month folder are skippable. Configuration
    /// mistakes and missing capabilities affect every folder and are not.
    pub fn is_skippable(&self) -> bool {
        match self {
            Error::Io { .. } => true,
            Error::Parse { .. } => true,
            Error::Shape { .. } => true,
            Error::MissingTimeCoordinate => true,
            Error::MissingVariables { .. } => true,
            Error::MissingInputs { .. } => true,
            Error::NoInputs { .. } => true,
            Error::Archive { .. } => true,
            Error::Csv(_) => true,
            Error::Netcdf { .. } => true,
            Error::Config { .. } => false,
            Error::Unsupported(_) => false,
        }
    }

    /// Creates an I/O error annotated with the offending path.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }

    /// Creates a new shape error.
    pub fn shape<S: Into<String>>(message: S) -> Self {
        Error::Shape {
            message: message.into(),
        }
    }

    /// Creates a new archive error.
    pub fn archive(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Archive {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a new NetCDF error.
    pub fn netcdf(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Netcdf {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}
