#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! wxprep core library
//!
//! Shared building blocks for the ECMWF and DPIRD preprocessing crates:
//!
//! - [`dataset`]: labelled N-d datasets (variables, coordinates, alignment)
//! - [`cf`]: CF time units and packed-variable decoding
//! - [`store`]: reader/writer traits, in-memory and NetCDF backends
//! - [`config`]: the YAML configuration every command reads
//! - [`error`]: the shared error type
//!
//! # Features
//!
//! - `netcdf`: enable the `libnetcdf`-backed [`NetcdfStore`]

pub mod cf;
pub mod config;
pub mod dataset;
pub mod error;
#[cfg(feature = "netcdf")]
pub mod netcdf_store;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use dataset::{AttrValue, Attrs, CoordValues, Coordinate, Dataset, VALID_TIME, Variable};
pub use error::{Error, Result};
#[cfg(feature = "netcdf")]
pub use netcdf_store::NetcdfStore;
pub use store::{DatasetReader, DatasetStore, DatasetWriter, MemoryStore, default_store};
