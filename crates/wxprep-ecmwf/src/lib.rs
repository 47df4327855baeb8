#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! ECMWF ERA5 preprocessing.
//!
//! Two stages operate on raw downloads laid out as `<base>/YYYY/MM/`:
//!
//! 1. [`unzip`]: `*single*.nc` files that are really ZIP archives are
//!    extracted in place; each folder is marked `.unzipped` afterwards.
//! 2. [`pipeline`]: each month's pressure-level, accumulated and instant
//!    files are merged, converted, shifted to local time, filtered to the
//!    configured variables and written out one file per day.
//!
//! The individual steps are public so they can be reused or tested alone.

pub mod discover;
pub mod merge;
pub mod pipeline;
pub mod pressure;
pub mod select;
pub mod split;
pub mod timezone;
pub mod units;
pub mod unzip;

pub use discover::find_year_month_folders;
pub use merge::{FileRole, MonthFiles, merge_accum_instant_pressure};
pub use pipeline::{CleanReport, process_month, run};
pub use pressure::{DEFAULT_LEVELS, PRESSURE_LEVEL, extract_pressure_levels};
pub use select::select_variables;
pub use split::{day_path, store_year_month_day};
pub use timezone::convert_valid_time_timezone;
pub use units::apply_unit_conversions;
pub use unzip::{UNZIPPED_MARKER, UnzipReport, extract_zip, unzip_all};
