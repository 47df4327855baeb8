#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! DPIRD weather-station preprocessing.
//!
//! Station exports arrive as `<raw_dir>/<month>/<station>.csv`. This crate
//! loads them into per-station time series, stacks the stations into one
//! `[station, time]` dataset with coordinates from a metadata table, and
//! reports stations that have data but no metadata entry.

pub mod exclusion;
pub mod metadata;
pub mod pipeline;
pub mod stations;

pub use exclusion::compare_csv_to_metadata;
pub use metadata::StationMetadata;
pub use pipeline::{check, combine, latest_month_dir};
pub use stations::{
    STATION, TIME, combine_stations, concat_time, load_station_csv, loop_over_all_dpird,
    parse_time,
};
