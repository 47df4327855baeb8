//! Common fixtures for ECMWF integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use wxprep_core::{Config, CoordValues, Coordinate, Dataset, MemoryStore, Variable};

pub const LATS: [f64; 2] = [-31.0, -32.0];
pub const LONS: [f64; 2] = [115.75, 116.0];

pub fn hours_from(start: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
    (0..count)
        .map(|h| start + TimeDelta::hours(h as i64))
        .collect()
}

pub fn start_of(year: i32, month: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn surface(time_name: &str, times: Vec<NaiveDateTime>) -> Dataset {
    Dataset::new()
        .with_coord(time_name, Coordinate::new(time_name, CoordValues::Time(times)))
        .unwrap()
        .with_coord(
            "latitude",
            Coordinate::new("latitude", CoordValues::Numeric(LATS.to_vec())),
        )
        .unwrap()
        .with_coord(
            "longitude",
            Coordinate::new("longitude", CoordValues::Numeric(LONS.to_vec())),
        )
        .unwrap()
}

fn field(time_name: &str, steps: usize, value: f32, units: &str) -> Variable {
    Variable::from_vec(
        vec![time_name, "latitude", "longitude"],
        &[steps, 2, 2],
        vec![value; steps * 4],
    )
    .unwrap()
    .with_attr("units", units)
}

/// Accumulated fields; uses the legacy `time` name.
pub fn accum(times: Vec<NaiveDateTime>) -> Dataset {
    let n = times.len();
    surface("time", times)
        .with_var("tp", field("time", n, 0.002, "m"))
        .unwrap()
}

/// Instantaneous fields in SI units.
pub fn instant(times: Vec<NaiveDateTime>) -> Dataset {
    let n = times.len();
    surface("valid_time", times)
        .with_var("t2m", field("valid_time", n, 300.15, "K"))
        .unwrap()
        .with_var("d2m", field("valid_time", n, 283.15, "K"))
        .unwrap()
        .with_var("u10", field("valid_time", n, 5.0, "m s**-1"))
        .unwrap()
        .with_var("v10", field("valid_time", n, -2.0, "m s**-1"))
        .unwrap()
        .with_var("sp", field("valid_time", n, 101_000.0, "Pa"))
        .unwrap()
}

/// Relative humidity on three pressure levels; value = level in hPa / 10.
pub fn pressure(times: Vec<NaiveDateTime>) -> Dataset {
    let n = times.len();
    let levels = [1000.0, 850.0, 500.0];
    let values: Vec<f32> = (0..n)
        .flat_map(|_| levels.iter().flat_map(|l| std::iter::repeat_n((*l / 10.0) as f32, 4)))
        .collect();
    surface("valid_time", times)
        .with_coord(
            "pressure_level",
            Coordinate::new("pressure_level", CoordValues::Numeric(levels.to_vec())),
        )
        .unwrap()
        .with_var(
            "r",
            Variable::from_vec(
                vec!["valid_time", "pressure_level", "latitude", "longitude"],
                &[n, 3, 2, 2],
                values,
            )
            .unwrap()
            .with_attr("units", "%"),
        )
        .unwrap()
}

/// Creates `root/YYYY/MM` with the three role files and registers their
/// datasets in `store`. Returns the month folder.
pub fn month_fixture(
    root: &Path,
    store: &MemoryStore,
    year: i32,
    month: u32,
    accum_ds: Dataset,
    instant_ds: Dataset,
    pressure_ds: Dataset,
) -> PathBuf {
    let dir = root.join(format!("{year:04}")).join(format!("{month:02}"));
    fs::create_dir_all(&dir).unwrap();
    for (name, ds) in [
        ("data_stream-oper_stepType-accum.nc", accum_ds),
        ("data_stream-oper_stepType-instant.nc", instant_ds),
        ("pressure_levels.nc", pressure_ds),
    ] {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        store.insert(path, ds);
    }
    dir
}

pub fn config(raw: &Path, processed: &Path, vars: &[&str], shift: i64) -> Config {
    let yaml = format!(
        "preprocess: true\n\
         untar_ecmwf_dir: {}\n\
         processed_data_dir: {}\n\
         destination_folder: ecmwf\n\
         timezone_shift_hours: {shift}\n\
         jobs: 2\n\
         sources:\n  ecmwf:\n    vars: [{}]\n",
        raw.display(),
        processed.display(),
        vars.join(", ")
    );
    Config::from_yaml_str(&yaml).unwrap()
}
