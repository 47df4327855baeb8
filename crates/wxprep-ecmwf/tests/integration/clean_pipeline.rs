//! End-to-end runs of the clean pipeline.

use std::fs;
use std::path::Path;

use chrono::TimeDelta;
use wxprep_core::{
    Config, Dataset, DatasetReader, DatasetWriter, Error, MemoryStore, Result, VALID_TIME,
};
use wxprep_ecmwf::{MonthFiles, merge_accum_instant_pressure, run};

use crate::common::*;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_month_is_merged_converted_shifted_and_split() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();

    let start = start_of(2020, 1);
    month_fixture(
        raw.path(),
        &store,
        2020,
        1,
        accum(hours_from(start, 48)),
        // instant starts an hour late: only 47 common steps survive
        instant(hours_from(start + TimeDelta::hours(1), 48)),
        pressure(hours_from(start, 48)),
    );

    let config = config(raw.path(), out.path(), &["t2m", "u10", "r850", "tp", "cape"], 8);
    let report = run(&config, &store).unwrap();

    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.months_found, 1);
    assert_eq!(report.days_written, 3);

    let days: Vec<_> = ["20200101", "20200102", "20200103"]
        .iter()
        .map(|d| out.path().join(format!("ecmwf/2020/01/{d}.nc")))
        .collect();
    assert_eq!(store.paths().iter().filter(|p| p.starts_with(out.path())).count(), 3);

    let first = store.get(&days[0]).unwrap();
    // 01:00 UTC shifted to 09:00 local is the first surviving step
    assert_eq!(
        first.time_values(VALID_TIME).unwrap()[0].to_string(),
        "2020-01-01 09:00:00"
    );
    assert_eq!(first.dim_len(VALID_TIME), Some(15));
    assert_eq!(store.get(&days[1]).unwrap().dim_len(VALID_TIME), Some(24));
    assert_eq!(store.get(&days[2]).unwrap().dim_len(VALID_TIME), Some(8));

    assert_eq!(first.var_names(), ["r850", "t2m", "tp", "u10"]);
    assert!(first.coord("pressure_level").is_none());
    assert!(first.coord("latitude").is_some());

    let t2m = first.var("t2m").unwrap();
    assert_eq!(t2m.units(), Some("C"));
    assert!(t2m.data().iter().all(|v| close(*v, 27.0)));
    assert!(first.var("u10").unwrap().data().iter().all(|v| close(*v, 18.0)));
    assert!(first.var("r850").unwrap().data().iter().all(|v| close(*v, 85.0)));
}

#[test]
fn test_broken_month_is_reported_and_others_continue() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();

    let feb = start_of(2020, 2);
    month_fixture(
        raw.path(),
        &store,
        2020,
        2,
        accum(hours_from(feb, 24)),
        instant(hours_from(feb, 24)),
        pressure(hours_from(feb, 24)),
    );
    // March has no pressure-level file
    let march = raw.path().join("2020/03");
    fs::create_dir_all(&march).unwrap();
    fs::write(march.join("x_stepType-accum.nc"), b"").unwrap();
    fs::write(march.join("x_stepType-instant.nc"), b"").unwrap();

    let config = config(raw.path(), out.path(), &["t2m"], 0);
    let report = run(&config, &store).unwrap();

    assert_eq!(report.months_found, 2);
    assert_eq!(report.processed, vec![raw.path().join("2020/02")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, march);
    assert!(report.failed[0].1.contains("Missing required ECMWF files"));
    assert_eq!(report.days_written, 1);
}

#[test]
fn test_month_without_any_requested_variable_fails() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let start = start_of(2021, 6);
    month_fixture(
        raw.path(),
        &store,
        2021,
        6,
        accum(hours_from(start, 6)),
        instant(hours_from(start, 6)),
        pressure(hours_from(start, 6)),
    );

    let report = run(&config(raw.path(), out.path(), &["cape"], 0), &store).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.contains("No requested variables"));
}

#[test]
fn test_preprocess_false_does_nothing() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut config = config(raw.path(), out.path(), &["t2m"], 0);
    config.preprocess = false;
    let report = run(&config, &MemoryStore::new()).unwrap();
    assert_eq!(report.months_found, 0);
    assert!(report.is_success());
}

#[test]
fn test_no_month_folders_is_empty_report() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let report = run(&config(raw.path(), out.path(), &["t2m"], 0), &MemoryStore::new()).unwrap();
    assert_eq!(report.months_found, 0);
}

#[test]
fn test_missing_vars_config_fails_fast() {
    let raw = tempfile::tempdir().unwrap();
    let yaml = format!("preprocess: true\nuntar_ecmwf_dir: {}\nprocessed_data_dir: /tmp\n", raw.path().display());
    let config = Config::from_yaml_str(&yaml).unwrap();
    assert!(run(&config, &MemoryStore::new()).is_err());
}

#[test]
fn test_merge_requires_non_empty_folder() {
    let raw = tempfile::tempdir().unwrap();
    let err = MonthFiles::locate(raw.path()).unwrap_err();
    assert!(err.to_string().contains("No .nc files"));
    assert!(merge_accum_instant_pressure(raw.path(), &MemoryStore::new(), &[850]).is_err());
}

/// A store standing in for a build without an on-disk backend.
struct NoBackend;

impl DatasetReader for NoBackend {
    fn read(&self, _path: &Path) -> Result<Dataset> {
        Err(Error::Unsupported("NetCDF I/O"))
    }
}

impl DatasetWriter for NoBackend {
    fn write(&self, _dataset: &Dataset, _path: &Path) -> Result<()> {
        Err(Error::Unsupported("NetCDF I/O"))
    }
}

#[test]
fn test_missing_backend_aborts_run() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let start = start_of(2021, 6);
    month_fixture(
        raw.path(),
        &MemoryStore::new(),
        2021,
        6,
        accum(hours_from(start, 6)),
        instant(hours_from(start, 6)),
        pressure(hours_from(start, 6)),
    );

    let err = run(&config(raw.path(), out.path(), &["t2m"], 0), &NoBackend).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
}
