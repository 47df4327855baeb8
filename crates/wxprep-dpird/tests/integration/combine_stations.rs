//! `dpird combine` over a two-month raw tree.

use wxprep_core::{CoordValues, Error, MemoryStore};
use wxprep_dpird::{STATION, TIME, combine, loop_over_all_dpird};

use crate::common;

#[test]
fn test_combine_outer_joins_stations() {
    let root = tempfile::tempdir().unwrap();
    common::raw_tree(&root.path().join("raw"));
    let config = common::config(root.path(), &[]);
    let store = MemoryStore::new();

    let out = combine(&config, &store).unwrap();
    assert_eq!(out, root.path().join("processed/dpird/stations.nc"));
    assert!(root.path().join("processed/dpird").is_dir());

    let ds = store.get(&out).unwrap();
    assert_eq!(ds.dim_len(STATION), Some(2));
    assert_eq!(ds.dim_len(TIME), Some(4));
    assert_eq!(
        ds.coord(STATION).unwrap().values,
        CoordValues::Labels(vec!["AL".into(), "BR".into()])
    );
    assert_eq!(
        ds.coord("lat").unwrap().values,
        CoordValues::Numeric(vec![-34.95, -33.95])
    );

    let temp = ds.var("airTemperature").unwrap();
    assert_eq!(temp.dims(), ["station", "time"]);
    let t = temp.data();
    assert_eq!(t[[0, 0]], 14.0);
    assert!(t[[0, 3]].is_nan());
    assert!(t[[1, 0]].is_nan());
    assert_eq!(t[[1, 3]], 10.0);

    let rain = ds.var("rainfall").unwrap().data();
    assert!((0..4).all(|j| rain[[0, j]].is_nan()));
    assert_eq!(rain[[1, 2]], 0.4);
}

#[test]
fn test_excluded_station_is_not_loaded() {
    let root = tempfile::tempdir().unwrap();
    let raw = root.path().join("raw");
    common::raw_tree(&raw);
    // Unparseable data must not matter for an excluded station
    common::write_station(&raw, "2022-05", "XX", "time,airTemperature\nbad,1\n");

    let stations = loop_over_all_dpird(&raw, &["XX"]).unwrap();
    assert_eq!(stations.keys().collect::<Vec<_>>(), ["AL", "BR"]);
    assert_eq!(stations["AL"].dim_len(TIME), Some(3));
}

#[test]
fn test_station_without_metadata_fails() {
    let root = tempfile::tempdir().unwrap();
    let raw = root.path().join("raw");
    common::raw_tree(&raw);
    common::write_station(&raw, "2022-05", "ZZ", "time,airTemperature\n2022-05-01,1\n");
    let config = common::config(root.path(), &[]);

    let err = combine(&config, &MemoryStore::new()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("ZZ"));
}

#[test]
fn test_empty_raw_tree_fails() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("raw")).unwrap();
    let config = common::config(root.path(), &[]);
    assert!(combine(&config, &MemoryStore::new()).is_err());
}

#[test]
fn test_overlapping_exports_are_rejected() {
    let root = tempfile::tempdir().unwrap();
    let raw = root.path().join("raw");
    common::write_station(&raw, "2022-04", "AL", "time,airTemperature\n2022-05-01 00:00:00,1.0\n");
    common::write_station(&raw, "2022-05", "AL", "time,airTemperature\n2022-05-01 00:00:00,99.0\n");
    let config = common::config(root.path(), &[]);
    let store = MemoryStore::new();

    let err = combine(&config, &store).unwrap_err();
    assert!(matches!(err, Error::Shape { .. }));
    let message = err.to_string();
    assert!(message.contains("AL"));
    assert!(message.contains("2022-05-01 00:00:00"));
    assert!(store.paths().is_empty());
}
