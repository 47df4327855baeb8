//! Common fixtures for DPIRD integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use wxprep_core::Config;
use wxprep_core::config::{DpirdSource, Sources};

pub const METADATA: &str = "stationCode,stationName,latitude,longitude\n\
                            AL,Albany,-34.95,117.80\n\
                            BR,Bridgetown,-33.95,116.13\n";

/// Writes one station CSV under `<root>/<month>/<station>.csv`.
pub fn write_station(root: &Path, month: &str, station: &str, body: &str) -> PathBuf {
    let dir = root.join(month);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{station}.csv"));
    fs::write(&path, body).unwrap();
    path
}

/// Two months of data for AL and BR; BR reports rainfall only in May.
pub fn raw_tree(root: &Path) {
    write_station(
        root,
        "2022-04",
        "AL",
        "time,airTemperature\n2022-04-30 22:00:00,14.0\n2022-04-30 23:00:00,13.5\n",
    );
    write_station(
        root,
        "2022-05",
        "AL",
        "time,airTemperature\n2022-05-01 00:00:00,13.0\n",
    );
    write_station(
        root,
        "2022-04",
        "BR",
        "time,airTemperature\n2022-04-30 23:00:00,11.0\n",
    );
    write_station(
        root,
        "2022-05",
        "BR",
        "time,airTemperature,rainfall\n2022-05-01 00:00:00,10.5,0.4\n2022-05-01 01:00:00,10.0,0.0\n",
    );
}

/// A config pointing at `root/raw`, `root/meta.csv` and `root/processed`.
pub fn config(root: &Path, excluded: &[&str]) -> Config {
    let metadata_csv = root.join("meta.csv");
    fs::write(&metadata_csv, METADATA).unwrap();
    Config {
        processed_data_dir: Some(root.join("processed")),
        sources: Sources {
            ecmwf: None,
            dpird: Some(DpirdSource {
                raw_dir: root.join("raw"),
                metadata_csv,
                excluded_stations: excluded.iter().map(|s| s.to_string()).collect(),
                output_file: PathBuf::from("dpird/stations.nc"),
            }),
        },
        ..Config::default()
    }
}
