//! Station CSV loading and stacking.
//!
//! Raw data is laid out as `<root>/<month>/<station>.csv`, one file per
//! station per month, each with a `time` column followed by observation
//! columns. Loading produces one time series per station; stacking lines
//! them up on a shared time axis with a `station` dimension.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ndarray::Array2;
use wxprep_core::{CoordValues, Coordinate, Dataset, Error, Result, Variable};

use crate::metadata::StationMetadata;

/// Time column and dimension name in station data.
pub const TIME: &str = "time";

/// Station dimension name in the combined dataset.
pub const STATION: &str = "station";

const TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
];

/// Parses the timestamp formats found in DPIRD exports.
pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim().trim_end_matches('Z');
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn csv_error(path: &Path, e: csv::Error) -> Error {
    Error::Csv(format!("{}: {e}", path.display()))
}

/// Loads one station CSV as a dataset along `time`, sorted by time.
///
/// Every non-time column becomes a variable. Blank or non-numeric cells
/// are NaN; a column with no numeric cell at all is dropped.
pub fn load_station_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let time_idx = headers
        .iter()
        .position(|h| h == TIME)
        .ok_or_else(|| Error::parse(format!("{}: no '{TIME}' column", path.display())))?;
    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows: Vec<(NaiveDateTime, Vec<f32>)> = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let raw_time = record.get(time_idx).unwrap_or_default();
        // header is line 1
        let time = parse_time(raw_time).ok_or_else(|| {
            Error::parse(format!(
                "{}:{}: unparseable time '{raw_time}'",
                path.display(),
                n + 2
            ))
        })?;
        let values = columns
            .iter()
            .map(|(i, _)| {
                record
                    .get(*i)
                    .and_then(|cell| cell.parse::<f32>().ok())
                    .unwrap_or(f32::NAN)
            })
            .collect();
        rows.push((time, values));
    }
    rows.sort_by_key(|(t, _)| *t);

    let times: Vec<NaiveDateTime> = rows.iter().map(|(t, _)| *t).collect();
    let mut ds = Dataset::new().with_coord(TIME, Coordinate::new(TIME, CoordValues::Time(times)))?;
    for (col, (_, name)) in columns.iter().enumerate() {
        let series: Vec<f32> = rows.iter().map(|(_, v)| v[col]).collect();
        if !rows.is_empty() && series.iter().all(|v| v.is_nan()) {
            tracing::debug!(file = %path.display(), column = %name, "dropping non-numeric column");
            continue;
        }
        let len = series.len();
        ds.insert_var(name.clone(), Variable::from_vec(vec![TIME], &[len], series)?)?;
    }
    Ok(ds)
}

/// Concatenates station pieces along `time`.
///
/// Variables are unioned; a piece lacking a variable contributes NaN.
pub fn concat_time(parts: &[Dataset]) -> Result<Dataset> {
    let names: BTreeSet<String> = parts.iter().flat_map(Dataset::var_names).collect();
    let mut times = Vec::new();
    for part in parts {
        times.extend_from_slice(part.time_values(TIME).ok_or(Error::MissingTimeCoordinate)?);
    }

    let mut out = Dataset::new().with_coord(TIME, Coordinate::new(TIME, CoordValues::Time(times)))?;
    for name in names {
        let mut series = Vec::new();
        let mut attrs = None;
        for part in parts {
            let len = part.dim_len(TIME).unwrap_or(0);
            match part.var(&name) {
                Some(var) => {
                    series.extend(var.data().iter().copied());
                    attrs.get_or_insert_with(|| var.attrs.clone());
                }
                None => series.extend(std::iter::repeat_n(f32::NAN, len)),
            }
        }
        let len = series.len();
        let mut var = Variable::from_vec(vec![TIME], &[len], series)?;
        var.attrs = attrs.unwrap_or_default();
        out.insert_var(name, var)?;
    }
    if let Some(first) = parts.first() {
        out.attrs = first.attrs.clone();
    }
    Ok(out)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io_with_path(e, dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Station CSV files directly inside `dir`, sorted.
pub fn station_csvs(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect())
}

/// Station name of a CSV path: its file stem.
pub fn station_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Month subfolders of the raw root, sorted.
pub fn month_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(root)?.into_iter().filter(|p| p.is_dir()).collect())
}

/// Loads every station under `root`, concatenating months in order.
pub fn loop_over_all_dpird<S: AsRef<str>>(
    root: &Path,
    excluded: &[S],
) -> Result<BTreeMap<String, Dataset>> {
    let excluded: BTreeSet<&str> = excluded.iter().map(AsRef::as_ref).collect();
    let mut pieces: BTreeMap<String, Vec<Dataset>> = BTreeMap::new();

    for month_dir in month_dirs(root)? {
        for csv_file in station_csvs(&month_dir)? {
            let Some(station) = station_name(&csv_file) else {
                continue;
            };
            if excluded.contains(station.as_str()) {
                tracing::debug!(%station, "excluded");
                continue;
            }
            let ds = load_station_csv(&csv_file)?;
            pieces.entry(station).or_default().push(ds);
        }
    }

    pieces
        .into_iter()
        .map(|(station, parts)| Ok((station, concat_time(&parts)?)))
        .collect()
}

/// Stacks stations along a `station` dimension with `lat`/`lon` attached.
///
/// Times are outer-joined: the result covers every timestamp any station
/// reported, NaN where a station has no row. A station reporting the same
/// timestamp twice is an `Error::Shape`.
pub fn combine_stations(
    stations: &BTreeMap<String, Dataset>,
    meta: &StationMetadata,
) -> Result<Dataset> {
    if stations.is_empty() {
        return Err(Error::config("no station data to combine"));
    }

    for (name, ds) in stations {
        let mut seen = HashSet::new();
        if let Some(t) = ds
            .time_values(TIME)
            .unwrap_or_default()
            .iter()
            .find(|t| !seen.insert(**t))
        {
            return Err(Error::shape(format!("station {name} has more than one row at {t}")));
        }
    }

    let mut lats = Vec::with_capacity(stations.len());
    let mut lons = Vec::with_capacity(stations.len());
    for name in stations.keys() {
        let (lat, lon) = meta
            .location(name)
            .ok_or_else(|| Error::config(format!("station {name} is missing from metadata")))?;
        lats.push(lat);
        lons.push(lon);
    }

    let all_times: BTreeSet<NaiveDateTime> = stations
        .values()
        .filter_map(|ds| ds.time_values(TIME))
        .flat_map(|t| t.iter().copied())
        .collect();
    let times: Vec<NaiveDateTime> = all_times.into_iter().collect();
    let position: HashMap<NaiveDateTime, usize> =
        times.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    let names: BTreeSet<String> = stations.values().flat_map(Dataset::var_names).collect();

    let mut out = Dataset::new()
        .with_coord(
            STATION,
            Coordinate::new(STATION, CoordValues::Labels(stations.keys().cloned().collect())),
        )?
        .with_coord(TIME, Coordinate::new(TIME, CoordValues::Time(times.clone())))?
        .with_coord(
            "lat",
            Coordinate::new(STATION, CoordValues::Numeric(lats)).with_attr("units", "degrees_north"),
        )?
        .with_coord(
            "lon",
            Coordinate::new(STATION, CoordValues::Numeric(lons)).with_attr("units", "degrees_east"),
        )?;

    for name in names {
        let mut grid = Array2::<f32>::from_elem((stations.len(), times.len()), f32::NAN);
        let mut attrs = None;
        for (row, ds) in stations.values().enumerate() {
            let (Some(var), Some(ts)) = (ds.var(&name), ds.time_values(TIME)) else {
                continue;
            };
            attrs.get_or_insert_with(|| var.attrs.clone());
            for (t, v) in ts.iter().zip(var.data().iter()) {
                if let Some(&col) = position.get(t) {
                    grid[[row, col]] = *v;
                }
            }
        }
        let mut var = Variable::new(vec![STATION, TIME], grid.into_dyn())?;
        var.attrs = attrs.unwrap_or_default();
        out.insert_var(name, var)?;
    }
    tracing::info!(stations = stations.len(), steps = times.len(), "combined stations");
    Ok(out)
}
