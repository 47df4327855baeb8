//! Station metadata table.

use std::collections::BTreeMap;
use std::path::Path;

use wxprep_core::{Error, Result};

/// Station locations keyed by station id.
///
/// Loaded from a CSV whose first column is the station id and which has
/// `lat`/`latitude` and `lon`/`longitude` columns (any case).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationMetadata {
    locations: BTreeMap<String, (f64, f64)>,
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

impl StationMetadata {
    /// Builds metadata from `(id, lat, lon)` triples.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        Self {
            locations: entries
                .into_iter()
                .map(|(id, lat, lon)| (id.into(), (lat, lon)))
                .collect(),
        }
    }

    /// Reads the metadata CSV.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let csv_err = |e: csv::Error| Error::Csv(format!("{}: {e}", path.display()));
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;
        let headers = reader.headers().map_err(csv_err)?.clone();
        let lat_idx = column(&headers, &["lat", "latitude"])
            .ok_or_else(|| Error::parse(format!("{}: no latitude column", path.display())))?;
        let lon_idx = column(&headers, &["lon", "longitude"])
            .ok_or_else(|| Error::parse(format!("{}: no longitude column", path.display())))?;

        let mut locations = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let id = record.get(0).unwrap_or_default().to_string();
            if id.is_empty() {
                continue;
            }
            let number = |idx: usize| -> Result<f64> {
                let cell = record.get(idx).unwrap_or_default();
                cell.parse::<f64>().map_err(|_| {
                    Error::parse(format!(
                        "{}: station {id}: bad coordinate '{cell}'",
                        path.display()
                    ))
                })
            };
            locations.insert(id.clone(), (number(lat_idx)?, number(lon_idx)?));
        }
        tracing::debug!(path = %path.display(), stations = locations.len(), "loaded station metadata");
        Ok(Self { locations })
    }

    /// `(lat, lon)` of a station.
    pub fn location(&self, station: &str) -> Option<(f64, f64)> {
        self.locations.get(station).copied()
    }

    /// True when the station is listed.
    pub fn contains(&self, station: &str) -> bool {
        self.locations.contains_key(station)
    }

    /// Number of stations listed.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True when no station is listed.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
