//! Stations with data but no metadata.

use std::collections::BTreeSet;
use std::path::Path;

use wxprep_core::Result;

use crate::metadata::StationMetadata;
use crate::stations::{station_csvs, station_name};

/// Station CSV stems in `dir` that are neither excluded nor in `meta`.
///
/// These are the stations [`combine_stations`](crate::combine_stations)
/// would reject.
pub fn compare_csv_to_metadata<S: AsRef<str>>(
    dir: &Path,
    excluded: &[S],
    meta: &StationMetadata,
) -> Result<BTreeSet<String>> {
    let excluded: BTreeSet<&str> = excluded.iter().map(AsRef::as_ref).collect();
    let missing: BTreeSet<String> = station_csvs(dir)?
        .iter()
        .filter_map(|p| station_name(p))
        .filter(|s| !excluded.contains(s.as_str()) && !meta.contains(s))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(dir = %dir.display(), count = missing.len(), "stations missing from metadata");
    }
    Ok(missing)
}
