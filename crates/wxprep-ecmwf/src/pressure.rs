//! Flattening of pressure-level variables.
//!
//! `r(valid_time, pressure_level, latitude, longitude)` becomes
//! `r1000(valid_time, latitude, longitude)`, `r850(...)`, `r500(...)`.

use std::collections::BTreeSet;

use wxprep_core::{CoordValues, Dataset, Result};

/// Name of the pressure dimension in ERA5 pressure-level files.
pub const PRESSURE_LEVEL: &str = "pressure_level";

/// Default hPa levels extracted when the config does not say otherwise.
pub const DEFAULT_LEVELS: [i64; 3] = [1000, 850, 500];

/// Index of the level nearest to `target`; the first one wins ties.
fn nearest_level(levels: &[i64], target: i64) -> Option<usize> {
    levels
        .iter()
        .enumerate()
        .min_by_key(|(i, l)| ((**l - target).abs(), *i))
        .map(|(i, _)| i)
}

/// Splits every pressure-level variable into one variable per target level.
///
/// Returns an empty dataset when `ds` has no `pressure_level` dimension or
/// no variable uses it. When a target level is not present, the nearest
/// level is used and the output keeps the requested name.
pub fn extract_pressure_levels(ds: &Dataset, targets: &[i64]) -> Result<Dataset> {
    if ds.dim_len(PRESSURE_LEVEL).is_none() {
        return Ok(Dataset::new());
    }
    let pressure_vars: Vec<&String> = ds
        .data_vars()
        .iter()
        .filter(|(_, v)| v.axis_of(PRESSURE_LEVEL).is_some())
        .map(|(name, _)| name)
        .collect();
    if pressure_vars.is_empty() {
        return Ok(Dataset::new());
    }

    let levels: Vec<i64> = match ds.coord(PRESSURE_LEVEL).map(|c| &c.values) {
        Some(CoordValues::Numeric(values)) => values.iter().map(|v| *v as i64).collect(),
        _ => {
            tracing::warn!("pressure_level dimension has no numeric coordinate");
            return Ok(Dataset::new());
        }
    };

    let mut out = Dataset::new();
    let mut used_dims = BTreeSet::new();
    for name in pressure_vars {
        let var = &ds.data_vars()[name];
        for &target in targets {
            let Some(idx) = nearest_level(&levels, target) else {
                continue;
            };
            let actual = levels[idx];
            if actual != target {
                tracing::warn!(
                    var = %name,
                    requested = target,
                    using = actual,
                    "requested pressure level not present, using nearest"
                );
            }
            let flat = var.index_axis(PRESSURE_LEVEL, idx)?;
            used_dims.extend(flat.dims().iter().cloned());
            out.insert_var(format!("{name}{target}"), flat)?;
        }
    }

    // Only index coordinates of the surviving dimensions come along
    for (name, coord) in ds.coords() {
        if name == &coord.dim && used_dims.contains(name) {
            out.insert_coord(name.clone(), coord.clone())?;
        }
    }
    Ok(out)
}
