//! Unit conversions applied to surface variables.

use wxprep_core::{AttrValue, Dataset, Result};

/// Kelvin offset for Celsius.
pub const KELVIN_OFFSET: f32 = 273.15;

/// m/s to km/h.
pub const MS_TO_KMH: f32 = 3.6;

const TEMPERATURE_VARS: [&str; 2] = ["t2m", "d2m"];
const WIND_VARS: [&str; 2] = ["u10", "v10"];

fn convert(ds: &mut Dataset, name: &str, target: &str, f: impl Fn(f32) -> f32) -> Result<()> {
    let Some(var) = ds.var(name) else {
        return Ok(());
    };
    if var.units() == Some(target) {
        tracing::debug!(var = name, units = target, "already converted");
        return Ok(());
    }
    let mut converted = var.map_values(f);
    converted
        .attrs
        .insert("units".to_string(), AttrValue::from(target));
    converted
        .attrs
        .insert("GRIB_units".to_string(), AttrValue::from(target));
    ds.insert_var(name, converted)
}

/// Converts `t2m`/`d2m` from K to °C and `u10`/`v10` from m/s to km/h.
///
/// Missing variables are ignored. A variable whose `units` already match
/// the target is left alone, so applying this twice changes nothing.
pub fn apply_unit_conversions(ds: &Dataset) -> Result<Dataset> {
    let mut out = ds.clone();
    for name in TEMPERATURE_VARS {
        convert(&mut out, name, "C", |k| k - KELVIN_OFFSET)?;
    }
    for name in WIND_VARS {
        convert(&mut out, name, "km/h", |v| v * MS_TO_KMH)?;
    }
    Ok(out)
}
