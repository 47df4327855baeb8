//! Timezone shift of the `valid_time` axis.
//!
//! ERA5 timestamps are UTC. Station observations used alongside them are in
//! local time (AWST, UTC+8), so the daily split should follow local days.

use wxprep_core::{Dataset, Result, VALID_TIME};

/// Adds `hours` to `valid_time`. Datasets without `valid_time` pass through.
pub fn convert_valid_time_timezone(ds: &Dataset, hours: i64) -> Result<Dataset> {
    if ds.coord(VALID_TIME).is_none() || hours == 0 {
        return Ok(ds.clone());
    }
    let mut out = ds.clone();
    out.shift_time(VALID_TIME, hours)?;
    Ok(out)
}
