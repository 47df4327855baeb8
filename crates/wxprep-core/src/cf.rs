//! CF convention helpers: time units and packed variables.
//!
//! ERA5 files coming out of the CDS encode time as `seconds since 1970-01-01`
//! (newer archives) or `hours since 1900-01-01 00:00:00.0` (older ones), and
//! frequently store fields as packed `short`s with `scale_factor`/`add_offset`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::{Error, Result};

/// Units string used when writing time coordinates.
pub const EPOCH_SECONDS: &str = "seconds since 1970-01-01 00:00:00";

/// Step of a CF time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

impl TimeStep {
    fn seconds(self) -> f64 {
        match self {
            TimeStep::Seconds => 1.0,
            TimeStep::Minutes => 60.0,
            TimeStep::Hours => 3_600.0,
            TimeStep::Days => 86_400.0,
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(TimeStep::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(TimeStep::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeStep::Hours),
            "d" | "day" | "days" => Some(TimeStep::Days),
            _ => None,
        }
    }
}

/// Parsed `"<step> since <reference>"` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    /// Step size
    pub step: TimeStep,
    /// Reference instant
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    /// Parses a CF `units` string.
    ///
    /// ```
    /// use wxprep_core::cf::{TimeStep, TimeUnits};
    ///
    /// let units = TimeUnits::parse("hours since 1900-01-01 00:00:00.0").unwrap();
    /// assert_eq!(units.step, TimeStep::Hours);
    /// ```
    pub fn parse(units: &str) -> Result<Self> {
        let mut parts = units.trim().splitn(3, char::is_whitespace);
        let step_word = parts.next().unwrap_or_default();
        let since = parts.next().unwrap_or_default();
        let reference = parts.next().unwrap_or_default().trim();

        let step = TimeStep::parse(step_word)
            .ok_or_else(|| Error::parse(format!("unknown time step in units '{units}'")))?;
        if !since.eq_ignore_ascii_case("since") || reference.is_empty() {
            return Err(Error::parse(format!("expected '<step> since <date>', got '{units}'")));
        }

        Ok(Self {
            step,
            reference: parse_reference(reference)
                .ok_or_else(|| Error::parse(format!("bad reference date in units '{units}'")))?,
        })
    }

    /// The encoding written by this crate.
    pub fn epoch_seconds() -> Self {
        Self {
            step: TimeStep::Seconds,
            reference: DateTime::UNIX_EPOCH.naive_utc(),
        }
    }

    /// Converts an encoded offset to a timestamp, rounded to the millisecond.
    pub fn decode(&self, value: f64) -> Result<NaiveDateTime> {
        if !value.is_finite() {
            return Err(Error::parse(format!("non-finite time value {value}")));
        }
        let millis = (value * self.step.seconds() * 1_000.0).round();
        if millis.abs() > i64::MAX as f64 {
            return Err(Error::parse(format!("time value {value} out of range")));
        }
        TimeDelta::try_milliseconds(millis as i64)
            .and_then(|d| self.reference.checked_add_signed(d))
            .ok_or_else(|| Error::parse(format!("time value {value} out of range")))
    }

    /// Converts a timestamp to an offset in these units.
    pub fn encode(&self, t: NaiveDateTime) -> f64 {
        let delta = t - self.reference;
        delta.num_milliseconds() as f64 / 1_000.0 / self.step.seconds()
    }
}

fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let s = s
        .trim_end_matches(" UTC")
        .trim_end_matches(" utc")
        .trim_end_matches('Z')
        .trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Packing and missing-value attributes of a stored variable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Packing {
    /// Multiplier applied to raw values
    pub scale_factor: Option<f64>,
    /// Offset added after scaling
    pub add_offset: Option<f64>,
    /// `_FillValue`, compared against raw values
    pub fill_value: Option<f64>,
    /// `missing_value`, compared against raw values
    pub missing_value: Option<f64>,
}

impl Packing {
    /// True when raw values need no transformation.
    pub fn is_identity(&self) -> bool {
        *self == Packing::default()
    }
}

/// Turns raw stored values into physical `f32` values; fill values become NaN.
pub fn unpack(raw: &[f64], packing: &Packing) -> Vec<f32> {
    let scale = packing.scale_factor.unwrap_or(1.0);
    let offset = packing.add_offset.unwrap_or(0.0);
    raw.iter()
        .map(|&v| {
            let missing = packing.fill_value.is_some_and(|f| v == f)
                || packing.missing_value.is_some_and(|m| v == m)
                || v.is_nan();
            if missing {
                f32::NAN
            } else {
                (v * scale + offset) as f32
            }
        })
        .collect()
}
