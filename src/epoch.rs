//! Epoch-millisecond timestamps and duration arithmetic.
//!
//! Forecast run times and target times travel through the crate as epoch
//! milliseconds (`i64`); this module converts between those and
//! [`chrono`] timestamps and shifts them by enumerated duration units.
//! It only labels rows for display and export — the fitting and
//! evaluation math works on the raw millisecond integers directly.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One hour in epoch milliseconds.
pub const HOUR_IN_MS: i64 = 3_600_000;
/// One day in epoch milliseconds.
pub const ONE_DAY_IN_MS: i64 = 86_400_000;
/// Five days in epoch milliseconds, the provider's forecast window.
pub const FIVE_DAYS_IN_MS: i64 = 432_000_000;

const WEEK_IN_MS: i64 = 7 * ONE_DAY_IN_MS;

/// Errors from timestamp conversion and duration parsing.
#[derive(Error, Debug, PartialEq)]
pub enum TimeError {
    /// The unit name is not one of the recognized duration units.
    #[error(
        "unknown duration unit {unit:?} (expected one of: milliseconds, \
         seconds, minutes, hours, days, four-week-months)"
    )]
    UnknownUnit { unit: String },
    /// The epoch-millisecond value does not map to a representable timestamp.
    #[error("epoch millisecond value {0} is out of range for a timestamp")]
    OutOfRange(i64),
}

/// A duration unit accepted by [`add_duration`] and [`shift_ms`].
///
/// The set is closed: anything outside these six names is rejected by
/// [`DurationUnit::from_str`] with [`TimeError::UnknownUnit`]. A
/// four-week month is exactly 28 days, the convention the forecast
/// provider uses for monthly horizons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    FourWeekMonths,
}

impl DurationUnit {
    /// Length of one unit in epoch milliseconds.
    pub fn in_ms(self) -> i64 {
        match self {
            DurationUnit::Milliseconds => 1,
            DurationUnit::Seconds => 1_000,
            DurationUnit::Minutes => 60_000,
            DurationUnit::Hours => HOUR_IN_MS,
            DurationUnit::Days => ONE_DAY_IN_MS,
            DurationUnit::FourWeekMonths => 4 * WEEK_IN_MS,
        }
    }

    fn name(self) -> &'static str {
        match self {
            DurationUnit::Milliseconds => "milliseconds",
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
            DurationUnit::Days => "days",
            DurationUnit::FourWeekMonths => "four-week-months",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DurationUnit {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "milliseconds" => Ok(DurationUnit::Milliseconds),
            "seconds" => Ok(DurationUnit::Seconds),
            "minutes" => Ok(DurationUnit::Minutes),
            "hours" => Ok(DurationUnit::Hours),
            "days" => Ok(DurationUnit::Days),
            "four-week-months" => Ok(DurationUnit::FourWeekMonths),
            other => Err(TimeError::UnknownUnit {
                unit: other.to_string(),
            }),
        }
    }
}

/// The Unix epoch origin, constructed fresh on every call.
///
/// Callers that want duration arithmetic "relative to the epoch" pass
/// this as the base; nothing is shared between calls.
pub fn epoch_origin() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Converts a timestamp in any timezone to epoch milliseconds.
pub fn epoch_ms<Tz: TimeZone>(datetime: &DateTime<Tz>) -> i64 {
    datetime.timestamp_millis()
}

/// Converts epoch milliseconds back to a UTC timestamp.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] when the value lies outside the
/// range `chrono` can represent.
pub fn from_epoch_ms(ms: i64) -> Result<DateTime<Utc>, TimeError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(TimeError::OutOfRange(ms))
}

/// Adds `amount` units to a base timestamp.
pub fn add_duration(
    base: DateTime<Utc>,
    amount: i64,
    unit: DurationUnit,
) -> Result<DateTime<Utc>, TimeError> {
    from_epoch_ms(shift_ms(epoch_ms(&base), amount, unit))
}

/// Shifts an epoch-millisecond value by `amount` units.
pub fn shift_ms(ms: i64, amount: i64, unit: DurationUnit) -> i64 {
    ms + amount * unit.in_ms()
}
