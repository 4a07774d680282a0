//! Temporal conversion helpers.
//!
//! Epoch math uses floor division and floor remainder, never truncation:
//! for any micros `m`, `floor_div(m, 10^6) * 10^6 + floor_mod(m, 10^6) == m`
//! and the remainder is non-negative, which keeps pre-1970 values on the
//! correct calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

pub const MICROS_PER_SEC: i64 = 1_000_000;

const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SEC;

/// Julian day number of the Unix epoch (1970-01-01).
pub const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

pub fn floor_div(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

pub fn floor_mod(a: i64, b: i64) -> i64 {
    a.rem_euclid(b)
}

/// Epoch microseconds to a UTC instant. `None` only for values outside
/// chrono's representable range.
pub fn datetime_from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let secs = floor_div(micros, MICROS_PER_SEC);
    let sub_micros = floor_mod(micros, MICROS_PER_SEC) as u32;
    DateTime::<Utc>::from_timestamp(secs, sub_micros * 1_000)
}

/// Epoch microseconds to the UTC calendar date.
pub fn date_from_micros(micros: i64) -> Option<NaiveDate> {
    datetime_from_micros(micros).map(|dt| dt.date_naive())
}

/// Epoch microseconds to an instant in the named IANA zone. An unknown zone
/// falls back to UTC rather than failing the cell.
pub fn zoned_from_micros(micros: i64, zone: &str) -> Option<DateTime<Tz>> {
    let tz: Tz = match zone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            if !zone.is_empty() {
                warn!(zone, "unknown time zone; rendering in UTC");
            }
            Tz::UTC
        }
    };
    datetime_from_micros(micros).map(|dt| dt.with_timezone(&tz))
}

/// Julian day plus nanoseconds-of-day (floored to microseconds) to a UTC
/// instant.
pub fn datetime_from_julian(julian_day: i32, nanos_of_day: i64) -> Option<DateTime<Utc>> {
    let days = i64::from(julian_day) - i64::from(UNIX_EPOCH_JULIAN_DAY);
    let micros = days
        .checked_mul(MICROS_PER_DAY)?
        .checked_add(nanos_of_day / 1_000)?;
    datetime_from_micros(micros)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
