use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Reserved cell text for a row-stream value the decoder could not convert.
pub const PARSE_SENTINEL: &str = "Failed to parse.";

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// One decoded row cell.
///
/// The `Display` renderings are part of the contract: dates render as the
/// ISO calendar date in UTC, datetimes as ISO-8601 with millisecond
/// precision, zoned timestamps with their UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Decimal(BigDecimal),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Zoned(DateTime<Tz>),
}

impl Value {
    /// The reserved conversion-failure cell for the row stream.
    pub fn parse_sentinel() -> Value {
        Value::Str(PARSE_SENTINEL.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Bytes(v) => {
                f.write_str("0x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.3f")),
            Value::Zoned(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.3f%:z")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_renders_iso_calendar_date() {
        let d = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2023-07-04");
    }

    #[test]
    fn datetime_renders_millisecond_precision() {
        let dt = Utc.timestamp_opt(1_688_472_000, 123_000_000).unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2023-07-04T12:00:00.123");
    }

    #[test]
    fn bytes_render_as_hex() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "0xdead");
    }
}
