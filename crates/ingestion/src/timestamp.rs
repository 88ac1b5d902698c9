//! Timestamp parsing into timezone-naive instants.
//!
//! Offset-aware text is converted to UTC before the offset is dropped, so two
//! spellings of the same instant always produce the same key. Integers are
//! Unix epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use predchart_core::{Scalar, Timestamp};

/// Formats carrying a UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Formats without an offset. A trailing `Z` means UTC already.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a timestamp cell. Returns `None` for NULL, reals and unrecognised text.
pub fn parse_timestamp(value: &Scalar) -> Option<Timestamp> {
    match value {
        Scalar::Text(s) => parse_timestamp_str(s.trim()),
        Scalar::Integer(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.naive_utc()),
        Scalar::Real(_) | Scalar::Null => None,
    }
}

/// Parse timestamp text.
pub fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    // Date only: midnight.
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}
