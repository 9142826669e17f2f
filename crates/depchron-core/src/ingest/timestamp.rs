//! Lenient ISO-8601 timestamp parsing.
//!
//! Registry exports mix RFC 3339 (`2018-01-01T10:00:00Z`), zoned ISO with a
//! region suffix (`2018-01-01T10:00:00+01:00[Europe/Zurich]`), naive
//! date-times, and bare dates. The calendar date is always the one local to
//! the timestamp's own offset; nothing is converted to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::RowError;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp into its local date-time.
///
/// # Errors
///
/// Returns [`RowError::Timestamp`] if no supported layout matches.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, RowError> {
    let trimmed = strip_region(raw.trim());

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }

    let with_offset = trimmed
        .strip_suffix('Z')
        .map_or_else(|| trimmed.to_string(), |head| format!("{head}+00:00"));
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
            return Ok(dt.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| RowError::Timestamp(raw.to_string()))
}

/// Parse a timestamp and keep only its local calendar date.
///
/// # Errors
///
/// Returns [`RowError::Timestamp`] if no supported layout matches.
pub fn parse_date(raw: &str) -> Result<NaiveDate, RowError> {
    parse_timestamp(raw).map(|dt| dt.date())
}

/// Drop a trailing `[Region/City]` zone id.
fn strip_region(raw: &str) -> &str {
    match (raw.ends_with(']'), raw.rfind('[')) {
        (true, Some(open)) => &raw[..open],
        _ => raw,
    }
}
