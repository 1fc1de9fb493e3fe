/// Input readers for the analytics engine.
///
/// Raw records are validated here, at the boundary: a record with a missing
/// timestamp, an unknown zone label or an unparseable number is rejected
/// with an `EngineError` instead of being coerced.
///
/// Submodules:
/// - `load_csv`   : wide hourly load files (actual and forecast).
/// - `weather_csv`: hourly station weather files.
/// - `db`         : read-only queries against the Postgres tables.

pub mod db;
pub mod load_csv;
pub mod weather_csv;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::model::EngineError;

/// Naive timestamp layouts accepted in addition to RFC 3339. Naive values
/// are taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses an RFC 3339 timestamp, or a naive one as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, utc))
}

/// Parses the timestamp of record `line`; empty or unparseable values are
/// malformed input.
pub fn require_timestamp(line: usize, raw: &str) -> Result<DateTime<FixedOffset>, EngineError> {
    let raw = clean(raw);
    if raw.is_empty() {
        return Err(EngineError::MalformedInput {
            line,
            reason: "missing timestamp".to_string(),
        });
    }
    parse_timestamp(raw).ok_or_else(|| EngineError::MalformedInput {
        line,
        reason: format!("unparseable timestamp {:?}", raw),
    })
}

/// Parses an optional numeric field. Empty, `null`, `NA` and `NaN` are
/// missing values; anything else that is not a finite number is an error.
pub fn parse_field(field: &str, raw: &str) -> Result<Option<f64>, EngineError> {
    let s = clean(raw);
    if s.is_empty() || ["null", "na", "nan"].contains(&s.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    let value = s.parse::<f64>().map_err(|_| EngineError::InvalidNumber {
        field: field.to_string(),
        raw: s.to_string(),
    })?;
    finite(field, Some(value))
}

/// Normalizes a stored numeric value: `NaN` is missing, infinities are
/// rejected.
pub fn finite(field: &str, value: Option<f64>) -> Result<Option<f64>, EngineError> {
    match value {
        Some(v) if v.is_nan() => Ok(None),
        Some(v) if v.is_infinite() => Err(EngineError::InvalidNumber {
            field: field.to_string(),
            raw: v.to_string(),
        }),
        other => Ok(other),
    }
}

/// Trims whitespace and one pair of surrounding double quotes.
pub fn clean(raw: &str) -> &str {
    let s = raw.trim();
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
        .trim()
}
