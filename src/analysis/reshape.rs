//! Wide-to-long reshaping.
//!
//! Load tables arrive with one column per zone. The engine works on a long
//! stream of `(timestamp, zone, value)` observations instead, produced by
//! walking the static accessor table in `zones::ZONE_COLUMNS`. Weather
//! readings are keyed by station and are fanned out to zones the same way
//! through a `StationMap`.

use crate::ingest::{parse_field, require_timestamp};
use crate::model::{EngineError, LoadRow, Observation, WeatherReading, Zone};
use crate::zones::{StationMap, ZONE_COLUMNS, column};

/// Builds one observation from raw long-form fields.
///
/// A missing or unparseable timestamp is `MalformedInput` for `line`; an
/// unknown zone label is `UnknownZone`. Empty values are kept as `None`.
pub fn observation_from_parts(
    line: usize,
    timestamp: &str,
    zone: &str,
    value: &str,
) -> Result<Observation, EngineError> {
    let timestamp = require_timestamp(line, timestamp)?;
    let zone = Zone::from_label(zone)?;
    let value = parse_field(zone.label(), value)?;
    Ok(Observation {
        timestamp,
        zone,
        value,
    })
}

/// Lazily emits one observation per (row, zone) pair. Nulls pass through.
///
/// Output order follows the input rows, but consumers must not rely on it.
pub fn reshape(rows: &[LoadRow]) -> impl Iterator<Item = Observation> + '_ {
    rows.iter().flat_map(|row| {
        ZONE_COLUMNS.iter().map(move |col| Observation {
            timestamp: row.hour_end,
            zone: col.zone,
            value: (col.get)(row),
        })
    })
}

/// Same as `reshape`, restricted to a single zone's column.
pub fn reshape_zone(rows: &[LoadRow], zone: Zone) -> impl Iterator<Item = Observation> + '_ {
    let col = column(zone);
    rows.iter().map(move |row| Observation {
        timestamp: row.hour_end,
        zone,
        value: (col.get)(row),
    })
}

/// A weather reading attributed to a zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneReading<'a> {
    pub zone: Zone,
    pub reading: &'a WeatherReading,
}

/// Attributes each station reading to its zone.
///
/// Readings from stations missing in `stations` yield
/// `EngineError::UnmappedStation`; the caller decides whether to skip them.
pub fn fan_out<'a>(
    readings: &'a [WeatherReading],
    stations: &'a StationMap,
) -> impl Iterator<Item = Result<ZoneReading<'a>, EngineError>> + 'a {
    readings.iter().map(move |reading| {
        stations
            .zone_for(&reading.station_id)
            .map(|zone| ZoneReading { zone, reading })
    })
}
