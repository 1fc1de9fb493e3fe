/// Core data types for the ERCOT load and weather analytics engine.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no analysis and no I/O, only types and the error enum.
/// Zone metadata and the column accessor table live in `zones`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// ERCOT weather zones plus the system-wide aggregate.
///
/// Zone identity is a label, not a foreign key. Parsing an unknown label is
/// a caller error (`EngineError::UnknownZone`), see `Zone::from_label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Coast,
    East,
    FarWest,
    North,
    #[serde(rename = "north_c")]
    NorthCentral,
    Southern,
    #[serde(rename = "south_c")]
    SouthCentral,
    West,
    Ercot,
}

// ---------------------------------------------------------------------------
// Raw input rows
// ---------------------------------------------------------------------------

/// One hour of load (MW) for every zone, as stored in the wide `ercot_load`
/// table. Forecast rows use the same shape.
///
/// `hour_end` keeps the offset it was recorded with; bucketing converts to
/// UTC before truncating.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRow {
    pub hour_end: DateTime<FixedOffset>,
    pub coast: Option<f64>,
    pub east: Option<f64>,
    pub far_west: Option<f64>,
    pub north: Option<f64>,
    pub north_c: Option<f64>,
    pub southern: Option<f64>,
    pub south_c: Option<f64>,
    pub west: Option<f64>,
    pub ercot: Option<f64>,
}

impl LoadRow {
    /// A row with every zone value missing.
    pub fn empty(hour_end: DateTime<FixedOffset>) -> Self {
        LoadRow {
            hour_end,
            coast: None,
            east: None,
            far_west: None,
            north: None,
            north_c: None,
            southern: None,
            south_c: None,
            west: None,
            ercot: None,
        }
    }
}

/// A single hourly observation from a weather station.
///
/// Stations are fanned out to zones through the station map
/// (see `zones::StationMap`).
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub station_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub temp_c: Option<f64>,
    pub rh_pct: Option<f64>,
    pub precip_mm: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub cloud_cover_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// Long-form observations
// ---------------------------------------------------------------------------

/// A single `(timestamp, zone, value)` record in long form.
///
/// Produced by `analysis::reshape`. `value` is `None` when the source cell
/// was empty; statistics exclude nulls where their semantics require it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<FixedOffset>,
    pub zone: Zone,
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while reading inputs, validating configuration or
/// preparing records for the engine.
///
/// Statistics that cannot be computed are never errors; they are `None`.
#[derive(Debug, PartialEq)]
pub enum EngineError {
    /// A raw record is missing a required field (e.g. the timestamp).
    MalformedInput { line: usize, reason: String },
    /// A zone label outside the fixed zone set.
    UnknownZone(String),
    /// A weather station with no entry in the station map.
    UnmappedStation(String),
    /// A numeric field that is neither empty nor a number.
    InvalidNumber { field: String, raw: String },
    /// A threshold or parameter outside its allowed range.
    InvalidConfig(String),
    /// Reading an input or configuration file failed.
    Io(String),
    /// A database query failed.
    Database(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MalformedInput { line, reason } => {
                write!(f, "Malformed input at line {}: {}", line, reason)
            }
            EngineError::UnknownZone(label) => write!(f, "Unknown zone: {}", label),
            EngineError::UnmappedStation(station) => {
                write!(f, "Station not mapped to a zone: {}", station)
            }
            EngineError::InvalidNumber { field, raw } => {
                write!(f, "Invalid number in {}: {:?}", field, raw)
            }
            EngineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            EngineError::Io(msg) => write!(f, "I/O error: {}", msg),
            EngineError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::InvalidConfig(err.to_string())
    }
}

impl From<postgres::Error> for EngineError {
    fn from(err: postgres::Error) -> Self {
        EngineError::Database(err.to_string())
    }
}
