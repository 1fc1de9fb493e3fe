/// Zone registry for the ERCOT analytics engine.
///
/// Defines the canonical list of load zones, the column accessor table used
/// to fan wide load rows out into long form, and the default mapping from
/// weather stations to zones. All other modules should reference zones and
/// stations from here rather than hardcoding labels.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::model::{EngineError, LoadRow, Zone};

// ---------------------------------------------------------------------------
// Zone metadata
// ---------------------------------------------------------------------------

/// Metadata for a single zone.
pub struct ZoneInfo {
    pub zone: Zone,
    /// Column label used by the `ercot_load` table and the API.
    pub label: &'static str,
    /// Human-readable zone name.
    pub name: &'static str,
    /// `false` for the system-wide aggregate, which has no weather stations.
    pub has_weather: bool,
}

/// All zones in column order of the wide load table.
pub static ZONE_REGISTRY: &[ZoneInfo] = &[
    ZoneInfo { zone: Zone::Coast, label: "coast", name: "Coast", has_weather: true },
    ZoneInfo { zone: Zone::East, label: "east", name: "East", has_weather: true },
    ZoneInfo { zone: Zone::FarWest, label: "far_west", name: "Far West", has_weather: true },
    ZoneInfo { zone: Zone::North, label: "north", name: "North", has_weather: true },
    ZoneInfo { zone: Zone::NorthCentral, label: "north_c", name: "North Central", has_weather: true },
    ZoneInfo { zone: Zone::Southern, label: "southern", name: "Southern", has_weather: true },
    ZoneInfo { zone: Zone::SouthCentral, label: "south_c", name: "South Central", has_weather: true },
    ZoneInfo { zone: Zone::West, label: "west", name: "West", has_weather: true },
    ZoneInfo { zone: Zone::Ercot, label: "ercot", name: "ERCOT System Total", has_weather: false },
];

impl Zone {
    /// Every zone, geographic zones first and the system aggregate last.
    pub const ALL: [Zone; 9] = [
        Zone::Coast,
        Zone::East,
        Zone::FarWest,
        Zone::North,
        Zone::NorthCentral,
        Zone::Southern,
        Zone::SouthCentral,
        Zone::West,
        Zone::Ercot,
    ];

    pub fn info(self) -> &'static ZoneInfo {
        // Registry order matches `Zone::ALL`, and both are exhaustive.
        &ZONE_REGISTRY[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Resolves a column/API label (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn from_label(label: &str) -> Result<Zone, EngineError> {
        let wanted = label.trim().to_ascii_lowercase();
        ZONE_REGISTRY
            .iter()
            .find(|z| z.label == wanted)
            .map(|z| z.zone)
            .ok_or_else(|| EngineError::UnknownZone(label.trim().to_string()))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Zone {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::from_label(s)
    }
}

/// Zones that have weather stations (everything but the system aggregate).
pub fn weather_zones() -> Vec<Zone> {
    ZONE_REGISTRY
        .iter()
        .filter(|z| z.has_weather)
        .map(|z| z.zone)
        .collect()
}

/// Parses a comma-separated zone list such as `"coast, east"`.
/// Empty items are ignored; any unknown label rejects the whole list.
pub fn parse_zone_list(list: &str) -> Result<Vec<Zone>, EngineError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Zone::from_label)
        .collect()
}

// ---------------------------------------------------------------------------
// Wide-row column accessors
// ---------------------------------------------------------------------------

/// Reads and writes one zone's column of a `LoadRow`.
pub struct ZoneColumn {
    pub zone: Zone,
    pub get: fn(&LoadRow) -> Option<f64>,
    pub set: fn(&mut LoadRow, Option<f64>),
}

/// Accessor table used by the reshaper and the CSV/DB readers, in
/// `Zone::ALL` order.
pub static ZONE_COLUMNS: &[ZoneColumn] = &[
    ZoneColumn { zone: Zone::Coast, get: |r| r.coast, set: |r, v| r.coast = v },
    ZoneColumn { zone: Zone::East, get: |r| r.east, set: |r, v| r.east = v },
    ZoneColumn { zone: Zone::FarWest, get: |r| r.far_west, set: |r, v| r.far_west = v },
    ZoneColumn { zone: Zone::North, get: |r| r.north, set: |r, v| r.north = v },
    ZoneColumn { zone: Zone::NorthCentral, get: |r| r.north_c, set: |r, v| r.north_c = v },
    ZoneColumn { zone: Zone::Southern, get: |r| r.southern, set: |r, v| r.southern = v },
    ZoneColumn { zone: Zone::SouthCentral, get: |r| r.south_c, set: |r, v| r.south_c = v },
    ZoneColumn { zone: Zone::West, get: |r| r.west, set: |r, v| r.west = v },
    ZoneColumn { zone: Zone::Ercot, get: |r| r.ercot, set: |r, v| r.ercot = v },
];

pub fn column(zone: Zone) -> &'static ZoneColumn {
    &ZONE_COLUMNS[zone as usize]
}

// ---------------------------------------------------------------------------
// Weather stations
// ---------------------------------------------------------------------------

/// A weather station and the zone its readings are attributed to.
pub struct StationZone {
    /// ICAO identifier of the ASOS station.
    pub station_id: &'static str,
    pub name: &'static str,
    pub zone: Zone,
}

/// Default station assignment: major ASOS airports inside each ERCOT
/// weather zone. Overridden by `[[stations]]` entries in the config file.
pub static DEFAULT_STATION_ZONES: &[StationZone] = &[
    StationZone { station_id: "KIAH", name: "Houston Bush Intercontinental", zone: Zone::Coast },
    StationZone { station_id: "KGLS", name: "Galveston Scholes", zone: Zone::Coast },
    StationZone { station_id: "KTYR", name: "Tyler Pounds Regional", zone: Zone::East },
    StationZone { station_id: "KMAF", name: "Midland International", zone: Zone::FarWest },
    StationZone { station_id: "KSPS", name: "Wichita Falls Sheppard", zone: Zone::North },
    StationZone { station_id: "KDFW", name: "Dallas/Fort Worth International", zone: Zone::NorthCentral },
    StationZone { station_id: "KCRP", name: "Corpus Christi International", zone: Zone::Southern },
    StationZone { station_id: "KBRO", name: "Brownsville South Padre", zone: Zone::Southern },
    StationZone { station_id: "KAUS", name: "Austin-Bergstrom International", zone: Zone::SouthCentral },
    StationZone { station_id: "KSAT", name: "San Antonio International", zone: Zone::SouthCentral },
    StationZone { station_id: "KABI", name: "Abilene Regional", zone: Zone::West },
    StationZone { station_id: "KSJT", name: "San Angelo Mathis Field", zone: Zone::West },
];

/// Lookup table `station_id -> zone` used to fan weather readings out.
#[derive(Debug, Clone, Default)]
pub struct StationMap {
    zones: HashMap<String, Zone>,
}

impl StationMap {
    pub fn from_defaults() -> Self {
        let mut map = StationMap::default();
        for s in DEFAULT_STATION_ZONES {
            map.insert(s.station_id, s.zone);
        }
        map
    }

    /// Adds or replaces a station assignment. Station ids are matched
    /// case-insensitively.
    pub fn insert(&mut self, station_id: &str, zone: Zone) {
        self.zones.insert(station_id.trim().to_ascii_uppercase(), zone);
    }

    pub fn zone_for(&self, station_id: &str) -> Result<Zone, EngineError> {
        self.zones
            .get(&station_id.trim().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| EngineError::UnmappedStation(station_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
