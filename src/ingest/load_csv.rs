/// Wide hourly load CSV reader.
///
/// Expected layout (the export format of the `ercot_load` table, also used
/// for forecast files):
///
/// ```text
/// hour_end,coast,east,far_west,north,north_c,southern,south_c,west,ercot
/// 2024-01-01 01:00:00,10472.1,1397.9,3268.5,851.4,12480.3,3046.6,6985.2,1107.3,39609.3
/// ```
///
/// The first column is the timestamp; every other header must be a zone
/// label. Zones without a column read as missing.

use crate::model::{EngineError, LoadRow, Zone};
use crate::zones::column;

use super::{clean, parse_field, require_timestamp};

/// Reads and parses a wide load CSV file.
pub fn read_load_csv(path: &str) -> Result<Vec<LoadRow>, EngineError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Io(format!("{}: {}", path, e)))?;
    parse_load_csv(&text)
}

/// Parses wide load CSV text. Fails on the first malformed record.
pub fn parse_load_csv(text: &str) -> Result<Vec<LoadRow>, EngineError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    let zones = parse_header(header_line, header)?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < zones.len() + 1 {
            return Err(EngineError::MalformedInput {
                line: line_no,
                reason: format!("expected {} fields, found {}", zones.len() + 1, fields.len()),
            });
        }

        let hour_end = require_timestamp(line_no, fields[0])?;

        let mut row = LoadRow::empty(hour_end);
        for (zone, raw) in zones.iter().zip(&fields[1..]) {
            let value = parse_field(zone.label(), raw)?;
            (column(*zone).set)(&mut row, value);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Maps header columns after the timestamp to zones.
fn parse_header(line_no: usize, header: &str) -> Result<Vec<Zone>, EngineError> {
    let mut zones: Vec<Zone> = Vec::new();
    for label in header.split(',').skip(1) {
        let zone = Zone::from_label(clean(label))?;
        if zones.contains(&zone) {
            return Err(EngineError::MalformedInput {
                line: line_no,
                reason: format!("duplicate column for zone '{}'", zone),
            });
        }
        zones.push(zone);
    }
    Ok(zones)
}
