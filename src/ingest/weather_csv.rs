/// Hourly station weather CSV reader.
///
/// Columns are matched by header name, in any order:
/// `station_id`, `timestamp` (required) and the optional measurements
/// `temp_c`, `rh_pct`, `precip_mm`, `wind_kmh`, `pressure_hpa`,
/// `cloud_cover_pct`. Unrecognized columns are ignored.

use crate::model::{EngineError, WeatherReading};

use super::{clean, parse_field, require_timestamp};

/// Column positions resolved from the header.
struct WeatherColumns {
    station_id: usize,
    timestamp: usize,
    temp_c: Option<usize>,
    rh_pct: Option<usize>,
    precip_mm: Option<usize>,
    wind_kmh: Option<usize>,
    pressure_hpa: Option<usize>,
    cloud_cover_pct: Option<usize>,
}

impl WeatherColumns {
    fn from_header(line_no: usize, header: &str) -> Result<Self, EngineError> {
        let names: Vec<String> = header
            .split(',')
            .map(|h| clean(h).to_ascii_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| EngineError::MalformedInput {
                line: line_no,
                reason: format!("missing required column '{}'", name),
            })
        };

        Ok(WeatherColumns {
            station_id: require("station_id")?,
            timestamp: require("timestamp")?,
            temp_c: find("temp_c"),
            rh_pct: find("rh_pct"),
            precip_mm: find("precip_mm"),
            wind_kmh: find("wind_kmh"),
            pressure_hpa: find("pressure_hpa"),
            cloud_cover_pct: find("cloud_cover_pct"),
        })
    }
}

/// Reads and parses an hourly weather CSV file.
pub fn read_weather_csv(path: &str) -> Result<Vec<WeatherReading>, EngineError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Io(format!("{}: {}", path, e)))?;
    parse_weather_csv(&text)
}

/// Parses hourly weather CSV text. Fails on the first malformed record.
pub fn parse_weather_csv(text: &str) -> Result<Vec<WeatherReading>, EngineError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    let cols = WeatherColumns::from_header(header_line, header)?;

    let mut readings = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').collect();
        let get = |idx: usize| fields.get(idx).map(|f| clean(f)).unwrap_or("");
        let measure = |idx: Option<usize>, name: &str| match idx {
            Some(i) => parse_field(name, get(i)),
            None => Ok(None),
        };

        let station_id = get(cols.station_id);
        if station_id.is_empty() {
            return Err(EngineError::MalformedInput {
                line: line_no,
                reason: "missing station_id".to_string(),
            });
        }
        let timestamp = require_timestamp(line_no, get(cols.timestamp))?;

        readings.push(WeatherReading {
            station_id: station_id.to_string(),
            timestamp,
            temp_c: measure(cols.temp_c, "temp_c")?,
            rh_pct: measure(cols.rh_pct, "rh_pct")?,
            precip_mm: measure(cols.precip_mm, "precip_mm")?,
            wind_kmh: measure(cols.wind_kmh, "wind_kmh")?,
            pressure_hpa: measure(cols.pressure_hpa, "pressure_hpa")?,
            cloud_cover_pct: measure(cols.cloud_cover_pct, "cloud_cover_pct")?,
        });
    }
    Ok(readings)
}

/// Converts degrees Celsius to Fahrenheit.
pub fn c_to_f(temp_c: f64) -> f64 {
    temp_c * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
station_id,timestamp,temp_c,rh_pct,precip_mm,wind_kmh,pressure_hpa,cloud_cover_pct
KIAH,2023-08-01 20:00:00,38.9,41,0.0,14.8,1012.2,20
KIAH,2023-08-01 21:00:00,37.2,,2.5,11.1,1012.6,75
";

    #[test]
    fn test_parses_full_rows() {
        let readings = parse_weather_csv(SAMPLE).expect("sample should parse");
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].station_id, "KIAH");
        assert_eq!(readings[0].temp_c, Some(38.9));
        assert_eq!(readings[0].cloud_cover_pct, Some(20.0));
        assert_eq!(readings[1].rh_pct, None);
        assert_eq!(readings[1].precip_mm, Some(2.5));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let text = "timestamp,station_id,precip_mm\n2023-08-01 20:00,KAUS,1.2\n";
        let readings = parse_weather_csv(text).unwrap();
        assert_eq!(readings[0].station_id, "KAUS");
        assert_eq!(readings[0].precip_mm, Some(1.2));
        assert_eq!(readings[0].temp_c, None);
    }

    #[test]
    fn test_missing_required_column_is_rejected() {
        let text = "station_id,temp_c\nKIAH,30\n";
        assert!(matches!(
            parse_weather_csv(text),
            Err(EngineError::MalformedInput { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_station_or_timestamp_is_rejected() {
        let text = "station_id,timestamp\n,2023-08-01 20:00\n";
        assert!(matches!(
            parse_weather_csv(text),
            Err(EngineError::MalformedInput { line: 2, .. })
        ));

        let text = "station_id,timestamp\nKIAH,\n";
        assert!(matches!(
            parse_weather_csv(text),
            Err(EngineError::MalformedInput { line: 2, .. })
        ));
    }

    #[test]
    fn test_c_to_f() {
        assert_eq!(c_to_f(100.0), 212.0);
        assert_eq!(c_to_f(0.0), 32.0);
        assert!((c_to_f(37.78) - 100.004).abs() < 1e-9);
    }
}
