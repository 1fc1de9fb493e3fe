/// Read-only Postgres access to the upstream tables.
///
/// The schema is owned by the loading scripts; this module only issues
/// `SELECT`s against:
/// - `ercot_load` / `ercot_load_predictions`: wide hourly load, one column
///   per zone label, keyed by `hour_end`.
/// - `weather_hourly`: one row per station and hour.

use chrono::{DateTime, Days, NaiveDate, Utc};
use postgres::{Client, NoTls};

use crate::model::{EngineError, LoadRow, WeatherReading};
use crate::zones::{ZONE_COLUMNS, ZONE_REGISTRY};

use super::finite;

/// Which wide load table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTable {
    Actual,
    Forecast,
}

impl LoadTable {
    pub fn table_name(self) -> &'static str {
        match self {
            LoadTable::Actual => "ercot_load",
            LoadTable::Forecast => "ercot_load_predictions",
        }
    }
}

/// Inclusive range of UTC calendar days; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Half-open instant bounds `[start 00:00 UTC, end + 1 day 00:00 UTC)`.
    fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let lower = self
            .start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let upper = self
            .end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        (lower, upper)
    }
}

/// Connects using `DATABASE_URL` (a `.env` file is honoured).
pub fn connect_from_env() -> Result<Client, EngineError> {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| EngineError::Database("DATABASE_URL must be set".to_string()))?;
    Ok(Client::connect(&database_url, NoTls)?)
}

/// SQL for a wide load table, with zone columns in registry order.
pub fn load_query(table: LoadTable) -> String {
    let columns: Vec<String> = ZONE_REGISTRY
        .iter()
        .map(|z| format!("{0}::float8 AS {0}", z.label))
        .collect();
    format!(
        "SELECT hour_end::timestamptz AS hour_end, {}
         FROM {}
         WHERE ($1::timestamptz IS NULL OR hour_end >= $1)
           AND ($2::timestamptz IS NULL OR hour_end < $2)
         ORDER BY hour_end",
        columns.join(", "),
        table.table_name()
    )
}

const WEATHER_QUERY: &str = "
    SELECT station_id,
           observed_at::timestamptz AS observed_at,
           temp_c::float8, rh_pct::float8, precip_mm::float8,
           wind_kmh::float8, pressure_hpa::float8, cloud_cover_pct::float8
    FROM weather_hourly
    WHERE ($1::timestamptz IS NULL OR observed_at >= $1)
      AND ($2::timestamptz IS NULL OR observed_at < $2)
    ORDER BY station_id, observed_at
";

/// Fetches wide load rows within `range`.
pub fn fetch_load_rows(
    client: &mut Client,
    table: LoadTable,
    range: DateRange,
) -> Result<Vec<LoadRow>, EngineError> {
    let (lower, upper) = range.bounds();
    let rows = client.query(load_query(table).as_str(), &[&lower, &upper])?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let hour_end: DateTime<Utc> = row.try_get(0)?;
        let mut load = LoadRow::empty(hour_end.fixed_offset());
        for (i, col) in ZONE_COLUMNS.iter().enumerate() {
            let value: Option<f64> = row.try_get(i + 1)?;
            (col.set)(&mut load, finite(col.zone.label(), value)?);
        }
        out.push(load);
    }
    Ok(out)
}

/// Fetches hourly station weather within `range`.
pub fn fetch_weather_readings(
    client: &mut Client,
    range: DateRange,
) -> Result<Vec<WeatherReading>, EngineError> {
    let (lower, upper) = range.bounds();
    let rows = client.query(WEATHER_QUERY, &[&lower, &upper])?;

    let mut readings = Vec::with_capacity(rows.len());
    for row in rows {
        let observed_at: DateTime<Utc> = row.try_get(1)?;
        readings.push(WeatherReading {
            station_id: row.try_get(0)?,
            timestamp: observed_at.fixed_offset(),
            temp_c: finite("temp_c", row.try_get(2)?)?,
            rh_pct: finite("rh_pct", row.try_get(3)?)?,
            precip_mm: finite("precip_mm", row.try_get(4)?)?,
            wind_kmh: finite("wind_kmh", row.try_get(5)?)?,
            pressure_hpa: finite("pressure_hpa", row.try_get(6)?)?,
            cloud_cover_pct: finite("cloud_cover_pct", row.try_get(7)?)?,
        });
    }
    Ok(readings)
}
