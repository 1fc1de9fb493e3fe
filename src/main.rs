/// ercot_analytics [config.toml]
///
/// Batch run: load the configuration, read load/forecast/weather inputs
/// from CSV files or Postgres, compute every result table, print a summary
/// and optionally write the tables as JSON.

use std::process;

use ercot_analytics::config::{self, AnalyticsConfig, InputSource};
use ercot_analytics::ingest::db::{self, DateRange, LoadTable};
use ercot_analytics::ingest::load_csv::read_load_csv;
use ercot_analytics::ingest::weather_csv::read_weather_csv;
use ercot_analytics::logging::{self, Stage};
use ercot_analytics::model::EngineError;
use ercot_analytics::reports::{self, AnalyticsInputs};

const DEFAULT_CONFIG_PATH: &str = "analytics.toml";

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load {}: {}", config_path, e);
            process::exit(1);
        }
    };

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(Stage::System, None, &format!("📁 Using configuration {}", config_path));

    if let Err(e) = run(&config) {
        logging::error(Stage::System, None, &e.to_string());
        process::exit(1);
    }
}

fn run(config: &AnalyticsConfig) -> Result<(), EngineError> {
    let params = config.params()?;
    let inputs = load_inputs(config)?;

    let tables = reports::run(&inputs, &params)?;
    reports::print_summary(&tables);

    if let Some(path) = &config.output.json_path {
        reports::write_json(&tables, path)?;
        logging::info(Stage::System, None, &format!("💾 Tables written to {}", path));
    }
    Ok(())
}

fn load_inputs(config: &AnalyticsConfig) -> Result<AnalyticsInputs, EngineError> {
    let stations = config.station_map();

    let (load, forecast, weather) = match config.inputs.source {
        InputSource::Csv => {
            let load_path = config.inputs.load_csv.as_deref().ok_or_else(|| {
                EngineError::InvalidConfig("inputs.load_csv is required when source = \"csv\"".to_string())
            })?;
            let load = read_load_csv(load_path)?;
            let forecast = config
                .inputs
                .forecast_csv
                .as_deref()
                .map(read_load_csv)
                .transpose()?;
            let weather = match config.inputs.weather_csv.as_deref() {
                Some(path) => read_weather_csv(path)?,
                None => Vec::new(),
            };
            (load, forecast, weather)
        }
        InputSource::Database => {
            let range = DateRange {
                start: config.inputs.start_date,
                end: config.inputs.end_date,
            };
            let mut client = db::connect_from_env()?;
            logging::info(Stage::Database, None, "Connected to database");

            let load = db::fetch_load_rows(&mut client, LoadTable::Actual, range)?;
            let forecast = db::fetch_load_rows(&mut client, LoadTable::Forecast, range)?;
            let weather = db::fetch_weather_readings(&mut client, range)?;
            let forecast = if forecast.is_empty() { None } else { Some(forecast) };
            (load, forecast, weather)
        }
    };

    logging::info(
        Stage::Ingest,
        Some("load"),
        &format!("{} hourly rows", load.len()),
    );
    match &forecast {
        Some(rows) => logging::info(Stage::Ingest, Some("forecast"), &format!("{} hourly rows", rows.len())),
        None => logging::info(Stage::Ingest, Some("forecast"), "none supplied"),
    }
    logging::info(
        Stage::Ingest,
        Some("weather"),
        &format!("{} readings, {} stations mapped", weather.len(), stations.len()),
    );

    Ok(AnalyticsInputs {
        load,
        forecast,
        weather,
        stations,
    })
}
