//! Derived Tables
//!
//! Builds every result table from one set of inputs in a single run.
//! Tables that need an input which was not supplied (a forecast, or
//! weather readings) come back as `None` rather than empty.

pub mod daily;
pub mod forecast;
pub mod heat;
pub mod outliers;
pub mod precipitation;

use std::collections::BTreeSet;

use chrono::Utc;
use serde::Serialize;

use crate::analysis::accuracy::AccuracyMetrics;
use crate::analysis::reshape::{ZoneReading, fan_out, reshape};
use crate::config::AnalysisParams;
use crate::logging::{self, Stage};
use crate::model::{EngineError, LoadRow, Observation, WeatherReading, Zone};
use crate::zones::StationMap;

use forecast::LoadComparisonRow;
use heat::{ExtremeHeatRow, HeatwaveRow};
use outliers::{LoadOutlierRow, LoadOutlierWeatherRow};
use precipitation::PrecipitationRow;

// ============================================================================
// Inputs and Results
// ============================================================================

/// Everything one run reads. Borrowed by [`run`], never modified.
#[derive(Debug, Clone)]
pub struct AnalyticsInputs {
    pub load: Vec<LoadRow>,
    pub forecast: Option<Vec<LoadRow>>,
    pub weather: Vec<WeatherReading>,
    pub stations: StationMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsTables {
    pub generated_at: String,
    pub forecast_metrics: Option<Vec<AccuracyMetrics>>,
    pub load_comparison: Option<Vec<LoadComparisonRow>>,
    pub load_outliers: Option<Vec<LoadOutlierRow>>,
    pub load_outlier_weather: Option<Vec<LoadOutlierWeatherRow>>,
    pub heatwave_streaks: Option<Vec<HeatwaveRow>>,
    pub extreme_heat_load: Option<Vec<ExtremeHeatRow>>,
    pub precipitation_impact: Option<Vec<PrecipitationRow>>,
}

// ============================================================================
// Run
// ============================================================================

/// Computes all tables. Parameters are validated before any work is done.
///
/// Weather readings from stations missing in `inputs.stations` are skipped
/// and logged; every other input problem has already been rejected at
/// ingest.
pub fn run(inputs: &AnalyticsInputs, params: &AnalysisParams) -> Result<AnalyticsTables, EngineError> {
    params.validate()?;

    let observations: Vec<Observation> = reshape(&inputs.load).collect();
    logging::debug(
        Stage::Reshape,
        None,
        &format!("{} load rows -> {} observations", inputs.load.len(), observations.len()),
    );

    // Forecast accuracy
    let (forecast_metrics, load_comparison) = match &inputs.forecast {
        Some(forecast) => {
            let metrics = forecast::forecast_metrics(&inputs.load, forecast);
            for m in metrics.iter().filter(|m| m.n == 0) {
                logging::warn(Stage::Accuracy, Some(m.group.label()), "no paired hours");
            }
            (Some(metrics), Some(forecast::load_comparison(&inputs.load, forecast)))
        }
        None => (None, None),
    };

    // Hourly outliers
    let mut load_outliers = Vec::new();
    for &k in &params.std_dev_thresholds {
        let rows = outliers::load_outliers(&observations, k);
        logging::debug(Stage::Outliers, None, &format!("k = {}: {} hourly outliers", k, rows.len()));
        load_outliers.extend(rows);
    }

    // Weather-dependent tables
    let zone_readings = attribute_readings(&inputs.weather, &inputs.stations);
    let weather_results = if inputs.weather.is_empty() {
        logging::warn(Stage::Correlate, None, "no weather readings supplied");
        None
    } else {
        Some(weather_tables(inputs, &observations, &zone_readings, params)?)
    };
    let (load_outlier_weather, heatwave_streaks, extreme_heat_load, precipitation_impact) =
        match weather_results {
            Some(t) => (Some(t.0), Some(t.1), Some(t.2), Some(t.3)),
            None => (None, None, None, None),
        };

    let tables = AnalyticsTables {
        generated_at: Utc::now().to_rfc3339(),
        forecast_metrics,
        load_comparison,
        load_outliers: Some(load_outliers),
        load_outlier_weather,
        heatwave_streaks,
        extreme_heat_load,
        precipitation_impact,
    };

    for (name, rows) in tables.row_counts() {
        logging::log_table_summary(name, rows);
    }
    Ok(tables)
}

type WeatherTables = (
    Vec<LoadOutlierWeatherRow>,
    Vec<HeatwaveRow>,
    Vec<ExtremeHeatRow>,
    Vec<PrecipitationRow>,
);

fn weather_tables(
    inputs: &AnalyticsInputs,
    observations: &[Observation],
    zone_readings: &[ZoneReading],
    params: &AnalysisParams,
) -> Result<WeatherTables, EngineError> {
    let load_stats = daily::daily_load(observations);
    let peaks = daily::daily_peaks(&load_stats);
    let means = daily::daily_means(&load_stats);
    let zone_weather = daily::daily_weather(zone_readings);
    let system_weather = daily::daily_weather(&daily::system_readings(&inputs.weather));
    logging::debug(
        Stage::Aggregate,
        None,
        &format!(
            "{} zone-days of load, {} zone-days of weather",
            load_stats.len(),
            zone_weather.len()
        ),
    );

    let mut outlier_weather = Vec::new();
    for &k in &params.std_dev_thresholds {
        outlier_weather.extend(outliers::load_outlier_weather(&inputs.load, &system_weather, k));
    }

    let heatwaves = heat::heatwave_streaks(&zone_weather, &peaks, params.min_temp_f, params.min_days)?;
    logging::debug(Stage::Streaks, None, &format!("{} heatwave streaks", heatwaves.len()));

    let mut extreme_heat = Vec::new();
    for &p in &params.extreme_heat_percentiles {
        extreme_heat.extend(heat::extreme_heat_load(
            &zone_weather,
            &peaks,
            p,
            params.median_percentile,
        ));
    }

    let precipitation =
        precipitation::precipitation_impact(&zone_weather, &means, params.rain_threshold_mm);

    Ok((outlier_weather, heatwaves, extreme_heat, precipitation))
}

/// Maps readings to zones, skipping unmapped stations. Each unmapped
/// station is logged once.
fn attribute_readings<'a>(weather: &'a [WeatherReading], stations: &'a StationMap) -> Vec<ZoneReading<'a>> {
    let mut skipped = 0;
    let mut unmapped: BTreeSet<&str> = BTreeSet::new();
    let mut readings = Vec::with_capacity(weather.len());
    for (reading, result) in weather.iter().zip(fan_out(weather, stations)) {
        match result {
            Ok(r) => readings.push(r),
            Err(e) => {
                if unmapped.insert(reading.station_id.as_str()) {
                    logging::log_skipped_record(Stage::Reshape, &reading.station_id, &e);
                }
                skipped += 1;
            }
        }
    }
    if !weather.is_empty() {
        logging::log_ingest_summary("weather", weather.len(), skipped);
    }
    readings
}

// ============================================================================
// Output
// ============================================================================

impl AnalyticsTables {
    /// Row count per table, `None` for tables that were not computed.
    pub fn row_counts(&self) -> [(&'static str, Option<usize>); 7] {
        [
            ("forecast_metrics", self.forecast_metrics.as_ref().map(Vec::len)),
            ("load_comparison", self.load_comparison.as_ref().map(Vec::len)),
            ("load_outliers", self.load_outliers.as_ref().map(Vec::len)),
            ("load_outlier_weather", self.load_outlier_weather.as_ref().map(Vec::len)),
            ("heatwave_streaks", self.heatwave_streaks.as_ref().map(Vec::len)),
            ("extreme_heat_load", self.extreme_heat_load.as_ref().map(Vec::len)),
            ("precipitation_impact", self.precipitation_impact.as_ref().map(Vec::len)),
        ]
    }
}

/// Writes all tables as one pretty-printed JSON document.
pub fn write_json(tables: &AnalyticsTables, path: &str) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(tables)
        .map_err(|e| EngineError::Io(format!("serializing tables: {}", e)))?;
    std::fs::write(path, json).map_err(|e| EngineError::Io(format!("{}: {}", path, e)))
}

pub fn print_summary(tables: &AnalyticsTables) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 ANALYTICS SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    for (name, rows) in tables.row_counts() {
        match rows {
            Some(n) => println!("{:<24} {:>8} rows", name, n),
            None => println!("{:<24} {:>8}", name, "n/a"),
        }
    }
    println!();

    if let Some(metrics) = &tables.forecast_metrics {
        if let Some(system) = metrics.iter().find(|m| m.group == Zone::Ercot) {
            match system.mape_pct {
                Some(mape) => println!("System forecast MAPE: {:.2}% over {} hours", mape, system.n),
                None => println!("System forecast MAPE: n/a"),
            }
        }
    }
    println!("Generated at {}", tables.generated_at);
    println!("═══════════════════════════════════════════════════════════");
}
