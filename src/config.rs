/// Configuration for the analytics service.
///
/// Loaded from a TOML file (see `analytics.toml` at the repository root).
/// Every section is optional; missing keys fall back to the documented
/// defaults. Thresholds are validated before any computation starts.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::analysis::outliers::DEFAULT_K;
use crate::analysis::streaks::DEFAULT_MIN_DAYS;
use crate::logging::LogLevel;
use crate::model::{EngineError, Zone};
use crate::zones::{StationMap, weather_zones};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Daily maximum temperature at or above which a day counts toward a heatwave.
pub const DEFAULT_MIN_TEMP_F: f64 = 100.0;

/// Percentile of daily maximum temperature that defines an extreme-heat day.
pub const DEFAULT_EXTREME_HEAT_PERCENTILE: f64 = 0.99;

/// Percentile reported as the "median" peak load.
pub const DEFAULT_MEDIAN_PERCENTILE: f64 = 0.5;

// ---------------------------------------------------------------------------
// File configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub inputs: InputConfig,
    pub outliers: OutlierConfig,
    pub heatwaves: HeatwaveConfig,
    pub extreme_heat: ExtremeHeatConfig,
    pub precipitation: PrecipitationConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    /// Station assignments added to (or overriding) the built-in registry.
    pub stations: Vec<StationEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    #[default]
    Csv,
    Database,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub source: InputSource,
    pub load_csv: Option<String>,
    pub forecast_csv: Option<String>,
    pub weather_csv: Option<String>,
    /// Inclusive UTC date range applied to database reads.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// One outlier table is produced per multiplier.
    pub std_dev_thresholds: Vec<f64>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        OutlierConfig {
            std_dev_thresholds: vec![DEFAULT_K],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeatwaveConfig {
    pub min_temp_f: f64,
    pub min_days: usize,
}

impl Default for HeatwaveConfig {
    fn default() -> Self {
        HeatwaveConfig {
            min_temp_f: DEFAULT_MIN_TEMP_F,
            min_days: DEFAULT_MIN_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtremeHeatConfig {
    /// Fractions in `[0, 1]`; one set of rows per percentile.
    pub percentiles: Vec<f64>,
    pub median_percentile: f64,
}

impl Default for ExtremeHeatConfig {
    fn default() -> Self {
        ExtremeHeatConfig {
            percentiles: vec![DEFAULT_EXTREME_HEAT_PERCENTILE],
            median_percentile: DEFAULT_MEDIAN_PERCENTILE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrecipitationConfig {
    /// A day is rainy when its precipitation total exceeds this value.
    pub rain_threshold_mm: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationEntry {
    pub station_id: String,
    pub zone: Zone,
}

impl AnalyticsConfig {
    /// Engine parameters, validated.
    pub fn params(&self) -> Result<AnalysisParams, EngineError> {
        let params = AnalysisParams {
            std_dev_thresholds: self.outliers.std_dev_thresholds.clone(),
            min_temp_f: self.heatwaves.min_temp_f,
            min_days: self.heatwaves.min_days,
            extreme_heat_percentiles: self.extreme_heat.percentiles.clone(),
            median_percentile: self.extreme_heat.median_percentile,
            rain_threshold_mm: self.precipitation.rain_threshold_mm,
        };
        params.validate()?;
        Ok(params)
    }

    /// Built-in station registry with the `[[stations]]` overrides applied.
    pub fn station_map(&self) -> StationMap {
        let mut map = StationMap::from_defaults();
        for entry in &self.stations {
            map.insert(&entry.station_id, entry.zone);
        }
        map
    }
}

/// Parses a configuration file and validates its thresholds.
pub fn load_config(path: &str) -> Result<AnalyticsConfig, EngineError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Io(format!("{}: {}", path, e)))?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<AnalyticsConfig, EngineError> {
    let config: AnalyticsConfig = toml::from_str(text)?;
    config.params()?;
    let station_zones = weather_zones();
    for entry in &config.stations {
        if !station_zones.contains(&entry.zone) {
            return Err(EngineError::InvalidConfig(format!(
                "station {} cannot be assigned to zone '{}'",
                entry.station_id, entry.zone
            )));
        }
    }
    if let (Some(start), Some(end)) = (config.inputs.start_date, config.inputs.end_date) {
        if start > end {
            return Err(EngineError::InvalidConfig(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Engine parameters
// ---------------------------------------------------------------------------

/// Caller-supplied thresholds for one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub std_dev_thresholds: Vec<f64>,
    pub min_temp_f: f64,
    pub min_days: usize,
    pub extreme_heat_percentiles: Vec<f64>,
    pub median_percentile: f64,
    pub rain_threshold_mm: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            std_dev_thresholds: vec![DEFAULT_K],
            min_temp_f: DEFAULT_MIN_TEMP_F,
            min_days: DEFAULT_MIN_DAYS,
            extreme_heat_percentiles: vec![DEFAULT_EXTREME_HEAT_PERCENTILE],
            median_percentile: DEFAULT_MEDIAN_PERCENTILE,
            rain_threshold_mm: 0.0,
        }
    }
}

impl AnalysisParams {
    /// Rejects out-of-range thresholds. Nothing is computed with invalid
    /// parameters.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_days < 1 {
            return Err(EngineError::InvalidConfig(format!(
                "min_days must be at least 1, got {}",
                self.min_days
            )));
        }
        for &k in &self.std_dev_thresholds {
            if !k.is_finite() || k < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "std_dev threshold must be a non-negative number, got {}",
                    k
                )));
            }
        }
        for &p in self.extreme_heat_percentiles.iter().chain([&self.median_percentile]) {
            if !(0.0..=1.0).contains(&p) {
                return Err(EngineError::InvalidConfig(format!(
                    "percentile must be within [0, 1], got {}",
                    p
                )));
            }
        }
        if !self.min_temp_f.is_finite() {
            return Err(EngineError::InvalidConfig("min_temp_f must be finite".to_string()));
        }
        if !self.rain_threshold_mm.is_finite() || self.rain_threshold_mm < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "rain_threshold_mm must be a non-negative number, got {}",
                self.rain_threshold_mm
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
