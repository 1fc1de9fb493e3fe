/// Filtered access to computed result tables.
///
/// Every accessor borrows from `AnalyticsTables` and returns rows in the
/// table's stored order. Filters follow the same conventions throughout:
/// zone lists are comma-separated labels, `None` means "no filter", and a
/// table that was never computed is reported as `NotYetAvailable` rather
/// than as an empty result.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value, json};

use crate::analysis::accuracy::AccuracyMetrics;
use crate::analysis::bucket::month_start;
use crate::analysis::outliers::OutlierKind;
use crate::model::Zone;
use crate::reports::AnalyticsTables;
use crate::reports::forecast::LoadComparisonRow;
use crate::reports::heat::{ExtremeHeatRow, HeatwaveRow};
use crate::reports::outliers::{LoadOutlierRow, LoadOutlierWeatherRow};
use crate::reports::precipitation::PrecipitationRow;
use crate::zones::parse_zone_list;

/// Upper bound on `load_comparison` page size.
pub const MAX_COMPARISON_LIMIT: usize = 10_000;

/// Thresholds are compared with this tolerance.
const THRESHOLD_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// The named table was not computed in this run.
    NotYetAvailable(&'static str),
    InvalidFilter(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NotYetAvailable(table) => {
                write!(f, "{} not yet available for this run", table)
            }
            TableError::InvalidFilter(msg) => write!(f, "Invalid filter: {}", msg),
        }
    }
}

impl std::error::Error for TableError {}

// ---------------------------------------------------------------------------
// Metric selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Mse,
    Mae,
    MapePct,
    R2,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Mse, Metric::Mae, Metric::MapePct, Metric::R2];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::MapePct => "mape_pct",
            Metric::R2 => "r2",
        }
    }

    pub fn from_name(name: &str) -> Result<Metric, TableError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mse" => Ok(Metric::Mse),
            "mae" => Ok(Metric::Mae),
            "mape" | "mape_pct" => Ok(Metric::MapePct),
            "r2" => Ok(Metric::R2),
            other => Err(TableError::InvalidFilter(format!("unknown metric '{}'", other))),
        }
    }

    fn value(self, row: &AccuracyMetrics) -> Option<f64> {
        match self {
            Metric::Mse => row.mse,
            Metric::Mae => row.mae,
            Metric::MapePct => row.mape_pct,
            Metric::R2 => row.r2,
        }
    }
}

/// Projects metric rows onto `region`, `n` and the named metrics
/// (comma-separated; all metrics when `None`).
pub fn select_metrics(rows: &[&AccuracyMetrics], metrics: Option<&str>) -> Result<Vec<Value>, TableError> {
    let selected: Vec<Metric> = match metrics {
        Some(list) => list
            .split(',')
            .filter(|m| !m.trim().is_empty())
            .map(Metric::from_name)
            .collect::<Result<_, _>>()?,
        None => Metric::ALL.to_vec(),
    };

    Ok(rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            obj.insert("region".to_string(), json!(row.group));
            obj.insert("n".to_string(), json!(row.n));
            for metric in &selected {
                obj.insert(metric.name().to_string(), json!(metric.value(row)));
            }
            Value::Object(obj)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Filter helpers
// ---------------------------------------------------------------------------

fn available<'a, T>(table: &'a Option<Vec<T>>, name: &'static str) -> Result<&'a [T], TableError> {
    table.as_deref().ok_or(TableError::NotYetAvailable(name))
}

fn zone_filter(zones: Option<&str>) -> Result<Option<Vec<Zone>>, TableError> {
    zones
        .map(|list| parse_zone_list(list).map_err(|e| TableError::InvalidFilter(e.to_string())))
        .transpose()
}

fn zone_matches(filter: &Option<Vec<Zone>>, zone: Zone) -> bool {
    filter.as_ref().is_none_or(|zones| zones.contains(&zone))
}

fn outlier_filter(outlier_type: Option<&str>) -> Result<Option<OutlierKind>, TableError> {
    outlier_type
        .map(|label| {
            OutlierKind::from_label(label).ok_or_else(|| {
                TableError::InvalidFilter(format!("outlier type must be 'high' or 'low', got '{}'", label))
            })
        })
        .transpose()
}

/// Parses comma-separated `YYYY-MM` months into first-of-month dates.
fn month_filter(months: Option<&str>) -> Result<Option<Vec<NaiveDate>>, TableError> {
    let Some(list) = months else {
        return Ok(None);
    };
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                .map_err(|_| TableError::InvalidFilter(format!("month must be YYYY-MM, got '{}'", m)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn same_threshold(a: f64, b: f64) -> bool {
    (a - b).abs() < THRESHOLD_EPSILON
}

// ---------------------------------------------------------------------------
// Table accessors
// ---------------------------------------------------------------------------

impl AnalyticsTables {
    pub fn forecast_metrics(&self, regions: Option<&str>) -> Result<Vec<&AccuracyMetrics>, TableError> {
        let rows = available(&self.forecast_metrics, "forecast_metrics")?;
        let regions = zone_filter(regions)?;
        Ok(rows.iter().filter(|r| zone_matches(&regions, r.group)).collect())
    }

    pub fn load_outliers(
        &self,
        regions: Option<&str>,
        outlier_type: Option<&str>,
        std_dev_threshold: Option<f64>,
    ) -> Result<Vec<&LoadOutlierRow>, TableError> {
        let rows = available(&self.load_outliers, "load_outliers")?;
        let regions = zone_filter(regions)?;
        let kind = outlier_filter(outlier_type)?;
        Ok(rows
            .iter()
            .filter(|r| zone_matches(&regions, r.region))
            .filter(|r| kind.is_none_or(|k| r.outlier_type == k))
            .filter(|r| std_dev_threshold.is_none_or(|t| same_threshold(r.std_dev_threshold, t)))
            .collect())
    }

    /// `start` and `end` bound `month_start`, both inclusive.
    pub fn load_outlier_weather(
        &self,
        std_dev_threshold: f64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        months: Option<&str>,
        outlier_type: Option<&str>,
    ) -> Result<Vec<&LoadOutlierWeatherRow>, TableError> {
        let rows = available(&self.load_outlier_weather, "load_outlier_weather")?;
        let months = month_filter(months)?;
        let kind = outlier_filter(outlier_type)?;
        Ok(rows
            .iter()
            .filter(|r| same_threshold(r.std_dev_threshold, std_dev_threshold))
            .filter(|r| start.is_none_or(|s| r.month_start >= s))
            .filter(|r| end.is_none_or(|e| r.month_start <= e))
            .filter(|r| {
                months
                    .as_ref()
                    .is_none_or(|ms| ms.contains(&month_start(r.month_start)))
            })
            .filter(|r| kind.is_none_or(|k| r.outlier_group == k))
            .collect())
    }

    /// Streaks reaching `min_temp_f` and lasting at least `min_days`,
    /// starting on or after `start` and ending on or before `end`.
    pub fn heatwaves(
        &self,
        zones: Option<&str>,
        min_temp_f: f64,
        min_days: usize,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<&HeatwaveRow>, TableError> {
        let rows = available(&self.heatwave_streaks, "heatwave_streaks")?;
        if min_days < 1 {
            return Err(TableError::InvalidFilter("min_days must be at least 1".to_string()));
        }
        let zones = zone_filter(zones)?;
        Ok(rows
            .iter()
            .filter(|r| zone_matches(&zones, r.zone_code))
            .filter(|r| r.max_temp_f.is_some_and(|t| t >= min_temp_f))
            .filter(|r| r.streak_days >= min_days)
            .filter(|r| start.is_none_or(|s| r.streak_start >= s))
            .filter(|r| end.is_none_or(|e| r.streak_end <= e))
            .collect())
    }

    /// Rows are whole-period aggregates with no date column, so there is no
    /// date filter here. The analysis window is fixed when inputs are read
    /// (`inputs.start_date` / `inputs.end_date`).
    pub fn precipitation_impact(&self, zones: Option<&str>) -> Result<Vec<&PrecipitationRow>, TableError> {
        let rows = available(&self.precipitation_impact, "precipitation_impact")?;
        let zones = zone_filter(zones)?;
        Ok(rows.iter().filter(|r| zone_matches(&zones, r.zone_code)).collect())
    }

    /// `threshold_percentile` is on the 0-100 scale. Like
    /// `precipitation_impact`, rows cover the whole input window and take no
    /// date filter.
    pub fn extreme_heat(
        &self,
        threshold_percentile: f64,
        zone: Option<Zone>,
    ) -> Result<Vec<&ExtremeHeatRow>, TableError> {
        let rows = available(&self.extreme_heat_load, "extreme_heat_load")?;
        if !(0.0..=100.0).contains(&threshold_percentile) {
            return Err(TableError::InvalidFilter(format!(
                "threshold must be within [0, 100], got {}",
                threshold_percentile
            )));
        }
        Ok(rows
            .iter()
            .filter(|r| same_threshold(r.threshold_percentile, threshold_percentile))
            .filter(|r| zone.is_none_or(|z| r.zone_code == z))
            .collect())
    }

    /// Paired hourly rows within `[start, end]`, at most `limit` of them.
    pub fn load_comparison(
        &self,
        regions: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<&LoadComparisonRow>, TableError> {
        let rows = available(&self.load_comparison, "load_comparison")?;
        if !(1..=MAX_COMPARISON_LIMIT).contains(&limit) {
            return Err(TableError::InvalidFilter(format!(
                "limit must be within 1..={}, got {}",
                MAX_COMPARISON_LIMIT, limit
            )));
        }
        let regions = zone_filter(regions)?;
        Ok(rows
            .iter()
            .filter(|r| zone_matches(&regions, r.region))
            .filter(|r| start.is_none_or(|s| r.hour_end >= s))
            .filter(|r| end.is_none_or(|e| r.hour_end <= e))
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metrics(zone: Zone, n: usize) -> AccuracyMetrics {
        AccuracyMetrics {
            group: zone,
            n,
            mse: Some(4.0),
            mae: Some(2.0),
            mape_pct: Some(1.5),
            r2: None,
        }
    }

    fn empty_tables() -> AnalyticsTables {
        AnalyticsTables {
            generated_at: "2024-01-01T00:00:00+00:00".to_string(),
            forecast_metrics: None,
            load_comparison: None,
            load_outliers: None,
            load_outlier_weather: None,
            heatwave_streaks: None,
            extreme_heat_load: None,
            precipitation_impact: None,
        }
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    fn heatwave(zone: Zone, start: NaiveDate, days: usize, max_temp_f: f64) -> HeatwaveRow {
        HeatwaveRow {
            zone_code: zone,
            streak_start: start,
            streak_end: start + chrono::Days::new(days as u64 - 1),
            streak_days: days,
            max_temp_f: Some(max_temp_f),
            avg_peak_load_mw: Some(20_000.0),
        }
    }

    #[test]
    fn test_missing_table_is_not_yet_available() {
        let tables = empty_tables();
        assert_eq!(
            tables.forecast_metrics(None).unwrap_err(),
            TableError::NotYetAvailable("forecast_metrics")
        );
        assert_eq!(
            tables.heatwaves(None, 100.0, 3, None, None).unwrap_err(),
            TableError::NotYetAvailable("heatwave_streaks")
        );
        assert!(tables.precipitation_impact(None).is_err());
    }

    #[test]
    fn test_forecast_metrics_region_filter() {
        let mut tables = empty_tables();
        tables.forecast_metrics = Some(vec![
            metrics(Zone::Coast, 10),
            metrics(Zone::West, 11),
            metrics(Zone::Ercot, 12),
        ]);

        let rows = tables.forecast_metrics(Some("coast, ERCOT")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, Zone::Coast);
        assert_eq!(rows[1].group, Zone::Ercot);

        assert!(matches!(
            tables.forecast_metrics(Some("panhandle")),
            Err(TableError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_select_metrics_projects_named_fields() {
        let row = metrics(Zone::NorthCentral, 24);
        let projected = select_metrics(&[&row], Some("mae,r2")).unwrap();
        let obj = projected[0].as_object().unwrap();
        assert_eq!(obj["region"], json!("north_c"));
        assert_eq!(obj["n"], json!(24));
        assert_eq!(obj["mae"], json!(2.0));
        assert!(obj["r2"].is_null());
        assert!(!obj.contains_key("mse"));

        let all = select_metrics(&[&row], None).unwrap();
        assert_eq!(all[0].as_object().unwrap().len(), 6);

        assert!(matches!(
            select_metrics(&[&row], Some("rmse")),
            Err(TableError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_heatwave_filters() {
        let mut tables = empty_tables();
        tables.heatwave_streaks = Some(vec![
            heatwave(Zone::Coast, day(6, 1), 3, 101.0),
            heatwave(Zone::Coast, day(7, 10), 5, 106.0),
            heatwave(Zone::West, day(8, 1), 4, 104.0),
        ]);

        assert_eq!(tables.heatwaves(None, 100.0, 3, None, None).unwrap().len(), 3);
        assert_eq!(tables.heatwaves(None, 105.0, 3, None, None).unwrap().len(), 1);
        assert_eq!(tables.heatwaves(None, 100.0, 4, None, None).unwrap().len(), 2);
        assert_eq!(tables.heatwaves(Some("west"), 100.0, 3, None, None).unwrap().len(), 1);

        let summer = tables
            .heatwaves(None, 100.0, 3, Some(day(6, 2)), Some(day(7, 31)))
            .unwrap();
        assert_eq!(summer.len(), 1);
        assert_eq!(summer[0].streak_start, day(7, 10));

        assert!(tables.heatwaves(None, 100.0, 0, None, None).is_err());
    }

    #[test]
    fn test_outlier_weather_month_and_type_filters() {
        let row = |month: u32, kind: OutlierKind, k: f64| LoadOutlierWeatherRow {
            month_start: day(month, 1),
            outlier_group: kind,
            num_days: 2,
            avg_temp_c: Some(30.0),
            avg_rh_pct: None,
            avg_precip_mm: None,
            avg_wind_kmh: None,
            avg_pressure_hpa: None,
            avg_cloud_cover_pct: None,
            std_dev_threshold: k,
        };
        let mut tables = empty_tables();
        tables.load_outlier_weather = Some(vec![
            row(6, OutlierKind::High, 3.0),
            row(7, OutlierKind::High, 3.0),
            row(7, OutlierKind::Low, 3.0),
            row(7, OutlierKind::High, 2.0),
        ]);

        assert_eq!(tables.load_outlier_weather(3.0, None, None, None, None).unwrap().len(), 3);
        assert_eq!(
            tables.load_outlier_weather(3.0, None, None, Some("2023-07"), None).unwrap().len(),
            2
        );
        assert_eq!(
            tables
                .load_outlier_weather(3.0, None, None, Some("2023-06,2023-07"), Some("high"))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            tables.load_outlier_weather(3.0, Some(day(7, 1)), None, None, None).unwrap().len(),
            2
        );
        assert_eq!(tables.load_outlier_weather(2.0, None, None, None, None).unwrap().len(), 1);

        assert!(tables.load_outlier_weather(3.0, None, None, Some("July"), None).is_err());
        assert!(tables.load_outlier_weather(3.0, None, None, None, Some("extreme")).is_err());
    }

    #[test]
    fn test_extreme_heat_threshold_and_zone() {
        let row = |zone: Zone, pct: f64| ExtremeHeatRow {
            zone_code: zone,
            median_peak_load_mw: Some(1_000.0),
            num_extreme_heat_days: 4,
            threshold_percentile: pct,
            threshold_temp_f: 104.0,
        };
        let mut tables = empty_tables();
        tables.extreme_heat_load = Some(vec![
            row(Zone::Coast, 99.0),
            row(Zone::West, 99.0),
            row(Zone::Coast, 95.0),
        ]);

        assert_eq!(tables.extreme_heat(99.0, None).unwrap().len(), 2);
        assert_eq!(tables.extreme_heat(95.0, Some(Zone::Coast)).unwrap().len(), 1);
        assert!(tables.extreme_heat(90.0, None).unwrap().is_empty());
        assert!(tables.extreme_heat(120.0, None).is_err());
    }

    #[test]
    fn test_load_comparison_range_and_limit() {
        let row = |hour: u32, zone: Zone| LoadComparisonRow {
            hour_end: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap().fixed_offset(),
            region: zone,
            actual_mw: 100.0,
            expected_mw: 95.0,
        };
        let mut tables = empty_tables();
        tables.load_comparison = Some(vec![
            row(1, Zone::Coast),
            row(1, Zone::Ercot),
            row(2, Zone::Coast),
            row(3, Zone::Coast),
        ]);

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(tables.load_comparison(None, Some(start), None, 100).unwrap().len(), 2);
        assert_eq!(tables.load_comparison(Some("coast"), None, None, 2).unwrap().len(), 2);
        assert_eq!(tables.load_comparison(None, None, None, 1000).unwrap().len(), 4);
        assert!(tables.load_comparison(None, None, None, 0).is_err());
    }

    #[test]
    fn test_load_outlier_filters() {
        let row = |zone: Zone, kind: OutlierKind, k: f64| LoadOutlierRow {
            hour_end: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().fixed_offset(),
            region: zone,
            load_mw: 10.0,
            mean: 5.0,
            std_dev: 1.0,
            z_score: 5.0,
            outlier_type: kind,
            std_dev_threshold: k,
        };
        let mut tables = empty_tables();
        tables.load_outliers = Some(vec![
            row(Zone::East, OutlierKind::High, 3.0),
            row(Zone::East, OutlierKind::Low, 3.0),
            row(Zone::FarWest, OutlierKind::High, 2.5),
        ]);

        assert_eq!(tables.load_outliers(None, None, None).unwrap().len(), 3);
        assert_eq!(tables.load_outliers(Some("east"), Some("low"), None).unwrap().len(), 1);
        assert_eq!(tables.load_outliers(None, None, Some(2.5)).unwrap().len(), 1);
    }
}
