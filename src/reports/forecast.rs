/// Forecast accuracy tables: per-region metrics and the hourly
/// actual-vs-expected comparison they are computed from.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::analysis::accuracy::{AccuracyMetrics, evaluate, pair_series};
use crate::analysis::reshape::reshape;
use crate::model::{LoadRow, Observation, Zone};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadComparisonRow {
    pub hour_end: DateTime<FixedOffset>,
    pub region: Zone,
    pub actual_mw: f64,
    pub expected_mw: f64,
}

/// Accuracy of the forecast against actual load, one row per region.
pub fn forecast_metrics(actual: &[LoadRow], forecast: &[LoadRow]) -> Vec<AccuracyMetrics> {
    let actual: Vec<Observation> = reshape(actual).collect();
    let expected: Vec<Observation> = reshape(forecast).collect();
    evaluate(&actual, &expected)
}

/// Hourly paired actual and forecast load, ordered by hour then region.
pub fn load_comparison(actual: &[LoadRow], forecast: &[LoadRow]) -> Vec<LoadComparisonRow> {
    let actual: Vec<Observation> = reshape(actual).collect();
    let expected: Vec<Observation> = reshape(forecast).collect();
    let mut rows: Vec<LoadComparisonRow> = pair_series(&actual, &expected)
        .into_iter()
        .map(|p| LoadComparisonRow {
            hour_end: p.timestamp,
            region: p.zone,
            actual_mw: p.actual,
            expected_mw: p.expected,
        })
        .collect();
    rows.sort_by(|a, b| (a.hour_end, a.region).cmp(&(b.hour_end, b.region)));
    rows
}
