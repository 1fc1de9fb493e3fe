//! Forecast accuracy metrics between paired actual and expected series.
//!
//! Points are paired by zone and by instant (offsets are normalized to UTC
//! before matching). A timestamp present on only one side, or null on
//! either side, is left out of the paired set; the reported `n` shows how
//! many pairs were actually used.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::model::{Observation, Zone};

/// Accuracy of one group's expected series against its actual series.
///
/// Every metric is `None` when `n == 0`. `mape_pct` is `None` when every
/// actual value is zero; `r2` is `None` when the actual series is constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    #[serde(rename = "region")]
    pub group: Zone,
    pub n: usize,
    pub mse: Option<f64>,
    pub mae: Option<f64>,
    pub mape_pct: Option<f64>,
    pub r2: Option<f64>,
}

/// One matched actual/expected pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub zone: Zone,
    pub actual: f64,
    pub expected: f64,
}

/// Inner-joins `actual` and `expected` on `(zone, instant)`.
///
/// If `expected` holds the same key twice, the first occurrence is used.
/// The result is ordered by zone, then time.
pub fn pair_series(actual: &[Observation], expected: &[Observation]) -> Vec<PairedPoint> {
    let mut lookup: HashMap<(Zone, DateTime<Utc>), f64> = HashMap::new();
    for obs in expected {
        if let Some(v) = obs.value {
            lookup
                .entry((obs.zone, obs.timestamp.with_timezone(&Utc)))
                .or_insert(v);
        }
    }

    let mut pairs: Vec<PairedPoint> = actual
        .iter()
        .filter_map(|obs| {
            let a = obs.value?;
            let e = *lookup.get(&(obs.zone, obs.timestamp.with_timezone(&Utc)))?;
            Some(PairedPoint {
                timestamp: obs.timestamp,
                zone: obs.zone,
                actual: a,
                expected: e,
            })
        })
        .collect();
    pairs.sort_by_key(|p| (p.zone, p.timestamp.with_timezone(&Utc)));
    pairs
}

/// Computes the metrics for one group from its `(actual, expected)` pairs.
pub fn compute_metrics(group: Zone, pairs: &[(f64, f64)]) -> AccuracyMetrics {
    let n = pairs.len();
    if n == 0 {
        return AccuracyMetrics {
            group,
            n,
            mse: None,
            mae: None,
            mape_pct: None,
            r2: None,
        };
    }
    let nf = n as f64;

    let ss_res: f64 = pairs.iter().map(|(a, e)| (a - e).powi(2)).sum();
    let abs_err: f64 = pairs.iter().map(|(a, e)| (a - e).abs()).sum();

    // Zero actuals are omitted from MAPE rather than counted as zero error.
    let (pct_sum, pct_n) = pairs
        .iter()
        .filter(|(a, _)| *a != 0.0)
        .fold((0.0, 0usize), |(sum, k), (a, e)| {
            (sum + (a - e).abs() / a.abs(), k + 1)
        });
    let mape_pct = if pct_n == 0 {
        None
    } else {
        Some(100.0 * pct_sum / pct_n as f64)
    };

    // Constant actuals leave r2 undefined even if SS_tot rounds above zero.
    let first_actual = pairs[0].0;
    let constant = pairs.iter().all(|(a, _)| *a == first_actual);
    let actual_mean = pairs.iter().map(|(a, _)| a).sum::<f64>() / nf;
    let ss_tot: f64 = pairs.iter().map(|(a, _)| (a - actual_mean).powi(2)).sum();
    let r2 = if constant || ss_tot == 0.0 {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    };

    AccuracyMetrics {
        group,
        n,
        mse: Some(ss_res / nf),
        mae: Some(abs_err / nf),
        mape_pct,
        r2,
    }
}

/// Pairs the two series and computes metrics per zone.
///
/// Every zone present in either series gets a row, even when none of its
/// points could be paired (`n == 0`).
pub fn evaluate(actual: &[Observation], expected: &[Observation]) -> Vec<AccuracyMetrics> {
    let zones: BTreeSet<Zone> = actual.iter().chain(expected).map(|o| o.zone).collect();

    let mut by_zone: BTreeMap<Zone, Vec<(f64, f64)>> = BTreeMap::new();
    for p in pair_series(actual, expected) {
        by_zone.entry(p.zone).or_default().push((p.actual, p.expected));
    }

    zones
        .into_iter()
        .map(|zone| {
            let pairs = by_zone.get(&zone).map(Vec::as_slice).unwrap_or(&[]);
            compute_metrics(zone, pairs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, hour, 0, 0)
            .unwrap()
    }

    fn series(zone: Zone, values: &[Option<f64>]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                timestamp: at(i as u32),
                zone,
                value,
            })
            .collect()
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_perfect_forecast() {
        let actual = series(Zone::Coast, &[Some(10.0), Some(20.0), Some(30.0)]);
        let metrics = evaluate(&actual, &actual.clone());

        assert_eq!(metrics.len(), 1);
        let m = &metrics[0];
        assert_eq!(m.n, 3);
        assert_eq!(m.mse, Some(0.0));
        assert_eq!(m.mae, Some(0.0));
        assert_eq!(m.mape_pct, Some(0.0));
        assert_eq!(m.r2, Some(1.0));
    }

    #[test]
    fn test_constant_actual_leaves_r2_undefined() {
        let actual = series(Zone::East, &[Some(5.0), Some(5.0), Some(5.0)]);
        let m = &evaluate(&actual, &actual.clone())[0];
        assert_eq!(m.mse, Some(0.0));
        assert_eq!(m.r2, None);
    }

    #[test]
    fn test_constant_inexact_actual_leaves_r2_undefined() {
        assert_eq!(compute_metrics(Zone::Coast, &[(0.1, 0.1); 3]).r2, None);
        let m = compute_metrics(Zone::Coast, &[(0.1, 0.2); 3]);
        assert_eq!(m.r2, None);
        assert!(close(m.mae, 0.1));
    }

    #[test]
    fn test_mape_omits_zero_actuals() {
        let m = compute_metrics(Zone::West, &[(0.0, 5.0), (10.0, 12.0), (20.0, 18.0)]);
        // (0.2 + 0.1) / 2 pairs, not / 3.
        assert!(close(m.mape_pct, 15.0));
        assert_eq!(m.n, 3);
        // MSE and MAE still use every pair.
        assert!(close(m.mse, (25.0 + 4.0 + 4.0) / 3.0));
        assert!(close(m.mae, 3.0));
    }

    #[test]
    fn test_all_zero_actuals_leave_mape_undefined() {
        let m = compute_metrics(Zone::West, &[(0.0, 1.0), (0.0, 2.0)]);
        assert_eq!(m.mape_pct, None);
        assert!(m.mse.is_some());
    }

    #[test]
    fn test_r2_matches_definition() {
        let pairs = [(1.0, 2.0), (2.0, 2.0), (3.0, 2.0)];
        // SS_res = 2, SS_tot = 2 -> r2 = 0.
        assert!(close(compute_metrics(Zone::North, &pairs).r2, 0.0));
    }

    #[test]
    fn test_unmatched_and_null_points_are_excluded() {
        let actual = series(Zone::Coast, &[Some(10.0), Some(20.0), None, Some(40.0)]);
        let mut expected = series(Zone::Coast, &[Some(11.0), None, Some(30.0)]);
        // Different zone at a matching instant does not pair.
        expected.push(Observation { timestamp: at(3), zone: Zone::East, value: Some(40.0) });

        let pairs = pair_series(&actual, &expected);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].actual, 10.0);
        assert_eq!(pairs[0].expected, 11.0);

        let metrics = evaluate(&actual, &expected);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].group, Zone::Coast);
        assert_eq!(metrics[0].n, 1);
        assert_eq!(metrics[1].group, Zone::East);
        assert_eq!(metrics[1].n, 0);
        assert_eq!(metrics[1].mse, None);
    }

    #[test]
    fn test_pairs_match_on_instant_not_offset() {
        let actual = vec![Observation { timestamp: at(12), zone: Zone::Coast, value: Some(100.0) }];
        let shifted = at(12).with_timezone(&FixedOffset::west_opt(6 * 3600).unwrap());
        let expected = vec![Observation { timestamp: shifted, zone: Zone::Coast, value: Some(90.0) }];

        assert_eq!(pair_series(&actual, &expected).len(), 1);
    }
}
