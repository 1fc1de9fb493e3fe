//! Z-score outlier classification.
//!
//! A stateless per-record decision against precomputed group statistics.
//! Bounds are strict: a value exactly at `mean ± k·stddev` is not flagged.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::{GroupStatistics, aggregate};

/// Default threshold multiplier, in standard deviations.
pub const DEFAULT_K: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierKind {
    High,
    Low,
}

impl OutlierKind {
    pub fn from_label(label: &str) -> Option<OutlierKind> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(OutlierKind::High),
            "low" => Some(OutlierKind::Low),
            _ => None,
        }
    }
}

impl fmt::Display for OutlierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierKind::High => write!(f, "high"),
            OutlierKind::Low => write!(f, "low"),
        }
    }
}

/// Classification of a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierFlag {
    pub kind: OutlierKind,
    pub z_score: f64,
}

/// `(value - mean) / stddev`, or `None` when the stddev is missing or zero.
pub fn z_score(value: f64, mean: Option<f64>, stddev: Option<f64>) -> Option<f64> {
    match (mean, stddev) {
        (Some(m), Some(sd)) if sd > 0.0 && sd.is_finite() => Some((value - m) / sd),
        _ => None,
    }
}

/// Classifies `value` against `mean ± k·stddev`.
///
/// Returns `None` for values inside the band and whenever the z-score is
/// undefined.
pub fn classify_against(
    value: f64,
    mean: Option<f64>,
    stddev: Option<f64>,
    k: f64,
) -> Option<OutlierFlag> {
    let z = z_score(value, mean, stddev)?;
    let (m, sd) = (mean?, stddev?);

    let kind = if value > m + k * sd {
        OutlierKind::High
    } else if value < m - k * sd {
        OutlierKind::Low
    } else {
        return None;
    };
    Some(OutlierFlag { kind, z_score: z })
}

pub fn classify(value: f64, stats: &GroupStatistics, k: f64) -> Option<OutlierFlag> {
    classify_against(value, stats.mean, stats.sample_stddev, k)
}

/// A record flagged as an outlier, with the statistics it was judged by.
#[derive(Debug, Clone, PartialEq)]
pub struct Outlier<'a, T> {
    pub record: &'a T,
    pub value: f64,
    pub mean: f64,
    pub stddev: f64,
    pub flag: OutlierFlag,
}

/// Groups `records` by `key`, then keeps the records whose value lies
/// outside their group's `mean ± k·stddev`.
///
/// Records with a null value never appear in the output. The result
/// preserves input order.
pub fn flag_outliers<'a, T, K, FK, FV>(
    records: &'a [T],
    key: FK,
    value: FV,
    k: f64,
) -> Vec<Outlier<'a, T>>
where
    K: Ord,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> Option<f64>,
{
    let stats = aggregate(records.iter(), |r| key(r), |r| value(r));

    records
        .iter()
        .filter_map(|record| {
            let v = value(record)?;
            let group = stats.get(&key(record))?;
            let flag = classify(v, group, k)?;
            Some(Outlier {
                record,
                value: v,
                mean: group.mean?,
                stddev: group.sample_stddev?,
                flag,
            })
        })
        .collect()
}
