//! Per-group reducers: mean, sample standard deviation, percentiles.
//!
//! `GroupStatistics` keeps the sorted non-null values of its group so any
//! percentile can be asked for after the fact without another pass over the
//! input.

use std::collections::BTreeMap;

/// Summary of one group's non-null values.
///
/// `count` is the number of non-null values. `mean` is `None` for an
/// all-null group; `sample_stddev` is `None` unless `count >= 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub sample_stddev: Option<f64>,
    sorted: Vec<f64>,
}

impl GroupStatistics {
    /// Builds statistics from a group's values. `None` and non-finite values
    /// are treated as missing.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut sorted: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        // Constant group: exact mean, zero spread.
        let constant = sorted.first().is_some_and(|first| sorted.last() == Some(first));
        let mean = if count == 0 {
            None
        } else if constant {
            Some(sorted[0])
        } else {
            Some(sorted.iter().sum::<f64>() / count as f64)
        };
        let sample_stddev = match mean {
            Some(_) if count >= 2 && constant => Some(0.0),
            Some(m) if count >= 2 => {
                let ss: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
                Some((ss / (count - 1) as f64).sqrt())
            }
            _ => None,
        };

        GroupStatistics {
            count,
            mean,
            sample_stddev,
            sorted,
        }
    }

    /// Interpolated percentile, `p` in `[0, 1]`. See [`percentile`].
    pub fn percentile(&self, p: f64) -> Option<f64> {
        percentile(&self.sorted, p)
    }

    pub fn max(&self) -> Option<f64> {
        self.sorted.last().copied()
    }

    /// Sum of the non-null values; `None` for an all-null group.
    pub fn sum(&self) -> Option<f64> {
        if self.sorted.is_empty() {
            None
        } else {
            Some(self.sorted.iter().sum())
        }
    }
}

/// Percentile by linear interpolation between order statistics.
///
/// The rank is `p * (n - 1)`; a fractional rank interpolates between its two
/// neighbours (continuous percentile, not nearest-rank). Returns `None` for
/// an empty slice or `p` outside `[0, 1]`. `sorted` must be ascending.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Mean of the non-null values, `None` if there are none.
pub fn mean_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, n) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Groups `items` by `key` and reduces each group's `value`s.
///
/// Produces exactly one entry per distinct key present in the input, even
/// when every value of that group is null. Inputs are only borrowed.
pub fn aggregate<T, K, FK, FV>(
    items: impl IntoIterator<Item = T>,
    key: FK,
    value: FV,
) -> BTreeMap<K, GroupStatistics>
where
    K: Ord,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> Option<f64>,
{
    let mut groups: BTreeMap<K, Vec<Option<f64>>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(value(&item));
    }
    groups
        .into_iter()
        .map(|(k, values)| (k, GroupStatistics::from_values(values)))
        .collect()
}
