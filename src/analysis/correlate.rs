//! Alignment of independently aggregated daily series.
//!
//! Two per-(zone, day) maps are joined on their key, then the joined rows
//! are reduced by a categorical split to a mean and a count.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::aggregate::mean_of;
use super::bucket::GroupKey;
use crate::model::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keys missing on either side are dropped.
    Inner,
    /// Every left key is kept; `right` is `None` where there is no match.
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedDay<L, R> {
    pub zone: Zone,
    pub day: NaiveDate,
    pub left: L,
    pub right: Option<R>,
}

/// Joins two daily aggregates on `(zone, day)`, in key order.
pub fn join_daily<L, R>(
    left: &BTreeMap<GroupKey, L>,
    right: &BTreeMap<GroupKey, R>,
    kind: JoinKind,
) -> Vec<JoinedDay<L, R>>
where
    L: Clone,
    R: Clone,
{
    left.iter()
        .filter_map(|(&(zone, day), l)| {
            let r = right.get(&(zone, day)).cloned();
            if kind == JoinKind::Inner && r.is_none() {
                return None;
            }
            Some(JoinedDay {
                zone,
                day,
                left: l.clone(),
                right: r,
            })
        })
        .collect()
}

/// Mean and row count of one split group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSummary {
    /// Mean over the group's non-null values.
    pub mean: Option<f64>,
    /// Number of rows (days) in the group.
    pub count: usize,
}

/// Groups `rows` by `split` and reduces each group's `value` to a mean and
/// a row count.
pub fn summarize_by<T, S, FS, FV>(rows: &[T], split: FS, value: FV) -> BTreeMap<S, SplitSummary>
where
    S: Ord,
    FS: Fn(&T) -> S,
    FV: Fn(&T) -> Option<f64>,
{
    let mut groups: BTreeMap<S, Vec<Option<f64>>> = BTreeMap::new();
    for row in rows {
        groups.entry(split(row)).or_default().push(value(row));
    }
    groups
        .into_iter()
        .map(|(s, values)| {
            let count = values.len();
            (s, SplitSummary { mean: mean_of(values), count })
        })
        .collect()
}
