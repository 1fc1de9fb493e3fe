//! Calendar bucketing of timestamps.
//!
//! Timestamps keep whatever offset they were recorded with. Buckets are
//! always taken on the UTC calendar so that group boundaries do not depend
//! on the source's local time.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Observation, Zone};

/// Grouping key used throughout the engine: a zone and a bucket date.
pub type GroupKey = (Zone, NaiveDate);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    /// Represented by the first day of the month.
    Month,
}

/// Truncates `timestamp` to its UTC calendar day or month.
pub fn bucket<Tz: TimeZone>(timestamp: &DateTime<Tz>, granularity: Granularity) -> NaiveDate {
    let day = timestamp.with_timezone(&Utc).date_naive();
    match granularity {
        Granularity::Day => day,
        Granularity::Month => month_start(day),
    }
}

/// First day of `day`'s month.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.day0()))
}

/// The `(zone, bucket)` key of an observation.
pub fn group_key(obs: &Observation, granularity: Granularity) -> GroupKey {
    (obs.zone, bucket(&obs.timestamp, granularity))
}
