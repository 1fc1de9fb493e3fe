/// Rainy versus dry day load, per zone.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::bucket::GroupKey;
use crate::analysis::correlate::{JoinKind, join_daily, summarize_by};
use crate::model::Zone;

use super::daily::DailyWeather;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationRow {
    pub zone_code: Zone,
    pub rainy_day: bool,
    pub avg_load_mw: Option<f64>,
    pub num_days: usize,
}

/// Average daily load on rainy and dry days for each zone.
///
/// A day is rainy when its precipitation exceeds `rain_threshold_mm`; days
/// without a precipitation reading or without load are left out. Rows are
/// ordered by zone, rainy days first.
pub fn precipitation_impact(
    zone_weather: &BTreeMap<GroupKey, DailyWeather>,
    daily_mean_load: &BTreeMap<GroupKey, f64>,
    rain_threshold_mm: f64,
) -> Vec<PrecipitationRow> {
    let rainy: BTreeMap<GroupKey, bool> = zone_weather
        .iter()
        .filter_map(|(key, w)| w.precip_mm.map(|p| (*key, p > rain_threshold_mm)))
        .collect();

    let joined = join_daily(&rainy, daily_mean_load, JoinKind::Inner);
    let summary = summarize_by(&joined, |j| (j.zone, !j.left), |j| j.right);

    summary
        .into_iter()
        .map(|((zone, dry), s)| PrecipitationRow {
            zone_code: zone,
            rainy_day: !dry,
            avg_load_mw: s.mean,
            num_days: s.count,
        })
        .collect()
}
