/// Load outlier tables.
///
/// `load_outliers` flags hourly load against its (zone, UTC month) group.
/// `load_outlier_weather` flags system-wide daily average load against its
/// month and describes the weather on the flagged days.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::analysis::aggregate::mean_of;
use crate::analysis::bucket::{Granularity, GroupKey, group_key, month_start};
use crate::analysis::correlate::{JoinKind, JoinedDay, join_daily};
use crate::analysis::outliers::{OutlierKind, flag_outliers};
use crate::analysis::reshape::reshape_zone;
use crate::model::{LoadRow, Observation, Zone};

use super::daily::{DailyWeather, daily_load, daily_means};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOutlierRow {
    pub hour_end: DateTime<FixedOffset>,
    pub region: Zone,
    pub load_mw: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub outlier_type: OutlierKind,
    pub std_dev_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOutlierWeatherRow {
    pub month_start: NaiveDate,
    pub outlier_group: OutlierKind,
    pub num_days: usize,
    pub avg_temp_c: Option<f64>,
    pub avg_rh_pct: Option<f64>,
    pub avg_precip_mm: Option<f64>,
    pub avg_wind_kmh: Option<f64>,
    pub avg_pressure_hpa: Option<f64>,
    pub avg_cloud_cover_pct: Option<f64>,
    pub std_dev_threshold: f64,
}

/// Hourly load outliers, grouped by zone and UTC month, ordered by region
/// then hour.
pub fn load_outliers(observations: &[Observation], k: f64) -> Vec<LoadOutlierRow> {
    let mut rows: Vec<LoadOutlierRow> = flag_outliers(
        observations,
        |o| group_key(o, Granularity::Month),
        |o| o.value,
        k,
    )
    .into_iter()
    .map(|o| LoadOutlierRow {
        hour_end: o.record.timestamp,
        region: o.record.zone,
        load_mw: o.value,
        mean: o.mean,
        std_dev: o.stddev,
        z_score: o.flag.z_score,
        outlier_type: o.flag.kind,
        std_dev_threshold: k,
    })
    .collect();
    rows.sort_by(|a, b| (a.region, a.hour_end).cmp(&(b.region, b.hour_end)));
    rows
}

/// Weather on days whose system-wide average load is an outlier for its
/// month, summarized per (month, outlier kind).
///
/// Flagged days without weather still count toward `num_days`; their
/// weather fields are left out of the averages.
pub fn load_outlier_weather(
    load: &[LoadRow],
    system_weather: &BTreeMap<GroupKey, DailyWeather>,
    k: f64,
) -> Vec<LoadOutlierWeatherRow> {
    let system: Vec<Observation> = reshape_zone(load, Zone::Ercot).collect();
    let days: Vec<(NaiveDate, f64)> = daily_means(&daily_load(&system))
        .into_iter()
        .map(|((_, day), mean)| (day, mean))
        .collect();

    let flagged: BTreeMap<GroupKey, OutlierKind> =
        flag_outliers(&days, |(day, _)| month_start(*day), |(_, mean)| Some(*mean), k)
            .into_iter()
            .map(|o| ((Zone::Ercot, o.record.0), o.flag.kind))
            .collect();

    let joined = join_daily(&flagged, system_weather, JoinKind::Left);

    let mut groups: BTreeMap<(NaiveDate, OutlierKind), Vec<&JoinedDay<OutlierKind, DailyWeather>>> =
        BTreeMap::new();
    for day in &joined {
        groups
            .entry((month_start(day.day), day.left))
            .or_default()
            .push(day);
    }

    groups
        .into_iter()
        .map(|((month, kind), days)| {
            let avg = |field: fn(&DailyWeather) -> Option<f64>| {
                mean_of(days.iter().map(|d| d.right.as_ref().and_then(field)))
            };
            LoadOutlierWeatherRow {
                month_start: month,
                outlier_group: kind,
                num_days: days.len(),
                avg_temp_c: avg(|w| w.avg_temp_c),
                avg_rh_pct: avg(|w| w.avg_rh_pct),
                avg_precip_mm: avg(|w| w.precip_mm),
                avg_wind_kmh: avg(|w| w.avg_wind_kmh),
                avg_pressure_hpa: avg(|w| w.avg_pressure_hpa),
                avg_cloud_cover_pct: avg(|w| w.avg_cloud_cover_pct),
                std_dev_threshold: k,
            }
        })
        .collect()
}
