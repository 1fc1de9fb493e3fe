/// Heat tables.
///
/// `heatwave_streaks`: runs of consecutive days whose maximum temperature
/// reaches a floor, with the zone's peak load over the run.
/// `extreme_heat_load`: median daily peak load on each zone's hottest days,
/// where "hottest" is a percentile of that zone's own temperature history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::aggregate::{GroupStatistics, aggregate, mean_of};
use crate::analysis::bucket::GroupKey;
use crate::analysis::correlate::{JoinKind, join_daily};
use crate::analysis::streaks::detect_streaks;
use crate::ingest::weather_csv::c_to_f;
use crate::model::{EngineError, Zone};

use super::daily::DailyWeather;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatwaveRow {
    pub zone_code: Zone,
    pub streak_start: NaiveDate,
    pub streak_end: NaiveDate,
    pub streak_days: usize,
    /// Hottest daily maximum within the streak.
    pub max_temp_f: Option<f64>,
    /// Mean of the daily peak loads within the streak; days without load
    /// are left out.
    pub avg_peak_load_mw: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeHeatRow {
    pub zone_code: Zone,
    pub median_peak_load_mw: Option<f64>,
    pub num_extreme_heat_days: usize,
    /// Percentile used for the cutoff, on a 0-100 scale.
    pub threshold_percentile: f64,
    pub threshold_temp_f: f64,
}

fn daily_max_f(weather: &DailyWeather) -> Option<f64> {
    weather.max_temp_c.map(c_to_f)
}

/// Heatwave streaks per zone, ordered by zone then start day.
pub fn heatwave_streaks(
    zone_weather: &BTreeMap<GroupKey, DailyWeather>,
    peaks: &BTreeMap<GroupKey, f64>,
    min_temp_f: f64,
    min_days: usize,
) -> Result<Vec<HeatwaveRow>, EngineError> {
    let streaks = detect_streaks(
        zone_weather
            .iter()
            .map(|(&(zone, day), w)| (zone, day, daily_max_f(w))),
        |temp_f| temp_f >= min_temp_f,
        min_days,
    )?;

    let rows = streaks
        .into_iter()
        .map(|streak| {
            let days: Vec<NaiveDate> = streak.start_day.iter_days().take(streak.length).collect();
            let max_temp_f = zone_weather
                .range((streak.zone, streak.start_day)..=(streak.zone, streak.end_day))
                .filter_map(|(_, w)| daily_max_f(w))
                .reduce(f64::max);
            let avg_peak_load_mw =
                mean_of(days.iter().map(|d| peaks.get(&(streak.zone, *d)).copied()));
            HeatwaveRow {
                zone_code: streak.zone,
                streak_start: streak.start_day,
                streak_end: streak.end_day,
                streak_days: streak.length,
                max_temp_f,
                avg_peak_load_mw,
            }
        })
        .collect();
    Ok(rows)
}

/// Median (or other `median_percentile`) daily peak load on days at or
/// above each zone's `percentile` of daily maximum temperature.
///
/// `percentile` and `median_percentile` are fractions in `[0, 1]`. Zones
/// with no temperature data produce no row.
pub fn extreme_heat_load(
    zone_weather: &BTreeMap<GroupKey, DailyWeather>,
    peaks: &BTreeMap<GroupKey, f64>,
    percentile: f64,
    median_percentile: f64,
) -> Vec<ExtremeHeatRow> {
    let per_zone: BTreeMap<Zone, GroupStatistics> = aggregate(
        zone_weather.iter(),
        |(key, _)| key.0,
        |(_, w)| daily_max_f(w),
    );

    let mut rows = Vec::new();
    for (zone, temps) in per_zone {
        let Some(cutoff) = temps.percentile(percentile) else {
            continue;
        };

        let hot_days: BTreeMap<GroupKey, f64> = zone_weather
            .range((zone, NaiveDate::MIN)..=(zone, NaiveDate::MAX))
            .filter_map(|(key, w)| daily_max_f(w).map(|t| (*key, t)))
            .filter(|(_, temp_f)| *temp_f >= cutoff)
            .collect();

        let joined = join_daily(&hot_days, peaks, JoinKind::Inner);
        let peak_loads = GroupStatistics::from_values(joined.iter().map(|j| j.right));

        rows.push(ExtremeHeatRow {
            zone_code: zone,
            median_peak_load_mw: peak_loads.percentile(median_percentile),
            num_extreme_heat_days: joined.len(),
            threshold_percentile: percentile * 100.0,
            threshold_temp_f: cutoff,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, d).unwrap()
    }

    fn f_to_c(f: f64) -> f64 {
        (f - 32.0) * 5.0 / 9.0
    }

    fn hot(max_f: f64) -> DailyWeather {
        DailyWeather {
            max_temp_c: Some(f_to_c(max_f)),
            ..DailyWeather::default()
        }
    }

    #[test]
    fn test_heatwave_streaks_with_peak_load() {
        // 6/1-6/3 hot, 6/4 cool, 6/5-6/8 hot
        let temps = [101.0, 104.0, 100.5, 95.0, 102.0, 103.0, 101.0, 108.0];
        let mut weather = BTreeMap::new();
        let mut peaks = BTreeMap::new();
        for (i, t) in temps.iter().enumerate() {
            let d = day(i as u32 + 1);
            weather.insert((Zone::NorthCentral, d), hot(*t));
            if d != day(6) {
                peaks.insert((Zone::NorthCentral, d), 20_000.0 + 1_000.0 * i as f64);
            }
        }

        let rows = heatwave_streaks(&weather, &peaks, 100.0, 3).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].streak_start, day(1));
        assert_eq!(rows[0].streak_end, day(3));
        assert_eq!(rows[0].streak_days, 3);
        assert!((rows[0].max_temp_f.unwrap() - 104.0).abs() < 1e-9);
        assert_eq!(rows[0].avg_peak_load_mw, Some(21_000.0));

        assert_eq!(rows[1].streak_start, day(5));
        assert_eq!(rows[1].streak_end, day(8));
        assert_eq!(rows[1].streak_days, 4);
        assert!((rows[1].max_temp_f.unwrap() - 108.0).abs() < 1e-9);
        // 6/6 has no load: mean of 24k, 26k, 27k
        assert_eq!(rows[1].avg_peak_load_mw, Some(77_000.0 / 3.0));
    }

    #[test]
    fn test_heatwave_min_days_filters_short_runs() {
        let mut weather = BTreeMap::new();
        weather.insert((Zone::West, day(1)), hot(101.0));
        weather.insert((Zone::West, day(2)), hot(101.0));
        let rows = heatwave_streaks(&weather, &BTreeMap::new(), 100.0, 3).unwrap();
        assert!(rows.is_empty());

        let rows = heatwave_streaks(&weather, &BTreeMap::new(), 100.0, 2).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].avg_peak_load_mw, None);

        assert!(heatwave_streaks(&weather, &BTreeMap::new(), 100.0, 0).is_err());
    }

    #[test]
    fn test_extreme_heat_median_over_hot_days() {
        let mut weather = BTreeMap::new();
        let mut peaks = BTreeMap::new();
        // temps 90..=99 F, peaks rise with temperature
        for i in 0..10u32 {
            let d = day(i + 1);
            weather.insert((Zone::Coast, d), hot(90.0 + i as f64));
            peaks.insert((Zone::Coast, d), 1_000.0 + 100.0 * i as f64);
        }
        // hottest day has no load reading
        peaks.remove(&(Zone::Coast, day(10)));

        let rows = extreme_heat_load(&weather, &peaks, 0.7, 0.5);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.zone_code, Zone::Coast);
        assert!((row.threshold_percentile - 70.0).abs() < 1e-9);
        // rank 0.7 * 9 = 6.3 -> 96.3 F; days at 97, 98, 99 F qualify
        assert!((row.threshold_temp_f - 96.3).abs() < 1e-6);
        assert_eq!(row.num_extreme_heat_days, 2);
        // peaks 1700 and 1800
        assert_eq!(row.median_peak_load_mw, Some(1_750.0));
    }

    #[test]
    fn test_extreme_heat_zones_are_independent() {
        let mut weather = BTreeMap::new();
        weather.insert((Zone::Coast, day(1)), hot(90.0));
        weather.insert((Zone::FarWest, day(1)), hot(110.0));
        weather.insert((Zone::FarWest, day(2)), DailyWeather::default());

        let rows = extreme_heat_load(&weather, &BTreeMap::new(), 1.0, 0.5);
        assert_eq!(rows.len(), 2);
        assert!((rows[0].threshold_temp_f - 90.0).abs() < 1e-9);
        assert!((rows[1].threshold_temp_f - 110.0).abs() < 1e-9);
        assert_eq!(rows[1].num_extreme_heat_days, 0);
        assert_eq!(rows[1].median_peak_load_mw, None);
    }
}
