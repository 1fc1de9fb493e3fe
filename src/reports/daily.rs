/// Daily series shared by the derived tables.
///
/// Load is reduced per (zone, UTC day) from the long observation series.
/// Weather is reduced per (zone, UTC day) from station readings: hourly
/// measurements are averaged, while precipitation is first totalled per
/// station and day and then averaged across the zone's stations.

use std::collections::BTreeMap;

use crate::analysis::aggregate::{GroupStatistics, aggregate};
use crate::analysis::bucket::{Granularity, GroupKey, bucket, group_key};
use crate::analysis::reshape::ZoneReading;
use crate::model::{Observation, WeatherReading, Zone};

/// One zone-day of weather.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyWeather {
    pub max_temp_c: Option<f64>,
    pub avg_temp_c: Option<f64>,
    pub avg_rh_pct: Option<f64>,
    /// Daily total, averaged across stations.
    pub precip_mm: Option<f64>,
    pub avg_wind_kmh: Option<f64>,
    pub avg_pressure_hpa: Option<f64>,
    pub avg_cloud_cover_pct: Option<f64>,
}

/// Load statistics per (zone, day).
pub fn daily_load(observations: &[Observation]) -> BTreeMap<GroupKey, GroupStatistics> {
    aggregate(
        observations.iter(),
        |o| group_key(o, Granularity::Day),
        |o| o.value,
    )
}

/// Mean load per (zone, day); days with no value are dropped.
pub fn daily_means(stats: &BTreeMap<GroupKey, GroupStatistics>) -> BTreeMap<GroupKey, f64> {
    stats
        .iter()
        .filter_map(|(key, s)| s.mean.map(|m| (*key, m)))
        .collect()
}

/// Peak (maximum) load per (zone, day); days with no value are dropped.
pub fn daily_peaks(stats: &BTreeMap<GroupKey, GroupStatistics>) -> BTreeMap<GroupKey, f64> {
    stats
        .iter()
        .filter_map(|(key, s)| s.max().map(|m| (*key, m)))
        .collect()
}

fn day_key(r: &ZoneReading) -> GroupKey {
    (r.zone, bucket(&r.reading.timestamp, Granularity::Day))
}

/// Weather per (zone, day) from zone-attributed readings.
pub fn daily_weather(readings: &[ZoneReading]) -> BTreeMap<GroupKey, DailyWeather> {
    let temp = aggregate(readings.iter(), |r| day_key(r), |r| r.reading.temp_c);
    let rh = aggregate(readings.iter(), |r| day_key(r), |r| r.reading.rh_pct);
    let wind = aggregate(readings.iter(), |r| day_key(r), |r| r.reading.wind_kmh);
    let pressure = aggregate(readings.iter(), |r| day_key(r), |r| r.reading.pressure_hpa);
    let cloud = aggregate(readings.iter(), |r| day_key(r), |r| r.reading.cloud_cover_pct);

    let station_totals = aggregate(
        readings.iter(),
        |r| {
            let (zone, day) = day_key(r);
            (zone, day, r.reading.station_id.clone())
        },
        |r| r.reading.precip_mm,
    );
    let precip = aggregate(
        station_totals.iter(),
        |(key, _)| (key.0, key.1),
        |(_, totals)| totals.sum(),
    );

    let mean = |map: &BTreeMap<GroupKey, GroupStatistics>, key: &GroupKey| {
        map.get(key).and_then(|s| s.mean)
    };

    temp.iter()
        .map(|(key, t)| {
            let weather = DailyWeather {
                max_temp_c: t.max(),
                avg_temp_c: t.mean,
                avg_rh_pct: mean(&rh, key),
                precip_mm: mean(&precip, key),
                avg_wind_kmh: mean(&wind, key),
                avg_pressure_hpa: mean(&pressure, key),
                avg_cloud_cover_pct: mean(&cloud, key),
            };
            (*key, weather)
        })
        .collect()
}

/// Attributes every reading to the system-wide zone.
pub fn system_readings(readings: &[WeatherReading]) -> Vec<ZoneReading<'_>> {
    readings
        .iter()
        .map(|reading| ZoneReading {
            zone: Zone::Ercot,
            reading,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2023, 8, day, hour, 0, 0).unwrap().fixed_offset()
    }

    fn reading(station: &str, day: u32, hour: u32, temp_c: f64, precip_mm: f64) -> WeatherReading {
        WeatherReading {
            station_id: station.to_string(),
            timestamp: at(day, hour),
            temp_c: Some(temp_c),
            rh_pct: Some(50.0),
            precip_mm: Some(precip_mm),
            wind_kmh: None,
            pressure_hpa: Some(1010.0),
            cloud_cover_pct: None,
        }
    }

    fn obs(zone: Zone, day: u32, hour: u32, value: Option<f64>) -> Observation {
        Observation {
            timestamp: at(day, hour),
            zone,
            value,
        }
    }

    #[test]
    fn test_daily_load_means_and_peaks() {
        let observations = vec![
            obs(Zone::Coast, 1, 1, Some(100.0)),
            obs(Zone::Coast, 1, 2, Some(300.0)),
            obs(Zone::Coast, 2, 1, None),
            obs(Zone::West, 1, 1, Some(50.0)),
        ];
        let stats = daily_load(&observations);
        assert_eq!(stats.len(), 3);

        let d1 = NaiveDate::from_ymd_opt(2023, 8, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 8, 2).unwrap();
        let means = daily_means(&stats);
        let peaks = daily_peaks(&stats);
        assert_eq!(means.get(&(Zone::Coast, d1)), Some(&200.0));
        assert_eq!(peaks.get(&(Zone::Coast, d1)), Some(&300.0));
        assert_eq!(means.get(&(Zone::Coast, d2)), None);
        assert_eq!(peaks.get(&(Zone::West, d1)), Some(&50.0));
    }

    #[test]
    fn test_precip_is_station_total_averaged_across_stations() {
        let raw = vec![
            reading("KIAH", 1, 10, 30.0, 1.0),
            reading("KIAH", 1, 11, 34.0, 2.0),
            reading("KGLS", 1, 10, 32.0, 5.0),
        ];
        let readings: Vec<ZoneReading> = raw
            .iter()
            .map(|reading| ZoneReading { zone: Zone::Coast, reading })
            .collect();
        let daily = daily_weather(&readings);
        let day = daily
            .get(&(Zone::Coast, NaiveDate::from_ymd_opt(2023, 8, 1).unwrap()))
            .expect("coast day present");

        // KIAH totals 3.0, KGLS 5.0
        assert_eq!(day.precip_mm, Some(4.0));
        assert_eq!(day.max_temp_c, Some(34.0));
        assert_eq!(day.avg_temp_c, Some(32.0));
        assert_eq!(day.avg_rh_pct, Some(50.0));
        assert_eq!(day.avg_wind_kmh, None);
    }

    #[test]
    fn test_system_readings_use_ercot_zone() {
        let raw = vec![reading("KIAH", 1, 10, 30.0, 0.0), reading("KMAF", 1, 10, 36.0, 0.0)];
        let readings = system_readings(&raw);
        assert!(readings.iter().all(|r| r.zone == Zone::Ercot));

        let daily = daily_weather(&readings);
        assert_eq!(daily.len(), 1);
        let (_, w) = daily.iter().next().unwrap();
        assert_eq!(w.avg_temp_c, Some(33.0));
    }
}
