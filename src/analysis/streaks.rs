//! Consecutive-day streak ("island") detection.
//!
//! Each zone's qualifying days are scanned in ascending order carrying the
//! previous day and a running streak id. A day that is not exactly one
//! calendar day after the previous qualifying day opens a new streak, so
//! any gap breaks the run. Zones are independent; the scan inside one zone
//! is strictly ordered.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{EngineError, Zone};

/// Default minimum streak length, in days.
pub const DEFAULT_MIN_DAYS: usize = 3;

/// A maximal run of consecutive qualifying days in one zone.
///
/// `end_day - start_day + 1 == length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakRecord {
    pub zone: Zone,
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub length: usize,
}

/// Assigns a streak id to each day of an ascending, duplicate-free day list.
///
/// Ids start at 1 and increase by one every time a new streak opens.
pub fn assign_streak_ids(days: &[NaiveDate]) -> Vec<usize> {
    let mut ids = Vec::with_capacity(days.len());
    let mut streak_id = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        let continues = previous.is_some_and(|p| day.signed_duration_since(p).num_days() == 1);
        if !continues {
            streak_id += 1;
        }
        ids.push(streak_id);
        previous = Some(day);
    }
    ids
}

/// Finds streaks of days whose value satisfies `qualifies`, keeping those of
/// at least `min_days` days.
///
/// `days` is a per-(zone, day) series in any order; null values never
/// qualify and repeated (zone, day) entries count once. Output is ordered
/// by zone, then start day.
///
/// Returns `EngineError::InvalidConfig` if `min_days` is zero.
pub fn detect_streaks<I, P>(
    days: I,
    qualifies: P,
    min_days: usize,
) -> Result<Vec<StreakRecord>, EngineError>
where
    I: IntoIterator<Item = (Zone, NaiveDate, Option<f64>)>,
    P: Fn(f64) -> bool,
{
    if min_days < 1 {
        return Err(EngineError::InvalidConfig(format!(
            "min_days must be at least 1, got {}",
            min_days
        )));
    }

    let mut qualifying: BTreeMap<Zone, BTreeSet<NaiveDate>> = BTreeMap::new();
    for (zone, day, value) in days {
        if value.is_some_and(&qualifies) {
            qualifying.entry(zone).or_default().insert(day);
        }
    }

    let mut streaks = Vec::new();
    for (zone, day_set) in qualifying {
        let ordered: Vec<NaiveDate> = day_set.into_iter().collect();
        let ids = assign_streak_ids(&ordered);

        // streak id -> (start, end, length)
        let mut runs: BTreeMap<usize, (NaiveDate, NaiveDate, usize)> = BTreeMap::new();
        for (day, id) in ordered.into_iter().zip(ids) {
            runs.entry(id)
                .and_modify(|run| {
                    run.0 = run.0.min(day);
                    run.1 = run.1.max(day);
                    run.2 += 1;
                })
                .or_insert((day, day, 1));
        }

        streaks.extend(
            runs.into_values()
                .filter(|&(_, _, length)| length >= min_days)
                .map(|(start_day, end_day, length)| StreakRecord {
                    zone,
                    start_day,
                    end_day,
                    length,
                }),
        );
    }
    Ok(streaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, day).unwrap()
    }

    fn hot_days(zone: Zone, days: &[u32]) -> Vec<(Zone, NaiveDate, Option<f64>)> {
        days.iter().map(|&d| (zone, june(d), Some(104.0))).collect()
    }

    #[test]
    fn test_gap_splits_into_two_streaks() {
        let days = hot_days(Zone::West, &[1, 2, 3, 5, 6, 7, 8]);
        let streaks = detect_streaks(days, |t| t >= 100.0, 3).unwrap();

        assert_eq!(
            streaks,
            vec![
                StreakRecord { zone: Zone::West, start_day: june(1), end_day: june(3), length: 3 },
                StreakRecord { zone: Zone::West, start_day: june(5), end_day: june(8), length: 4 },
            ]
        );
    }

    #[test]
    fn test_min_days_filters_short_streaks() {
        let days = hot_days(Zone::West, &[1, 2, 3, 5, 6, 7, 8]);
        assert!(detect_streaks(days, |t| t >= 100.0, 5).unwrap().is_empty());
    }

    #[test]
    fn test_single_day_is_a_streak_of_one() {
        let days = hot_days(Zone::Coast, &[10]);
        assert!(detect_streaks(days.clone(), |t| t >= 100.0, 3).unwrap().is_empty());

        let streaks = detect_streaks(days, |t| t >= 100.0, 1).unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].length, 1);
        assert_eq!(streaks[0].start_day, streaks[0].end_day);
    }

    #[test]
    fn test_predicate_boundary_is_inclusive() {
        let days = vec![
            (Zone::North, june(1), Some(100.0)),
            (Zone::North, june(2), Some(100.0)),
            (Zone::North, june(3), Some(100.0)),
        ];
        let streaks = detect_streaks(days, |t| t >= 100.0, 3).unwrap();
        assert_eq!(streaks.len(), 1);
    }

    #[test]
    fn test_non_qualifying_day_breaks_the_run() {
        let days = vec![
            (Zone::North, june(1), Some(101.0)),
            (Zone::North, june(2), Some(99.9)),
            (Zone::North, june(3), None),
            (Zone::North, june(4), Some(102.0)),
        ];
        let streaks = detect_streaks(days, |t| t >= 100.0, 1).unwrap();
        assert_eq!(streaks.len(), 2);
        assert!(streaks.iter().all(|s| s.length == 1));
    }

    #[test]
    fn test_zones_do_not_share_streaks() {
        // Coast has 6/1-6/2, East has 6/3; together they would look
        // consecutive, but each zone is scanned on its own.
        let mut days = hot_days(Zone::Coast, &[1, 2]);
        days.extend(hot_days(Zone::East, &[3]));
        let streaks = detect_streaks(days, |t| t >= 100.0, 3).unwrap();
        assert!(streaks.is_empty());
    }

    #[test]
    fn test_unordered_and_duplicate_days() {
        let days = hot_days(Zone::Southern, &[3, 1, 2, 2, 4]);
        let streaks = detect_streaks(days, |t| t >= 100.0, 3).unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].length, 4);
        assert_eq!(streaks[0].start_day, june(1));
        assert_eq!(streaks[0].end_day, june(4));
    }

    #[test]
    fn test_streak_invariants_hold() {
        let days = hot_days(Zone::FarWest, &[1, 2, 3, 4, 6, 7, 8, 10, 11, 12, 13, 14]);
        let streaks = detect_streaks(days, |t| t >= 100.0, 1).unwrap();
        for s in &streaks {
            let span = s.end_day.signed_duration_since(s.start_day).num_days() + 1;
            assert_eq!(span as usize, s.length);
        }
        for pair in streaks.windows(2) {
            let gap = pair[1].start_day.signed_duration_since(pair[0].end_day).num_days();
            assert!(gap > 1, "streaks must neither overlap nor touch");
        }
    }

    #[test]
    fn test_assign_streak_ids() {
        let ids = assign_streak_ids(&[june(1), june(2), june(4), june(5), june(9)]);
        assert_eq!(ids, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_zero_min_days_is_rejected() {
        let result = detect_streaks(hot_days(Zone::West, &[1]), |t| t >= 100.0, 0);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }
}
