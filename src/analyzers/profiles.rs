use crate::models::{DailyAggregate, HourlyStationAggregate};
use crate::utils::constants::HOURS_PER_WEEK;
use crate::utils::dates::date_range;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// Mean pickups and dropoffs for one hour of the week (0 = Monday 00h).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyProfilePoint {
    pub hour_of_week: u32,
    pub pickups: f64,
    pub dropoffs: f64,
}

pub fn hour_of_week(date: NaiveDate, hour: u32) -> u32 {
    date.weekday().num_days_from_monday() * 24 + hour
}

/// Average week of activity across the dates covered by `records`.
///
/// Counts are summed over rider and bike types (and over stations, unless
/// `stations` narrows them), then divided by how often each weekday occurs
/// between the first and last date. Hours with no rows count as zero.
pub fn weekly_profile(
    records: &[HourlyStationAggregate],
    stations: Option<&[String]>,
) -> Vec<WeeklyProfilePoint> {
    let allowed: Option<HashSet<&str>> =
        stations.map(|ids| ids.iter().map(String::as_str).collect());

    let selected: Vec<&HourlyStationAggregate> = records
        .iter()
        .filter(|r| {
            allowed
                .as_ref()
                .map_or(true, |ids| ids.contains(r.station_id.as_str()))
        })
        .collect();

    let mut pickups = vec![0u64; HOURS_PER_WEEK];
    let mut dropoffs = vec![0u64; HOURS_PER_WEEK];
    for record in &selected {
        let slot = hour_of_week(record.date, record.hour) as usize;
        if slot < HOURS_PER_WEEK {
            pickups[slot] += record.pickups;
            dropoffs[slot] += record.dropoffs;
        }
    }

    let mut weekday_counts = [0u32; 7];
    let first = selected.iter().map(|r| r.date).min();
    let last = selected.iter().map(|r| r.date).max();
    if let (Some(first), Some(last)) = (first, last) {
        for date in date_range(first, last) {
            weekday_counts[date.weekday().num_days_from_monday() as usize] += 1;
        }
    }

    (0..HOURS_PER_WEEK)
        .map(|slot| {
            let weeks = f64::from(weekday_counts[slot / 24].max(1));
            WeeklyProfilePoint {
                hour_of_week: slot as u32,
                pickups: pickups[slot] as f64 / weeks,
                dropoffs: dropoffs[slot] as f64 / weeks,
            }
        })
        .collect()
}

pub fn daily_series(daily: &[DailyAggregate]) -> Vec<(NaiveDate, f64)> {
    daily
        .iter()
        .map(|row| (row.date, row.trip_count as f64))
        .collect()
}

/// Trailing rolling mean over `window` points; the first `window - 1`
/// points are dropped.
pub fn rolling_mean(series: &[(NaiveDate, f64)], window: usize) -> Vec<(NaiveDate, f64)> {
    if window == 0 || series.len() < window {
        return Vec::new();
    }

    series
        .windows(window)
        .map(|w| {
            let sum: f64 = w.iter().map(|(_, v)| v).sum();
            (w[window - 1].0, sum / window as f64)
        })
        .collect()
}

/// Total pickups per station, busiest first.
pub fn station_totals(records: &[HourlyStationAggregate]) -> Vec<(String, u64, u64)> {
    let mut totals: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.station_id.as_str()).or_default();
        entry.0 += record.pickups;
        entry.1 += record.dropoffs;
    }

    let mut ranked: Vec<(String, u64, u64)> = totals
        .into_iter()
        .map(|(id, (p, d))| (id.to_string(), p, d))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(station: &str, d: NaiveDate, hour: u32, pickups: u64, dropoffs: u64) -> HourlyStationAggregate {
        HourlyStationAggregate {
            station_id: station.to_string(),
            date: d,
            hour,
            member: 1,
            ebike: 0,
            pickups,
            dropoffs,
        }
    }

    #[test]
    fn test_hour_of_week() {
        // 2023-04-03 is a Monday
        assert_eq!(hour_of_week(date(2023, 4, 3), 0), 0);
        assert_eq!(hour_of_week(date(2023, 4, 3), 8), 8);
        assert_eq!(hour_of_week(date(2023, 4, 9), 23), 167);
    }

    #[test]
    fn test_weekly_profile_averages_over_weeks() {
        let records = vec![
            row("A", date(2023, 4, 3), 8, 4, 1),
            row("A", date(2023, 4, 10), 8, 2, 3),
            row("B", date(2023, 4, 10), 8, 10, 0),
        ];

        let all = weekly_profile(&records, None);
        assert_eq!(all.len(), HOURS_PER_WEEK);
        assert_eq!(all[8].pickups, 8.0);
        assert_eq!(all[8].dropoffs, 2.0);
        assert_eq!(all[9].pickups, 0.0);

        let only_a = weekly_profile(&records, Some(&["A".to_string()][..]));
        assert_eq!(only_a[8].pickups, 3.0);
        assert_eq!(only_a[8].dropoffs, 2.0);
    }

    #[test]
    fn test_weekly_profile_empty() {
        let profile = weekly_profile(&[], None);
        assert_eq!(profile.len(), HOURS_PER_WEEK);
        assert!(profile.iter().all(|p| p.pickups == 0.0 && p.dropoffs == 0.0));
    }

    #[test]
    fn test_rolling_mean() {
        let series = vec![
            (date(2023, 4, 1), 1.0),
            (date(2023, 4, 2), 2.0),
            (date(2023, 4, 3), 6.0),
        ];
        assert_eq!(
            rolling_mean(&series, 2),
            vec![(date(2023, 4, 2), 1.5), (date(2023, 4, 3), 4.0)]
        );
        assert!(rolling_mean(&series, 7).is_empty());
    }

    #[test]
    fn test_station_totals_ranked() {
        let records = vec![
            row("B", date(2023, 4, 3), 8, 1, 1),
            row("A", date(2023, 4, 3), 8, 5, 0),
            row("B", date(2023, 4, 3), 9, 4, 2),
        ];
        assert_eq!(
            station_totals(&records),
            vec![("A".to_string(), 5, 0), ("B".to_string(), 5, 3)]
        );
    }
}
