use crate::models::{CleanedTrip, TripRecord};
use crate::utils::constants::{
    FALSE_START_MINUTES, MAINTENANCE_STATION_PREFIX, MAX_TRIP_MINUTES, MIN_TRIP_MINUTES,
};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub initial_trips: usize,
    pub unknown_station_ids: BTreeSet<String>,
    pub maintenance_station_ids: BTreeSet<String>,
    pub maintenance_removed: usize,
    pub duration_removed: usize,
    pub false_starts_removed: usize,
    pub remaining_trips: usize,
}

impl CleaningReport {
    pub fn outliers_removed(&self) -> usize {
        self.duration_removed + self.false_starts_removed
    }

    pub fn generate_summary(&self) -> String {
        let pct = |n: usize| {
            if self.initial_trips == 0 {
                0.0
            } else {
                n as f64 / self.initial_trips as f64 * 100.0
            }
        };

        let mut summary = String::new();
        summary.push_str("Trip Cleaning Report\n");
        summary.push_str("====================\n");
        summary.push_str(&format!("Input trips: {}\n", self.initial_trips));
        summary.push_str(&format!(
            "Unknown station IDs: {} ({} maintenance, X-prefixed)\n",
            self.unknown_station_ids.len(),
            self.maintenance_station_ids.len()
        ));
        summary.push_str(&format!(
            "Maintenance trips removed: {} ({:.2}%)\n",
            self.maintenance_removed,
            pct(self.maintenance_removed)
        ));
        summary.push_str(&format!(
            "Duration <{} min or >{} min removed: {}\n",
            MIN_TRIP_MINUTES, MAX_TRIP_MINUTES, self.duration_removed
        ));
        summary.push_str(&format!(
            "Same-station trips <{} min removed: {}\n",
            FALSE_START_MINUTES, self.false_starts_removed
        ));
        summary.push_str(&format!(
            "Remaining trips: {} ({:.2}%)\n",
            self.remaining_trips,
            pct(self.remaining_trips)
        ));
        summary
    }
}

/// Removes maintenance trips and duration outliers.
///
/// Steps run in a fixed order: maintenance filter, duration computation,
/// outlier filter. The input slice is never modified.
pub struct TripCleaner {
    min_minutes: f64,
    max_minutes: f64,
    false_start_minutes: f64,
}

impl TripCleaner {
    pub fn new() -> Self {
        Self {
            min_minutes: MIN_TRIP_MINUTES,
            max_minutes: MAX_TRIP_MINUTES,
            false_start_minutes: FALSE_START_MINUTES,
        }
    }

    pub fn clean(
        &self,
        trips: &[TripRecord],
        known_station_ids: &HashSet<String>,
    ) -> (Vec<CleanedTrip>, CleaningReport) {
        let mut report = CleaningReport {
            initial_trips: trips.len(),
            ..Default::default()
        };

        let kept = self.filter_maintenance_trips(trips, known_station_ids, &mut report);
        let with_duration = Self::calculate_durations(kept);
        let cleaned = self.filter_outliers(with_duration, &mut report);

        report.remaining_trips = cleaned.len();
        info!(
            "Cleaning complete: {} trips remaining of {}",
            report.remaining_trips, report.initial_trips
        );

        (cleaned, report)
    }

    /// Ids referenced by trips but absent from station metadata.
    pub fn unknown_station_ids(
        trips: &[TripRecord],
        known_station_ids: &HashSet<String>,
    ) -> BTreeSet<String> {
        trips
            .iter()
            .flat_map(|t| [t.start_station_id.as_ref(), t.end_station_id.as_ref()])
            .flatten()
            .filter(|id| !known_station_ids.contains(*id))
            .cloned()
            .collect()
    }

    fn filter_maintenance_trips<'a>(
        &self,
        trips: &'a [TripRecord],
        known_station_ids: &HashSet<String>,
        report: &mut CleaningReport,
    ) -> Vec<&'a TripRecord> {
        report.unknown_station_ids = Self::unknown_station_ids(trips, known_station_ids);
        report.maintenance_station_ids = report
            .unknown_station_ids
            .iter()
            .filter(|id| id.starts_with(MAINTENANCE_STATION_PREFIX))
            .cloned()
            .collect();

        info!(
            "Found {} unknown station IDs",
            report.unknown_station_ids.len()
        );
        info!(
            "Identified {} maintenance stations (X-prefixed)",
            report.maintenance_station_ids.len()
        );

        let maintenance = &report.maintenance_station_ids;
        let touches_maintenance = |id: &Option<String>| {
            id.as_ref().map(|id| maintenance.contains(id)).unwrap_or(false)
        };

        let kept: Vec<&TripRecord> = trips
            .iter()
            .filter(|t| !touches_maintenance(&t.start_station_id) && !touches_maintenance(&t.end_station_id))
            .collect();

        report.maintenance_removed = trips.len() - kept.len();
        info!("Removed {} maintenance trips", report.maintenance_removed);

        kept
    }

    fn calculate_durations(trips: Vec<&TripRecord>) -> Vec<(&TripRecord, Option<f64>)> {
        trips
            .into_iter()
            .map(|t| (t, t.duration_minutes()))
            .collect()
    }

    fn filter_outliers(
        &self,
        trips: Vec<(&TripRecord, Option<f64>)>,
        report: &mut CleaningReport,
    ) -> Vec<CleanedTrip> {
        let mut cleaned = Vec::with_capacity(trips.len());

        for (trip, duration) in trips {
            // A null duration fails the range test like any out-of-range value.
            let duration = match duration {
                Some(d) if d >= self.min_minutes && d <= self.max_minutes => d,
                _ => {
                    report.duration_removed += 1;
                    continue;
                }
            };

            if trip.is_same_station() && duration < self.false_start_minutes {
                report.false_starts_removed += 1;
                continue;
            }

            cleaned.push(CleanedTrip::new(trip.clone(), duration));
        }

        info!(
            "  Removed {} trips with duration <{} min or >{} min",
            report.duration_removed, self.min_minutes, self.max_minutes
        );
        info!(
            "  Removed {} same-station trips <{} min (false starts)",
            report.false_starts_removed, self.false_start_minutes
        );

        cleaned
    }
}

impl Default for TripCleaner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dates::parse_timestamp;

    fn trip(start: &str, end: &str, from: &str, to: &str) -> TripRecord {
        TripRecord::new(
            parse_timestamp(start),
            parse_timestamp(end),
            Some(from.to_string()),
            Some(to.to_string()),
            Some("member".to_string()),
            Some("classic_bike".to_string()),
        )
    }

    fn known(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_false_start_removed() {
        let trips = vec![
            trip("2023-04-01 08:00:00", "2023-04-01 08:10:00", "A", "B"),
            trip("2023-04-01 08:05:00", "2023-04-01 08:06:00", "A", "A"),
        ];

        let (cleaned, report) = TripCleaner::new().clean(&trips, &known(&["A", "B"]));

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].trip, trips[0]);
        assert_eq!(cleaned[0].min_duration, 10.0);
        assert_eq!(report.false_starts_removed, 1);
        assert_eq!(report.duration_removed, 0);
    }

    #[test]
    fn test_same_station_trip_over_three_minutes_kept() {
        let trips = vec![trip("2023-04-01 08:00:00", "2023-04-01 08:03:00", "A", "A")];
        let (cleaned, _) = TripCleaner::new().clean(&trips, &known(&["A"]));
        assert_eq!(cleaned.len(), 1);
    }

    #[test]
    fn test_maintenance_station_dropped_regardless_of_duration() {
        let trips = vec![
            trip("2023-04-01 08:00:00", "2023-04-01 08:30:00", "X1234", "A"),
            trip("2023-04-01 09:00:00", "2023-04-01 09:30:00", "A", "X1234"),
            trip("2023-04-01 10:00:00", "2023-04-01 10:30:00", "A", "B"),
        ];

        let (cleaned, report) = TripCleaner::new().clean(&trips, &known(&["A", "B"]));

        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.maintenance_removed, 2);
        assert!(report.maintenance_station_ids.contains("X1234"));
        for t in &cleaned {
            assert_ne!(t.trip.start_station_id.as_deref(), Some("X1234"));
            assert_ne!(t.trip.end_station_id.as_deref(), Some("X1234"));
        }
    }

    #[test]
    fn test_known_x_station_not_treated_as_maintenance() {
        let trips = vec![trip("2023-04-01 08:00:00", "2023-04-01 08:30:00", "X9", "A")];
        let (cleaned, report) = TripCleaner::new().clean(&trips, &known(&["X9", "A"]));

        assert_eq!(cleaned.len(), 1);
        assert!(report.maintenance_station_ids.is_empty());
    }

    #[test]
    fn test_unknown_non_x_station_passes_through() {
        let trips = vec![trip("2023-04-01 08:00:00", "2023-04-01 08:30:00", "Z77", "A")];
        let (cleaned, report) = TripCleaner::new().clean(&trips, &known(&["A"]));

        assert_eq!(cleaned.len(), 1);
        assert!(report.unknown_station_ids.contains("Z77"));
        assert!(report.maintenance_station_ids.is_empty());
        assert_eq!(report.maintenance_removed, 0);
    }

    #[test]
    fn test_null_timestamp_dropped_by_duration_filter() {
        let trips = vec![
            trip("not a date", "2023-04-01 08:30:00", "A", "B"),
            trip("2023-04-01 08:00:00", "2023-04-01 08:30:00", "A", "B"),
        ];

        let (cleaned, report) = TripCleaner::new().clean(&trips, &known(&["A", "B"]));

        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.duration_removed, 1);
        assert_eq!(report.maintenance_removed, 0);
    }

    #[test]
    fn test_duration_bounds_inclusive() {
        let trips = vec![
            trip("2023-04-01 08:00:00", "2023-04-01 08:01:00", "A", "B"),
            trip("2023-04-01 08:00:00", "2023-04-01 10:00:00", "A", "B"),
            trip("2023-04-01 08:00:00", "2023-04-01 08:00:59", "A", "B"),
            trip("2023-04-01 08:00:00", "2023-04-01 10:00:01", "A", "B"),
            trip("2023-04-01 08:00:00", "2023-04-01 07:50:00", "A", "B"),
        ];

        let (cleaned, report) = TripCleaner::new().clean(&trips, &known(&["A", "B"]));

        assert_eq!(cleaned.len(), 2);
        assert_eq!(report.duration_removed, 3);
        for t in &cleaned {
            assert!(t.min_duration >= 1.0 && t.min_duration <= 120.0);
        }
    }

    #[test]
    fn test_missing_station_ids_are_not_maintenance() {
        let mut t = trip("2023-04-01 08:00:00", "2023-04-01 08:01:30", "A", "B");
        t.start_station_id = None;
        t.end_station_id = None;

        let (cleaned, report) = TripCleaner::new().clean(&[t], &known(&["A"]));

        // Two missing ids never match, so the short trip is not a false start.
        assert_eq!(cleaned.len(), 1);
        assert!(report.unknown_station_ids.is_empty());
    }

    #[test]
    fn test_input_not_modified() {
        let trips = vec![trip("2023-04-01 08:00:00", "2023-04-01 08:00:30", "A", "B")];
        let before = trips.clone();
        let _ = TripCleaner::new().clean(&trips, &known(&["A", "B"]));
        assert_eq!(trips, before);
    }

    #[test]
    fn test_report_summary() {
        let trips = vec![
            trip("2023-04-01 08:00:00", "2023-04-01 08:10:00", "A", "B"),
            trip("2023-04-01 08:00:00", "2023-04-01 08:10:00", "X1", "B"),
        ];
        let (_, report) = TripCleaner::new().clean(&trips, &known(&["A", "B"]));
        let summary = report.generate_summary();

        assert!(summary.contains("Input trips: 2"));
        assert!(summary.contains("Maintenance trips removed: 1 (50.00%)"));
        assert_eq!(report.outliers_removed(), 0);
    }
}
