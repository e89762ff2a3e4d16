use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::utils::constants::{EBIKE_RIDEABLE_TYPE, MEMBER_USER_TYPE};

/// One bicycle rental in the canonical trip schema. Unparseable timestamps are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub started_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
    pub start_station_id: Option<String>,
    pub end_station_id: Option<String>,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    pub member_casual: Option<String>,
    pub rideable_type: Option<String>,
}

impl TripRecord {
    pub fn new(
        started_at: Option<NaiveDateTime>,
        ended_at: Option<NaiveDateTime>,
        start_station_id: Option<String>,
        end_station_id: Option<String>,
        member_casual: Option<String>,
        rideable_type: Option<String>,
    ) -> Self {
        Self {
            started_at,
            ended_at,
            start_station_id,
            end_station_id,
            member_casual,
            rideable_type,
            ..Default::default()
        }
    }

    /// Trip length in fractional minutes, `None` if either timestamp is missing.
    pub fn duration_minutes(&self) -> Option<f64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => {
                let delta = end - start;
                Some(delta.num_milliseconds() as f64 / 60_000.0)
            }
            _ => None,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.started_at.map(|t| t.date())
    }

    pub fn start_hour(&self) -> Option<u32> {
        self.started_at.map(|t| t.hour())
    }

    pub fn is_member(&self) -> bool {
        self.member_casual.as_deref() == Some(MEMBER_USER_TYPE)
    }

    pub fn is_ebike(&self) -> bool {
        self.rideable_type.as_deref() == Some(EBIKE_RIDEABLE_TYPE)
    }

    /// Both ends present and identical. Missing ids never compare equal.
    pub fn is_same_station(&self) -> bool {
        match (&self.start_station_id, &self.end_station_id) {
            (Some(start), Some(end)) => start == end,
            _ => false,
        }
    }
}

/// A trip that survived cleaning, with its duration attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTrip {
    pub trip: TripRecord,
    pub min_duration: f64,
}

impl CleanedTrip {
    pub fn new(trip: TripRecord, min_duration: f64) -> Self {
        Self { trip, min_duration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
    }

    #[test]
    fn test_duration_minutes() {
        let trip = TripRecord::new(
            at("2023-04-01 08:00:00"),
            at("2023-04-01 08:10:30"),
            Some("A".to_string()),
            Some("B".to_string()),
            None,
            None,
        );

        assert_eq!(trip.duration_minutes(), Some(10.5));
        assert_eq!(trip.start_hour(), Some(8));
    }

    #[test]
    fn test_duration_with_missing_timestamp() {
        let trip = TripRecord::new(
            None,
            at("2023-04-01 08:10:00"),
            Some("A".to_string()),
            Some("B".to_string()),
            None,
            None,
        );

        assert_eq!(trip.duration_minutes(), None);
        assert_eq!(trip.start_date(), None);
    }

    #[test]
    fn test_rider_and_bike_flags() {
        let trip = TripRecord::new(
            None,
            None,
            None,
            None,
            Some("member".to_string()),
            Some("electric_bike".to_string()),
        );
        assert!(trip.is_member());
        assert!(trip.is_ebike());

        let legacy = TripRecord::new(
            None,
            None,
            None,
            None,
            Some("Subscriber".to_string()),
            None,
        );
        assert!(!legacy.is_member());
        assert!(!legacy.is_ebike());
    }

    #[test]
    fn test_same_station_requires_both_ids() {
        let mut trip = TripRecord::new(
            None,
            None,
            Some("A".to_string()),
            Some("A".to_string()),
            None,
            None,
        );
        assert!(trip.is_same_station());

        trip.end_station_id = None;
        assert!(!trip.is_same_station());

        trip.start_station_id = None;
        assert!(!trip.is_same_station());
    }
}
