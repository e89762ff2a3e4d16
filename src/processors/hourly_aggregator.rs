use crate::models::{CleanedTrip, HourlyKey, HourlyStationAggregate};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    pickups: u64,
    dropoffs: u64,
}

/// Hourly pickups and dropoffs per station of interest.
///
/// Start and end stations are tested against the allow-list independently,
/// so one trip can count as a pickup, a dropoff, both or neither.
pub struct HourlyStationAggregator {
    start: NaiveDateTime,
    stations: HashSet<String>,
}

impl HourlyStationAggregator {
    pub fn new(start_date: NaiveDate, stations_of_interest: &[String]) -> Self {
        Self {
            start: start_date.and_time(NaiveTime::MIN),
            stations: stations_of_interest.iter().cloned().collect(),
        }
    }

    pub fn aggregate(&self, trips: &[CleanedTrip]) -> Vec<HourlyStationAggregate> {
        let mut table: BTreeMap<HourlyKey, Counts> = BTreeMap::new();
        let mut in_window = 0usize;
        let mut pickup_rows = 0usize;
        let mut dropoff_rows = 0usize;

        for cleaned in trips {
            let trip = &cleaned.trip;
            let started_at = match trip.started_at {
                Some(t) if t >= self.start => t,
                _ => continue,
            };
            in_window += 1;

            let key_for = |station_id: &str| HourlyKey {
                station_id: station_id.to_string(),
                date: started_at.date(),
                hour: started_at.hour(),
                member: u8::from(trip.is_member()),
                ebike: u8::from(trip.is_ebike()),
            };

            if let Some(id) = self.station_of_interest(trip.start_station_id.as_deref()) {
                let counts = table.entry(key_for(id)).or_default();
                if counts.pickups == 0 {
                    pickup_rows += 1;
                }
                counts.pickups += 1;
            }

            if let Some(id) = self.station_of_interest(trip.end_station_id.as_deref()) {
                let counts = table.entry(key_for(id)).or_default();
                if counts.dropoffs == 0 {
                    dropoff_rows += 1;
                }
                counts.dropoffs += 1;
            }
        }

        info!(
            "Filtered to {} trips from {} onwards",
            in_window,
            self.start.date()
        );
        info!("Calculated pickups: {} records", pickup_rows);
        info!("Calculated dropoffs: {} records", dropoff_rows);

        let aggregates: Vec<HourlyStationAggregate> = table
            .into_iter()
            .map(|(key, c)| HourlyStationAggregate::from_key(key, c.pickups, c.dropoffs))
            .collect();

        let stations: HashSet<&str> = aggregates.iter().map(|a| a.station_id.as_str()).collect();
        info!(
            "Hourly station aggregates: {} records across {} stations",
            aggregates.len(),
            stations.len()
        );

        aggregates
    }

    fn station_of_interest<'a>(&self, id: Option<&'a str>) -> Option<&'a str> {
        id.filter(|id| self.stations.contains(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripRecord;
    use crate::utils::dates::parse_timestamp;
    use pretty_assertions::assert_eq;

    fn cleaned(start: &str, from: &str, to: &str, rider: &str, bike: &str) -> CleanedTrip {
        let started_at = parse_timestamp(start);
        let trip = TripRecord::new(
            started_at,
            started_at.map(|t| t + chrono::Duration::minutes(10)),
            Some(from.to_string()),
            Some(to.to_string()),
            Some(rider.to_string()),
            Some(bike.to_string()),
        );
        CleanedTrip::new(trip, 10.0)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(station: &str, d: &str, hour: u32, member: u8, ebike: u8, p: u64, o: u64) -> HourlyStationAggregate {
        HourlyStationAggregate {
            station_id: station.to_string(),
            date: date(d),
            hour,
            member,
            ebike,
            pickups: p,
            dropoffs: o,
        }
    }

    fn aggregator(stations: &[&str]) -> HourlyStationAggregator {
        let stations: Vec<String> = stations.iter().map(|s| s.to_string()).collect();
        HourlyStationAggregator::new(date("2023-04-01"), &stations)
    }

    #[test]
    fn test_pickup_only_when_end_not_of_interest() {
        let trips = vec![cleaned("2023-04-01 08:00:00", "A", "B", "member", "classic_bike")];
        let hourly = aggregator(&["A"]).aggregate(&trips);

        assert_eq!(hourly, vec![row("A", "2023-04-01", 8, 1, 0, 1, 0)]);
    }

    #[test]
    fn test_outer_union_of_pickups_and_dropoffs() {
        let trips = vec![cleaned("2023-04-01 08:00:00", "A", "B", "member", "classic_bike")];
        let hourly = aggregator(&["A", "B"]).aggregate(&trips);

        assert_eq!(
            hourly,
            vec![
                row("A", "2023-04-01", 8, 1, 0, 1, 0),
                row("B", "2023-04-01", 8, 1, 0, 0, 1),
            ]
        );
    }

    #[test]
    fn test_same_key_merges_both_sides() {
        let trips = vec![
            cleaned("2023-04-01 08:00:00", "A", "B", "casual", "electric_bike"),
            cleaned("2023-04-01 08:30:00", "B", "A", "casual", "electric_bike"),
            cleaned("2023-04-01 08:45:00", "A", "C", "casual", "electric_bike"),
        ];
        let hourly = aggregator(&["A"]).aggregate(&trips);

        assert_eq!(hourly, vec![row("A", "2023-04-01", 8, 0, 1, 2, 1)]);
    }

    #[test]
    fn test_trips_before_start_date_excluded() {
        let trips = vec![
            cleaned("2023-03-31 23:59:00", "A", "A", "member", "classic_bike"),
            cleaned("2023-04-01 00:00:00", "A", "A", "member", "classic_bike"),
        ];
        let hourly = aggregator(&["A"]).aggregate(&trips);

        assert_eq!(hourly, vec![row("A", "2023-04-01", 0, 1, 0, 1, 1)]);
    }

    #[test]
    fn test_sorted_by_full_key() {
        let trips = vec![
            cleaned("2023-04-02 07:00:00", "B", "Z", "member", "classic_bike"),
            cleaned("2023-04-01 09:00:00", "A", "Z", "member", "electric_bike"),
            cleaned("2023-04-01 09:00:00", "A", "Z", "casual", "classic_bike"),
            cleaned("2023-04-01 07:00:00", "A", "Z", "member", "classic_bike"),
        ];
        let hourly = aggregator(&["A", "B"]).aggregate(&trips);

        let keys: Vec<HourlyKey> = hourly.iter().map(|h| h.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
        assert_eq!(hourly.len(), 4);
        assert_eq!(hourly[0], row("A", "2023-04-01", 7, 1, 0, 1, 0));
        assert_eq!(hourly[1], row("A", "2023-04-01", 9, 0, 0, 1, 0));
        assert_eq!(hourly[2], row("A", "2023-04-01", 9, 1, 1, 1, 0));
    }

    #[test]
    fn test_no_stations_of_interest_gives_empty_output() {
        let trips = vec![cleaned("2023-04-01 08:00:00", "A", "B", "member", "classic_bike")];
        let hourly = aggregator(&[]).aggregate(&trips);
        assert!(hourly.is_empty());
    }
}
