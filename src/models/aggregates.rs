use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub trip_count: u64,
}

impl DailyAggregate {
    pub const COLUMNS: &'static [&'static str] = &["date", "trip_count"];

    pub fn new(date: NaiveDate, trip_count: u64) -> Self {
        Self { date, trip_count }
    }
}

/// Grouping key of the hourly station aggregates. Field order is the sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourlyKey {
    pub station_id: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub member: u8,
    pub ebike: u8,
}

/// Pickups and dropoffs at one station in one hour for one rider/bike type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyStationAggregate {
    pub station_id: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub member: u8,
    pub ebike: u8,
    pub pickups: u64,
    pub dropoffs: u64,
}

impl HourlyStationAggregate {
    pub const COLUMNS: &'static [&'static str] = &[
        "station_id",
        "date",
        "hour",
        "member",
        "ebike",
        "pickups",
        "dropoffs",
    ];

    pub fn from_key(key: HourlyKey, pickups: u64, dropoffs: u64) -> Self {
        Self {
            station_id: key.station_id,
            date: key.date,
            hour: key.hour,
            member: key.member,
            ebike: key.ebike,
            pickups,
            dropoffs,
        }
    }

    pub fn key(&self) -> HourlyKey {
        HourlyKey {
            station_id: self.station_id.clone(),
            date: self.date,
            hour: self.hour,
            member: self.member,
            ebike: self.ebike,
        }
    }
}
