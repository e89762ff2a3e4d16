use crate::error::{ProcessingError, Result};
use crate::models::{DailyAggregate, HourlyStationAggregate};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const AGGREGATE_HINT: &str = "Please run the aggregate task first.";

pub struct AggregateReader {
    limit: Option<usize>,
}

impl AggregateReader {
    pub fn new() -> Self {
        Self { limit: None }
    }

    /// Stop after `limit` rows. Zero means no limit.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
        }
    }

    pub fn read_daily(&self, path: &Path) -> Result<Vec<DailyAggregate>> {
        self.read_table(path)
    }

    pub fn read_hourly(&self, path: &Path) -> Result<Vec<HourlyStationAggregate>> {
        self.read_table(path)
    }

    fn read_table<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Err(ProcessingError::missing_file(path, AGGREGATE_HINT));
        }

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(File::open(path)?);

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            rows.push(result?);
            if self.limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

impl Default for AggregateReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_daily_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daily_aggregates.csv");
        fs::write(&path, "date,trip_count\n2023-04-01,12\n2023-04-02,0\n").unwrap();

        let rows = AggregateReader::new().read_daily(&path).unwrap();
        assert_eq!(
            rows,
            vec![
                DailyAggregate::new(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(), 12),
                DailyAggregate::new(NaiveDate::from_ymd_opt(2023, 4, 2).unwrap(), 0),
            ]
        );
    }

    #[test]
    fn test_read_hourly_table_with_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hourly_station_aggregates.csv");
        fs::write(
            &path,
            "station_id,date,hour,member,ebike,pickups,dropoffs\n\
             A32000,2023-04-03,8,1,0,2,0\n\
             A32000,2023-04-03,9,0,1,0,1\n",
        )
        .unwrap();

        let rows = AggregateReader::with_limit(1).read_hourly(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].station_id, "A32000");
        assert_eq!(rows[0].pickups, 2);
    }

    #[test]
    fn test_missing_table_hints_at_aggregate_task() {
        let dir = TempDir::new().unwrap();
        let err = AggregateReader::new()
            .read_daily(&dir.path().join("daily_aggregates.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("aggregate task"));
    }
}
