use crate::error::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Writes fixed-schema CSV tables. The header row is written even for an empty table.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn write_table<T: Serialize>(
        &self,
        path: &Path,
        columns: &[&str],
        records: &[T],
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        writer.write_record(columns)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", records.len(), path.display());
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyAggregate, HourlyStationAggregate};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_write_daily_aggregates() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out").join("daily_aggregates.csv");
        let rows = vec![
            DailyAggregate::new(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(), 3),
            DailyAggregate::new(NaiveDate::from_ymd_opt(2023, 4, 2).unwrap(), 0),
        ];

        CsvWriter::new().write_table(&path, DailyAggregate::COLUMNS, &rows)?;

        let contents = fs::read_to_string(&path)?;
        assert_eq!(contents, "date,trip_count\n2023-04-01,3\n2023-04-02,0\n");
        Ok(())
    }

    #[test]
    fn test_empty_table_keeps_header() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("hourly_station_aggregates.csv");
        let rows: Vec<HourlyStationAggregate> = Vec::new();

        CsvWriter::new().write_table(&path, HourlyStationAggregate::COLUMNS, &rows)?;

        let contents = fs::read_to_string(&path)?;
        assert_eq!(
            contents,
            "station_id,date,hour,member,ebike,pickups,dropoffs\n"
        );
        Ok(())
    }

    #[test]
    fn test_overwrites_existing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("daily_aggregates.csv");
        fs::write(&path, "stale contents that are longer than the new table\n")?;

        let rows = vec![DailyAggregate::new(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(), 1)];
        CsvWriter::new().write_table(&path, DailyAggregate::COLUMNS, &rows)?;

        assert_eq!(fs::read_to_string(&path)?, "date,trip_count\n2023-04-01,1\n");
        Ok(())
    }
}
