use crate::error::{ProcessingError, Result};
use crate::models::StationMetadata;
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::info;

const DOWNLOAD_HINT: &str = "Please run the download-stations task first.";

pub struct StationReader;

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_stations(&self, path: &Path) -> Result<Vec<StationMetadata>> {
        let file = Self::open(path)?;
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

        let mut stations = Vec::new();
        for result in reader.deserialize() {
            let station: StationMetadata = result?;
            stations.push(station);
        }

        Ok(stations)
    }

    /// Distinct non-empty `station_id` and `short_name` values: the ids that
    /// trip files may legitimately reference.
    pub fn read_station_ids(&self, path: &Path) -> Result<HashSet<String>> {
        info!("Loading station metadata from {}", path.display());

        let file = Self::open(path)?;
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);
        let headers = reader.headers()?.clone();

        let station_id_idx = headers
            .iter()
            .position(|h| h == "station_id")
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "{} has no station_id column",
                    path.display()
                ))
            })?;
        let short_name_idx = headers.iter().position(|h| h == "short_name");

        let mut ids = HashSet::new();
        let mut station_count = 0usize;
        for result in reader.records() {
            let record = result?;
            station_count += 1;

            let columns = std::iter::once(Some(station_id_idx)).chain(std::iter::once(short_name_idx));
            for idx in columns.flatten() {
                if let Some(value) = record.get(idx).filter(|v| !v.is_empty()) {
                    ids.insert(value.to_string());
                }
            }
        }

        info!(
            "Loaded {} stations with {} unique IDs",
            station_count,
            ids.len()
        );

        Ok(ids)
    }

    fn open(path: &Path) -> Result<File> {
        if !path.exists() {
            return Err(ProcessingError::missing_file(path, DOWNLOAD_HINT));
        }
        Ok(File::open(path)?)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
