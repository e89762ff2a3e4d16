use crate::error::{ProcessingError, Result};
use crate::models::TripRecord;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, TRIP_COLUMNS, TRIP_COLUMN_MAPPING};
use crate::utils::dates::parse_timestamp;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripFileStats {
    pub file_name: String,
    pub rows: usize,
    pub null_starts: usize,
    pub null_ends: usize,
}

/// Column positions of the canonical trip fields within one file.
#[derive(Debug, Default)]
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    /// Rename legacy headers to canonical names and keep the canonical ones present.
    fn from_headers(headers: &StringRecord) -> Self {
        let mut positions = HashMap::new();

        for (idx, raw) in headers.iter().enumerate() {
            let raw = raw.trim().trim_start_matches('\u{feff}');
            let renamed = TRIP_COLUMN_MAPPING
                .iter()
                .find(|(legacy, _)| *legacy == raw)
                .map(|(_, canonical)| *canonical)
                .unwrap_or(raw);

            if let Some(canonical) = TRIP_COLUMNS.iter().find(|c| **c == renamed) {
                positions.entry(*canonical).or_insert(idx);
            }
        }

        Self { positions }
    }

    fn text(&self, record: &StringRecord, column: &str) -> Option<String> {
        self.positions
            .get(column)
            .and_then(|idx| record.get(*idx))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn number(&self, record: &StringRecord, column: &str) -> Option<f64> {
        self.text(record, column).and_then(|v| v.parse::<f64>().ok())
    }

    fn columns(&self) -> Vec<&'static str> {
        TRIP_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.positions.contains_key(c))
            .collect()
    }
}

pub struct TripReader {
    extension: String,
}

impl TripReader {
    pub fn new() -> Self {
        Self {
            extension: "csv".to_string(),
        }
    }

    /// Trip CSV files in `dir`, sorted by file name.
    pub fn find_trip_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(ProcessingError::MissingInput(format!(
                "Trip directory does not exist: {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(&self.extension))
                    .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(ProcessingError::MissingInput(format!(
                "No CSV files found in {}",
                dir.display()
            )));
        }

        Ok(files)
    }

    pub fn load_trips(&self, dir: &Path) -> Result<Vec<TripRecord>> {
        let files = self.find_trip_files(dir)?;
        info!("Found {} CSV files to load", files.len());

        let mut all_trips = Vec::new();
        for path in &files {
            let (trips, stats) = self.read_trip_file(path)?;
            info!("Loaded {}: {} rows", stats.file_name, stats.rows);
            if stats.null_starts > 0 || stats.null_ends > 0 {
                warn!(
                    "{}: {} null starts, {} null ends",
                    stats.file_name, stats.null_starts, stats.null_ends
                );
            }
            all_trips.extend(trips);
        }

        info!("Concatenated into single table: {} rows", all_trips.len());
        let starts = all_trips.iter().filter_map(|t| t.started_at);
        if let Some((min, max)) = starts.fold(None, |acc, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        }) {
            info!("  Date range: {} to {}", min, max);
        }

        Ok(all_trips)
    }

    pub fn read_trip_file(&self, path: &Path) -> Result<(Vec<TripRecord>, TripFileStats)> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));

        let columns = ColumnIndex::from_headers(reader.headers()?);
        tracing::debug!("{}: columns kept {:?}", path.display(), columns.columns());

        let mut stats = TripFileStats {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        };

        let mut trips = Vec::new();
        for result in reader.records() {
            let record = result?;
            let trip = Self::parse_record(&columns, &record);

            if trip.started_at.is_none() {
                stats.null_starts += 1;
            }
            if trip.ended_at.is_none() {
                stats.null_ends += 1;
            }
            trips.push(trip);
        }
        stats.rows = trips.len();

        Ok((trips, stats))
    }

    fn parse_record(columns: &ColumnIndex, record: &StringRecord) -> TripRecord {
        TripRecord {
            started_at: columns
                .text(record, "started_at")
                .and_then(|v| parse_timestamp(&v)),
            ended_at: columns
                .text(record, "ended_at")
                .and_then(|v| parse_timestamp(&v)),
            start_station_id: columns.text(record, "start_station_id"),
            end_station_id: columns.text(record, "end_station_id"),
            start_lat: columns.number(record, "start_lat"),
            start_lng: columns.number(record, "start_lng"),
            end_lat: columns.number(record, "end_lat"),
            end_lng: columns.number(record, "end_lng"),
            member_casual: columns.text(record, "member_casual"),
            rideable_type: columns.text(record, "rideable_type"),
        }
    }
}

impl Default for TripReader {
    fn default() -> Self {
        Self::new()
    }
}
