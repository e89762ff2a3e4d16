use crate::config::AggregateTripsContext;
use crate::error::Result;
use crate::models::{DailyAggregate, HourlyStationAggregate};
use crate::processors::{DailyAggregator, HourlyStationAggregator, TripCleaner};
use crate::readers::{read_stations_of_interest, StationReader, TripReader};
use crate::utils::constants::{DAILY_AGGREGATES_FILE, HOURLY_AGGREGATES_FILE};
use crate::utils::logging::log_banner;
use crate::writers::CsvWriter;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSummary {
    pub trips_loaded: usize,
    pub trips_cleaned: usize,
    pub daily_rows: usize,
    pub hourly_rows: usize,
    pub daily_path: PathBuf,
    pub hourly_path: PathBuf,
}

/// Load, clean and aggregate the raw trips, writing both aggregate tables.
///
/// Any missing input aborts the run; files already written stay in place.
pub fn aggregate_trips(ctx: &AggregateTripsContext) -> Result<AggregationSummary> {
    info!("Starting trip data aggregation");
    info!("Input directory: {}", ctx.raw_trips_dir().display());
    info!("Output directory: {}", ctx.processed_dir().display());

    log_banner("Loading trip data");
    let trips = TripReader::new().load_trips(&ctx.raw_trips_dir())?;

    log_banner("Loading station metadata");
    let known_ids = StationReader::new().read_station_ids(&ctx.station_metadata_path())?;
    info!("Loaded {} station identifiers", known_ids.len());

    log_banner("Cleaning trip data");
    let (cleaned, report) = TripCleaner::new().clean(&trips, &known_ids);
    for line in report.generate_summary().lines() {
        info!("{}", line);
    }

    log_banner("Generating daily aggregates");
    let daily = DailyAggregator::new().aggregate(&cleaned)?;
    let daily_path = ctx.processed_dir().join(DAILY_AGGREGATES_FILE);
    CsvWriter::new().write_table(&daily_path, DailyAggregate::COLUMNS, &daily)?;
    log_daily_output(&daily, &daily_path);

    log_banner("Generating hourly station-level aggregates");
    let stations = read_stations_of_interest(&ctx.stations_of_interest_path())?;
    info!("Loaded {} stations of interest", stations.len());

    let hourly = HourlyStationAggregator::new(ctx.hourly_start_date, &stations).aggregate(&cleaned);
    let hourly_path = ctx.processed_dir().join(HOURLY_AGGREGATES_FILE);
    CsvWriter::new().write_table(&hourly_path, HourlyStationAggregate::COLUMNS, &hourly)?;
    log_hourly_output(&hourly, &hourly_path);

    log_banner("✓ Trip aggregation completed");

    Ok(AggregationSummary {
        trips_loaded: trips.len(),
        trips_cleaned: cleaned.len(),
        daily_rows: daily.len(),
        hourly_rows: hourly.len(),
        daily_path,
        hourly_path,
    })
}

fn log_daily_output(daily: &[DailyAggregate], path: &std::path::Path) {
    info!("✓ Saved daily aggregates: {} days", daily.len());
    info!("  Output: {}", path.display());
    if let (Some(first), Some(last)) = (daily.first(), daily.last()) {
        info!("  Date range: {} to {}", first.date, last.date);
    }
}

fn log_hourly_output(hourly: &[HourlyStationAggregate], path: &std::path::Path) {
    info!("✓ Saved hourly station aggregates: {} records", hourly.len());
    info!("  Output: {}", path.display());

    let stations: BTreeSet<&str> = hourly.iter().map(|r| r.station_id.as_str()).collect();
    info!("  Stations: {}", stations.len());

    let dates = hourly.iter().map(|r| r.date);
    if let (Some(min), Some(max)) = (dates.clone().min(), dates.max()) {
        info!("  Date range: {} to {}", min, max);
    }
}
