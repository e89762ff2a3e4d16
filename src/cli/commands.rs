use crate::analyzers::{daily_series, rolling_mean, weekly_profile, AggregateAnalyzer};
use crate::cli::args::{Cli, Commands};
use crate::config::{
    AggregateTripsContext, DataLayout, DownloadStationsContext, DownloadTripsContext, Settings,
    StorageMode,
};
use crate::downloaders::{download_stations, download_trips};
use crate::error::{ProcessingError, Result};
use crate::models::{DailyAggregate, HourlyStationAggregate};
use crate::plots::{
    plot_daily_longterm, plot_hourly_weekly, plot_points_on_map, ChartOptions, LineStyle,
    MapOptions, MapPoint, Series,
};
use crate::processors::aggregate_trips;
use crate::readers::{read_stations_of_interest, AggregateReader, StationReader};
use crate::utils::constants::{DAILY_AGGREGATES_FILE, HOURLY_AGGREGATES_FILE};
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.config)?;
    let storage_setting = match &cli.command {
        Commands::DownloadTrips => settings.download_trips.output_storage.as_deref(),
        Commands::DownloadStations => settings.download_stations.output_storage.as_deref(),
        _ => settings.aggregate_trips.output_storage.as_deref(),
    };
    let storage = StorageMode::from_setting(storage_setting)?;
    let layout = DataLayout::new(storage.data_dir()?);

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| layout.log_file(cli.command.task_name()));
    init_logging(cli.verbose, Some(log_file.as_path()))?;
    info!("Loaded config from: {}", cli.config.display());
    info!("Logging to {}", log_file.display());
    info!("Data directory ({}): {}", storage, layout.root().display());

    match cli.command {
        Commands::DownloadTrips => {
            let ctx = DownloadTripsContext::from_settings(&settings.download_trips)?;
            download_trips(&ctx, false).await?;
        }

        Commands::DownloadStations => {
            let ctx = DownloadStationsContext::from_settings(&settings.download_stations)?;
            let summary = download_stations(&ctx).await?;
            for path in [summary.metadata_path, summary.status_path].into_iter().flatten() {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Aggregate => {
            let ctx = AggregateTripsContext::from_settings(&settings.aggregate_trips)?;
            let progress = ProgressReporter::new_spinner("Aggregating trips...", false);
            let summary = aggregate_trips(&ctx)?;
            progress.finish_with_message(&format!(
                "Aggregated {} of {} trips",
                summary.trips_cleaned, summary.trips_loaded
            ));

            println!(
                "Daily aggregates: {} rows -> {}",
                summary.daily_rows,
                summary.daily_path.display()
            );
            println!(
                "Hourly station aggregates: {} rows -> {}",
                summary.hourly_rows,
                summary.hourly_path.display()
            );
        }

        Commands::Plot {
            output_dir,
            stations,
            shade_start,
            shade_end,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| layout.figures_dir());
            let shade_hours = shade_start.zip(shade_end);
            let soi_file = settings.aggregate_trips.stations_of_interest_file.as_deref();

            let written = render_figures(&layout, &output_dir, &stations, shade_hours, soi_file)?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Info { sample } => {
            println!("\n{}", describe_aggregates(&layout, sample)?);
        }
    }

    Ok(())
}

/// Summary statistics of the aggregate tables followed by their first `sample` rows.
pub fn describe_aggregates(layout: &DataLayout, sample: usize) -> Result<String> {
    let processed = layout.processed_dir();
    let daily_path = processed.join(DAILY_AGGREGATES_FILE);
    let hourly_path = processed.join(HOURLY_AGGREGATES_FILE);

    let stats = AggregateAnalyzer::with_top_stations(sample).analyze_files(&daily_path, &hourly_path)?;
    let mut report = stats.summary();
    if sample == 0 {
        return Ok(report);
    }

    let reader = AggregateReader::with_limit(sample);
    report.push_str(&format!(
        "\n\nFirst {} daily rows:\n{}",
        sample,
        DailyAggregate::COLUMNS.join(",")
    ));
    for row in reader.read_daily(&daily_path)? {
        report.push_str(&format!("\n{},{}", row.date, row.trip_count));
    }

    if hourly_path.exists() {
        report.push_str(&format!(
            "\n\nFirst {} hourly station rows:\n{}",
            sample,
            HourlyStationAggregate::COLUMNS.join(",")
        ));
        for row in reader.read_hourly(&hourly_path)? {
            report.push_str(&format!(
                "\n{},{},{},{},{},{},{}",
                row.station_id, row.date, row.hour, row.member, row.ebike, row.pickups, row.dropoffs
            ));
        }
    }

    Ok(report)
}

/// Render the daily, weekly and station map charts into `output_dir`.
///
/// The daily table is required. The weekly profile and the map are skipped
/// with a warning when their inputs are missing.
pub fn render_figures(
    layout: &DataLayout,
    output_dir: &Path,
    stations: &[String],
    shade_hours: Option<(u32, u32)>,
    stations_of_interest_file: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let reader = AggregateReader::new();
    let processed = layout.processed_dir();
    let mut written = Vec::new();

    let daily = reader.read_daily(&processed.join(DAILY_AGGREGATES_FILE))?;
    let trips = daily_series(&daily);
    let weekly_mean = rolling_mean(&trips, 7);
    let daily_path = output_dir.join("daily_trips.svg");
    let options = ChartOptions {
        y_label: "Trips per day".to_string(),
        line_styles: Some(vec![LineStyle::Solid, LineStyle::Dashed]),
        ..ChartOptions::titled("Bluebikes daily trips")
    };
    plot_daily_longterm(
        &[
            Series::new("Trips", trips),
            Series::new("7-day mean", weekly_mean),
        ],
        &options,
        &daily_path,
    )?;
    written.push(daily_path);

    let hourly_path = processed.join(HOURLY_AGGREGATES_FILE);
    let hourly = if hourly_path.exists() {
        reader.read_hourly(&hourly_path)?
    } else {
        Vec::new()
    };
    if hourly.is_empty() {
        warn!("No hourly station aggregates, skipping weekly profile");
    } else {
        let filter = (!stations.is_empty()).then_some(stations);
        let profile = weekly_profile(&hourly, filter);
        let weekly_path = output_dir.join("weekly_profile.svg");
        let options = ChartOptions {
            y_label: "Mean trips per hour".to_string(),
            size: (1400, 600),
            ..ChartOptions::titled("Average week at stations of interest")
        };
        plot_hourly_weekly(
            &[
                Series::new(
                    "Pickups",
                    profile.iter().map(|p| (p.hour_of_week, p.pickups)).collect(),
                ),
                Series::new(
                    "Dropoffs",
                    profile.iter().map(|p| (p.hour_of_week, p.dropoffs)).collect(),
                ),
            ],
            &options,
            shade_hours,
            &weekly_path,
        )?;
        written.push(weekly_path);
    }

    match render_station_map(layout, output_dir, stations_of_interest_file) {
        Ok(path) => written.push(path),
        Err(e @ ProcessingError::MissingFile { .. }) | Err(e @ ProcessingError::EmptyInput(_)) => {
            warn!("Skipping station map: {}", e);
        }
        Err(e) => return Err(e),
    }

    Ok(written)
}

fn render_station_map(
    layout: &DataLayout,
    output_dir: &Path,
    stations_of_interest_file: Option<&str>,
) -> Result<PathBuf> {
    let stations = StationReader::new().read_stations(&layout.station_metadata_path())?;
    let points: Vec<MapPoint> = stations
        .iter()
        .filter_map(|s| {
            let (lat, lon) = s.coordinates()?;
            let key = s.short_name.as_deref().unwrap_or(s.station_id.as_str());
            Some(MapPoint::new(lat, lon).with_label(key).with_group_key(key))
        })
        .collect();

    let interest = match stations_of_interest_file {
        Some(file) => {
            let path = layout.raw_stations_dir().join(file);
            if path.exists() {
                read_stations_of_interest(&path)?
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    };

    let mut options = MapOptions {
        title: "Bluebikes stations".to_string(),
        ..Default::default()
    };
    if !interest.is_empty() {
        let others: Vec<String> = points
            .iter()
            .filter_map(|p| p.group_key.clone())
            .filter(|key| !interest.contains(key))
            .collect();
        options.group_values = Some(vec![others, interest]);
        options.colors = Some(vec!["#bababa".to_string(), "#d73027".to_string()]);
        options.marker_sizes = Some(vec![3, 6]);
        options.legend_labels = Some(vec![
            "Other stations".to_string(),
            "Stations of interest".to_string(),
        ]);
    }

    let path = output_dir.join("stations_map.svg");
    plot_points_on_map(&points, &options, &path)?;
    Ok(path)
}
