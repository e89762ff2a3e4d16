use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bluebikes-processor")]
#[command(about = "Download, clean and aggregate Bluebikes trip and station data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        help = "Log file path [default: <data_dir>/logs/<task>.log]"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        default_value = "config.yaml",
        help = "YAML configuration file"
    )]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download monthly trip archives and extract them into raw/trips
    DownloadTrips,

    /// Download GBFS station metadata and/or a station status snapshot
    DownloadStations,

    /// Clean raw trips and write daily and hourly station aggregates
    Aggregate,

    /// Render SVG charts from the aggregate tables
    Plot {
        #[arg(
            short,
            long,
            help = "Output directory [default: <data_dir>/reports/figures]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(
            short,
            long = "station",
            help = "Restrict the weekly profile to these station ids (repeatable)"
        )]
        stations: Vec<String>,

        #[arg(long, requires = "shade_end", help = "First hour of the shaded daily window")]
        shade_start: Option<u32>,

        #[arg(long, requires = "shade_start", help = "End hour (exclusive) of the shaded window")]
        shade_end: Option<u32>,
    },

    /// Summarise the aggregate tables
    Info {
        #[arg(short, long, default_value = "5", help = "Number of busiest stations to list")]
        sample: usize,
    },
}

impl Commands {
    pub fn task_name(&self) -> &'static str {
        match self {
            Commands::DownloadTrips => "download_trips",
            Commands::DownloadStations => "download_stations",
            Commands::Aggregate => "aggregate_trips",
            Commands::Plot { .. } => "plot",
            Commands::Info { .. } => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plot_command() {
        let cli = Cli::try_parse_from([
            "bluebikes-processor",
            "--verbose",
            "plot",
            "--station",
            "A32000",
            "--station",
            "M32006",
            "--shade-start",
            "7",
            "--shade-end",
            "9",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        match cli.command {
            Commands::Plot {
                stations,
                shade_start,
                shade_end,
                output_dir,
            } => {
                assert_eq!(stations, vec!["A32000", "M32006"]);
                assert_eq!(shade_start, Some(7));
                assert_eq!(shade_end, Some(9));
                assert_eq!(output_dir, None);
            }
            _ => panic!("expected plot command"),
        }
    }

    #[test]
    fn test_shade_hours_come_in_pairs() {
        let result = Cli::try_parse_from(["bluebikes-processor", "plot", "--shade-start", "7"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_task_names() {
        let cli = Cli::try_parse_from(["bluebikes-processor", "aggregate"]).unwrap();
        assert_eq!(cli.command.task_name(), "aggregate_trips");
    }
}
