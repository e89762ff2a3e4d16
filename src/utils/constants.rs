/// Trip schema: legacy column name -> canonical column name
pub const TRIP_COLUMN_MAPPING: &[(&str, &str)] = &[
    ("starttime", "started_at"),
    ("stoptime", "ended_at"),
    ("start station id", "start_station_id"),
    ("end station id", "end_station_id"),
    ("start station latitude", "start_lat"),
    ("start station longitude", "start_lng"),
    ("end station latitude", "end_lat"),
    ("end station longitude", "end_lng"),
    ("usertype", "member_casual"),
];

/// Canonical trip columns, in output order
pub const TRIP_COLUMNS: &[&str] = &[
    "started_at",
    "ended_at",
    "start_station_id",
    "end_station_id",
    "start_lat",
    "start_lng",
    "end_lat",
    "end_lng",
    "member_casual",
    "rideable_type",
];

/// Categorical values
pub const MEMBER_USER_TYPE: &str = "member";
pub const EBIKE_RIDEABLE_TYPE: &str = "electric_bike";
pub const MAINTENANCE_STATION_PREFIX: &str = "X";

/// Trip duration constraints (minutes)
pub const MIN_TRIP_MINUTES: f64 = 1.0;
pub const MAX_TRIP_MINUTES: f64 = 120.0;
pub const FALSE_START_MINUTES: f64 = 3.0;

pub const HOURS_PER_WEEK: usize = 168;

/// Earliest valid hourly aggregation date (new station id scheme)
pub const HOURLY_MIN_START_DATE: &str = "2023-04-01";

/// Directory names, relative to the data directory
pub const RAW_TRIPS_DIR: &str = "raw/trips";
pub const RAW_STATIONS_DIR: &str = "raw/stations";
pub const PROCESSED_DIR: &str = "interim/trip_aggregates";
pub const FIGURES_DIR: &str = "reports/figures";
pub const LOGS_DIR: &str = "logs";

/// File names
pub const STATION_INFORMATION_FILE: &str = "station_information.csv";
pub const DAILY_AGGREGATES_FILE: &str = "daily_aggregates.csv";
pub const HOURLY_AGGREGATES_FILE: &str = "hourly_station_aggregates.csv";

/// Storage modes
pub const STORAGE_LOCAL: &str = "local";
pub const STORAGE_DRIVE: &str = "drive";
pub const VALID_STORAGES: &[&str] = &[STORAGE_LOCAL, STORAGE_DRIVE];

/// Environment variables for data directories
pub const LOCAL_DATA_DIR_ENV: &str = "LOCAL_DATA_DIR";
pub const DRIVE_DATA_DIR_ENV: &str = "DRIVE_DATA_DIR";
pub const DEFAULT_LOCAL_DATA_DIR: &str = "data";

/// GBFS feed
pub const GBFS_BASE_URL: &str = "https://gbfs.lyft.com/gbfs";
pub const GBFS_SYSTEM: &str = "bos";
pub const GBFS_LANGUAGE: &str = "en";
pub const GBFS_SUPPORTED_VERSION: &str = "1.1";
pub const UNKNOWN_REGION: &str = "Unknown";

/// HTTP timeouts (seconds)
pub const HEAD_TIMEOUT_SECS: u64 = 10;
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
