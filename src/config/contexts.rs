use crate::config::settings::{
    AggregateTripsSettings, DownloadStationsSettings, DownloadTripsSettings, StorageMode,
};
use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    FIGURES_DIR, GBFS_BASE_URL, GBFS_LANGUAGE, GBFS_SUPPORTED_VERSION, GBFS_SYSTEM,
    HOURLY_MIN_START_DATE, LOGS_DIR, PROCESSED_DIR, RAW_STATIONS_DIR, RAW_TRIPS_DIR,
    STATION_INFORMATION_FILE,
};
use crate::utils::dates::{parse_iso_date, parse_year_month};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_trips_dir(&self) -> PathBuf {
        self.root.join(RAW_TRIPS_DIR)
    }

    pub fn raw_stations_dir(&self) -> PathBuf {
        self.root.join(RAW_STATIONS_DIR)
    }

    pub fn station_metadata_path(&self) -> PathBuf {
        self.raw_stations_dir().join(STATION_INFORMATION_FILE)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.root.join(FIGURES_DIR)
    }

    pub fn log_file(&self, task: &str) -> PathBuf {
        self.root.join(LOGS_DIR).join(format!("{}.log", task))
    }
}

#[derive(Debug, Clone)]
pub struct DownloadTripsContext {
    pub main_url: String,
    pub system_name: String,
    pub start_month: NaiveDate,
    pub end_month: NaiveDate,
    pub layout: DataLayout,
    pub storage: StorageMode,
}

impl DownloadTripsContext {
    pub fn new(
        main_url: &str,
        system_name: &str,
        start_date: &str,
        end_date: &str,
        layout: DataLayout,
        storage: StorageMode,
    ) -> Result<Self> {
        let start_month = parse_year_month(start_date, "start_date")?;
        let end_month = parse_year_month(end_date, "end_date")?;

        let main_url = if main_url.ends_with('/') {
            main_url.to_string()
        } else {
            format!("{}/", main_url)
        };

        Ok(Self {
            main_url,
            system_name: system_name.to_string(),
            start_month,
            end_month,
            layout,
            storage,
        })
    }

    pub fn from_settings(settings: &DownloadTripsSettings) -> Result<Self> {
        settings.check_required()?;
        let storage = StorageMode::from_setting(settings.output_storage.as_deref())?;
        let layout = DataLayout::new(storage.data_dir()?);

        Self::new(
            settings.main_url.as_deref().unwrap_or_default(),
            settings.system_name.as_deref().unwrap_or_default(),
            settings.start_date.as_deref().unwrap_or_default(),
            settings.end_date.as_deref().unwrap_or_default(),
            layout,
            storage,
        )
    }

    pub fn raw_trips_dir(&self) -> PathBuf {
        self.layout.raw_trips_dir()
    }

    /// Base file name of one month's archive, e.g. `202304-bluebikes-tripdata`.
    pub fn file_stem(&self, year_month: &str) -> String {
        format!("{}-{}-tripdata", year_month, self.system_name)
    }

    pub fn expected_csv_path(&self, year_month: &str) -> PathBuf {
        self.raw_trips_dir()
            .join(format!("{}.csv", self.file_stem(year_month)))
    }

    /// Candidate archive URLs for a month, preferred pattern first.
    pub fn candidate_urls(&self, year_month: &str) -> [String; 2] {
        let stem = self.file_stem(year_month);
        [
            format!("{}{}.zip", self.main_url, stem),
            format!("{}{}.csv.zip", self.main_url, stem),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct DownloadStationsContext {
    pub version: String,
    pub download_metadata: bool,
    pub download_status: bool,
    pub layout: DataLayout,
    pub storage: StorageMode,
}

impl DownloadStationsContext {
    pub fn new(
        version: &str,
        download_metadata: bool,
        download_status: bool,
        layout: DataLayout,
        storage: StorageMode,
    ) -> Result<Self> {
        validate_version(version)?;

        if !download_metadata && !download_status {
            return Err(ProcessingError::InvalidFormat(
                "At least one download option must be enabled.\n\
                 Set 'download_metadata: true' or 'download_status: true' in config.yaml"
                    .to_string(),
            ));
        }

        Ok(Self {
            version: version.to_string(),
            download_metadata,
            download_status,
            layout,
            storage,
        })
    }

    pub fn from_settings(settings: &DownloadStationsSettings) -> Result<Self> {
        let storage = StorageMode::from_setting(settings.output_storage.as_deref())?;
        let layout = DataLayout::new(storage.data_dir()?);

        Self::new(
            settings.version(),
            settings.download_metadata.unwrap_or(false),
            settings.download_status.unwrap_or(false),
            layout,
            storage,
        )
    }

    pub fn base_url(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            GBFS_BASE_URL, self.version, GBFS_SYSTEM, GBFS_LANGUAGE
        )
    }

    pub fn station_information_url(&self) -> String {
        format!("{}/station_information.json", self.base_url())
    }

    pub fn system_regions_url(&self) -> String {
        format!("{}/system_regions.json", self.base_url())
    }

    pub fn station_status_url(&self) -> String {
        format!("{}/station_status.json", self.base_url())
    }

    pub fn stations_dir(&self) -> PathBuf {
        self.layout.raw_stations_dir()
    }
}

fn validate_version(version: &str) -> Result<()> {
    if version == GBFS_SUPPORTED_VERSION {
        return Ok(());
    }

    Err(ProcessingError::InvalidFormat(format!(
        "Unsupported GBFS version: '{version}'\n\n\
         Currently, only version '{supported}' is supported for download and parsing.\n\
         Available GBFS versions can be found at:\n\
         {base}/{supported}/{system}/{lang}/gbfs_versions.json",
        version = version,
        supported = GBFS_SUPPORTED_VERSION,
        base = GBFS_BASE_URL,
        system = GBFS_SYSTEM,
        lang = GBFS_LANGUAGE,
    )))
}

#[derive(Debug, Clone)]
pub struct AggregateTripsContext {
    pub stations_of_interest_file: String,
    pub hourly_start_date: NaiveDate,
    pub layout: DataLayout,
    pub storage: StorageMode,
}

impl AggregateTripsContext {
    pub fn new(
        stations_of_interest_file: &str,
        hourly_start_date: &str,
        layout: DataLayout,
        storage: StorageMode,
    ) -> Result<Self> {
        let hourly_start_date = validate_hourly_start_date(hourly_start_date)?;

        let context = Self {
            stations_of_interest_file: stations_of_interest_file.to_string(),
            hourly_start_date,
            layout,
            storage,
        };

        let stations_path = context.stations_of_interest_path();
        if !stations_path.exists() {
            return Err(ProcessingError::missing_file(
                &stations_path,
                "Please create this file with a JSON list of station short_name IDs.",
            ));
        }

        Ok(context)
    }

    pub fn from_settings(settings: &AggregateTripsSettings) -> Result<Self> {
        settings.check_required()?;
        let storage = StorageMode::from_setting(settings.output_storage.as_deref())?;
        let layout = DataLayout::new(storage.data_dir()?);

        Self::new(
            settings.stations_of_interest_file.as_deref().unwrap_or_default(),
            settings.hourly_start_date(),
            layout,
            storage,
        )
    }

    pub fn raw_trips_dir(&self) -> PathBuf {
        self.layout.raw_trips_dir()
    }

    pub fn raw_stations_dir(&self) -> PathBuf {
        self.layout.raw_stations_dir()
    }

    pub fn stations_of_interest_path(&self) -> PathBuf {
        self.raw_stations_dir().join(&self.stations_of_interest_file)
    }

    pub fn station_metadata_path(&self) -> PathBuf {
        self.layout.station_metadata_path()
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.layout.processed_dir()
    }
}

/// Parse `hourly_start_date` and enforce the station id cut-over date.
pub fn validate_hourly_start_date(value: &str) -> Result<NaiveDate> {
    let date = parse_iso_date(value, "hourly_start_date")?;
    let min_date = parse_iso_date(HOURLY_MIN_START_DATE, "hourly_start_date")?;

    if date < min_date {
        return Err(ProcessingError::InvalidFormat(format!(
            "hourly_start_date must be {} or later (new station ID system), got '{}'",
            HOURLY_MIN_START_DATE, value
        )));
    }

    Ok(date)
}
