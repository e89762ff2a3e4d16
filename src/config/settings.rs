use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_LOCAL_DATA_DIR, DRIVE_DATA_DIR_ENV, GBFS_SUPPORTED_VERSION, HOURLY_MIN_START_DATE,
    LOCAL_DATA_DIR_ENV, STORAGE_DRIVE, STORAGE_LOCAL, VALID_STORAGES,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    #[default]
    Local,
    Drive,
}

impl StorageMode {
    /// Parse an optional `output_storage` value, defaulting to local.
    pub fn from_setting(value: Option<&str>) -> Result<Self> {
        value.map(str::parse).unwrap_or(Ok(StorageMode::Local))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match self {
            StorageMode::Local => Ok(std::env::var_os(LOCAL_DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_DATA_DIR))),
            StorageMode::Drive => std::env::var_os(DRIVE_DATA_DIR_ENV)
                .map(PathBuf::from)
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "{} not configured. Check .env file or use '{}' storage.",
                        DRIVE_DATA_DIR_ENV, STORAGE_LOCAL
                    ))
                }),
        }
    }
}

impl FromStr for StorageMode {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            STORAGE_LOCAL => Ok(StorageMode::Local),
            STORAGE_DRIVE => Ok(StorageMode::Drive),
            other => Err(ProcessingError::InvalidFormat(format!(
                "output_storage must be one of {:?}, got '{}'",
                VALID_STORAGES, other
            ))),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local => write!(f, "{}", STORAGE_LOCAL),
            StorageMode::Drive => write!(f, "{}", STORAGE_DRIVE),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DownloadTripsSettings {
    #[validate(url)]
    pub main_url: Option<String>,
    #[validate(length(min = 1))]
    pub system_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub output_storage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DownloadStationsSettings {
    #[validate(length(min = 1))]
    pub version: Option<String>,
    pub download_metadata: Option<bool>,
    pub download_status: Option<bool>,
    pub output_storage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AggregateTripsSettings {
    #[validate(length(min = 1))]
    pub stations_of_interest_file: Option<String>,
    pub hourly_start_date: Option<String>,
    pub output_storage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub download_trips: DownloadTripsSettings,
    #[serde(default)]
    pub download_stations: DownloadStationsSettings,
    #[serde(default)]
    pub aggregate_trips: AggregateTripsSettings,
}

impl Settings {
    /// Load settings from a YAML file, with `BLUEBIKES__SECTION__KEY`
    /// environment variables taking precedence.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("BLUEBIKES")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Parse settings from a YAML string. Used by tests and embedded defaults.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(contents, config::FileFormat::Yaml))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Fail with the list of required keys that have no value.
pub fn check_missing_keys(section: &str, keys: &[(&str, bool)]) -> Result<()> {
    let missing: Vec<&str> = keys
        .iter()
        .filter(|(_, present)| !present)
        .map(|(key, _)| *key)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProcessingError::InvalidFormat(format!(
            "Missing required config keys in '{}': {}",
            section,
            missing.join(", ")
        )))
    }
}

impl DownloadTripsSettings {
    pub fn check_required(&self) -> Result<()> {
        self.validate()?;
        check_missing_keys(
            "download_trips",
            &[
                ("main_url", self.main_url.is_some()),
                ("system_name", self.system_name.is_some()),
                ("start_date", self.start_date.is_some()),
                ("end_date", self.end_date.is_some()),
            ],
        )
    }
}

impl DownloadStationsSettings {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(GBFS_SUPPORTED_VERSION)
    }
}

impl AggregateTripsSettings {
    pub fn check_required(&self) -> Result<()> {
        self.validate()?;
        check_missing_keys(
            "aggregate_trips",
            &[(
                "stations_of_interest_file",
                self.stations_of_interest_file.is_some(),
            )],
        )
    }

    pub fn hourly_start_date(&self) -> &str {
        self.hourly_start_date
            .as_deref()
            .unwrap_or(HOURLY_MIN_START_DATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
download_trips:
  main_url: "https://s3.amazonaws.com/hubway-data/"
  system_name: bluebikes
  start_date: 202304
  end_date: "202306"
download_stations:
  download_metadata: true
aggregate_trips:
  stations_of_interest_file: stations_of_interest.json
  output_storage: local
"#;

    #[test]
    fn test_parse_sections() {
        let settings = Settings::from_yaml(SAMPLE).unwrap();

        assert_eq!(settings.download_trips.system_name.as_deref(), Some("bluebikes"));
        assert_eq!(settings.download_trips.start_date.as_deref(), Some("202304"));
        assert_eq!(settings.download_stations.download_metadata, Some(true));
        assert_eq!(settings.download_stations.download_status, None);
        assert_eq!(settings.download_stations.version(), "1.1");
        assert_eq!(settings.aggregate_trips.hourly_start_date(), "2023-04-01");
        assert!(settings.download_trips.check_required().is_ok());
        assert!(settings.aggregate_trips.check_required().is_ok());
    }

    #[test]
    fn test_missing_required_keys_are_listed() {
        let settings = Settings::from_yaml("download_trips:\n  system_name: bluebikes\n").unwrap();

        match settings.download_trips.check_required() {
            Err(ProcessingError::InvalidFormat(msg)) => {
                assert!(msg.contains("main_url"));
                assert!(msg.contains("start_date"));
                assert!(msg.contains("end_date"));
                assert!(!msg.contains("system_name"));
            }
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_section_defaults() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert!(settings.aggregate_trips.check_required().is_err());
    }

    #[test]
    fn test_storage_mode_parsing() {
        assert_eq!(StorageMode::from_setting(None).unwrap(), StorageMode::Local);
        assert_eq!(
            StorageMode::from_setting(Some("drive")).unwrap(),
            StorageMode::Drive
        );
        assert!(matches!(
            StorageMode::from_setting(Some("s3")),
            Err(ProcessingError::InvalidFormat(_))
        ));
        assert_eq!(StorageMode::Drive.to_string(), "drive");
    }
}
