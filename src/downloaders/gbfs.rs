use crate::config::DownloadStationsContext;
use crate::downloaders::client::DownloadClient;
use crate::error::Result;
use crate::models::{StationMetadata, StationStatus};
use crate::utils::constants::{STATION_INFORMATION_FILE, UNKNOWN_REGION};
use crate::utils::logging::log_banner;
use crate::writers::CsvWriter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use validator::Validate;

/// GBFS envelope: every feed wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub struct GbfsFeed<T> {
    #[serde(default)]
    pub last_updated: Option<i64>,
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
pub struct StationInformationData {
    #[serde(default)]
    pub stations: Vec<StationInformationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StationInformationEntry {
    pub station_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub region_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SystemRegionsData {
    #[serde(default)]
    pub regions: Vec<RegionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RegionEntry {
    pub region_id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StationStatusData {
    #[serde(default)]
    pub stations: Vec<StationStatusEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StationStatusEntry {
    pub station_id: String,
    #[serde(default, deserialize_with = "int_or_bool")]
    pub is_installed: Option<i64>,
    #[serde(default, deserialize_with = "int_or_bool")]
    pub is_renting: Option<i64>,
    #[serde(default, deserialize_with = "int_or_bool")]
    pub is_returning: Option<i64>,
    #[serde(default)]
    pub num_bikes_available: Option<i64>,
    #[serde(default)]
    pub num_ebikes_available: Option<i64>,
    #[serde(default)]
    pub num_bikes_disabled: Option<i64>,
    #[serde(default)]
    pub num_docks_available: Option<i64>,
    #[serde(default)]
    pub num_docks_disabled: Option<i64>,
    #[serde(default)]
    pub num_scooters_available: Option<i64>,
    #[serde(default)]
    pub num_scooters_unavailable: Option<i64>,
    #[serde(default)]
    pub last_reported: Option<i64>,
}

/// Station flags are integers in GBFS 1.1 but booleans in later versions.
fn int_or_bool<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Int(i64),
        Bool(bool),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Int(value) => value,
        Flag::Bool(value) => i64::from(value),
    }))
}

impl From<StationInformationEntry> for StationMetadata {
    fn from(entry: StationInformationEntry) -> Self {
        StationMetadata {
            station_id: entry.station_id,
            name: entry.name,
            short_name: entry.short_name,
            lat: entry.lat,
            lon: entry.lon,
            capacity: entry.capacity,
            region_id: entry.region_id,
            region_name: None,
        }
    }
}

impl From<StationStatusEntry> for StationStatus {
    fn from(entry: StationStatusEntry) -> Self {
        StationStatus {
            station_id: entry.station_id,
            is_installed: entry.is_installed,
            is_renting: entry.is_renting,
            is_returning: entry.is_returning,
            num_bikes_available: entry.num_bikes_available,
            num_ebikes_available: entry.num_ebikes_available,
            num_bikes_disabled: entry.num_bikes_disabled,
            num_docks_available: entry.num_docks_available,
            num_docks_disabled: entry.num_docks_disabled,
            num_scooters_available: entry.num_scooters_available,
            num_scooters_unavailable: entry.num_scooters_unavailable,
            last_reported: entry.last_reported,
            num_conventional_available: 0,
        }
        .with_conventional_count()
    }
}

/// Convert the feed into metadata rows, skipping stations that fail validation.
pub fn parse_station_information(feed: GbfsFeed<StationInformationData>) -> Vec<StationMetadata> {
    let mut stations = Vec::with_capacity(feed.data.stations.len());
    for station in feed.data.stations.into_iter().map(StationMetadata::from) {
        match station.validate() {
            Ok(()) => stations.push(station),
            Err(e) => warn!("Skipping station '{}': {}", station.station_id, e),
        }
    }
    info!("Parsed {} stations", stations.len());
    stations
}

pub fn parse_system_regions(feed: GbfsFeed<SystemRegionsData>) -> HashMap<String, String> {
    let regions: HashMap<String, String> = feed
        .data
        .regions
        .into_iter()
        .map(|region| (region.region_id, region.name))
        .collect();
    info!("Parsed {} regions", regions.len());
    regions
}

/// Fill `region_name` from the regions map, `"Unknown"` when unmatched.
pub fn merge_regions(stations: &mut [StationMetadata], regions: &HashMap<String, String>) {
    for station in stations.iter_mut() {
        let name = station
            .region_id
            .as_ref()
            .and_then(|id| regions.get(id))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_REGION);
        station.region_name = Some(name.to_string());
    }
    info!("Merged region names into {} stations", stations.len());
}

pub fn parse_station_status(feed: GbfsFeed<StationStatusData>) -> Vec<StationStatus> {
    let statuses: Vec<StationStatus> = feed
        .data
        .stations
        .into_iter()
        .map(StationStatus::from)
        .collect();
    info!("Parsed status for {} stations", statuses.len());
    statuses
}

/// File name of a status snapshot taken at `at`, e.g. `station_status_250101_083000.csv`.
pub fn status_file_name(at: DateTime<Utc>) -> String {
    format!("station_status_{}.csv", at.format("%y%m%d_%H%M%S"))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationDownloadSummary {
    pub metadata_path: Option<PathBuf>,
    pub status_path: Option<PathBuf>,
}

/// Fetch or decode failures are logged and leave that part out.
pub async fn download_stations(ctx: &DownloadStationsContext) -> Result<StationDownloadSummary> {
    info!("Starting Bluebikes station data download");
    info!("Output directory: {}", ctx.stations_dir().display());

    let client = DownloadClient::new()?;
    let mut summary = StationDownloadSummary::default();

    if ctx.download_metadata {
        summary.metadata_path = download_metadata(ctx, &client).await?;
    }
    if ctx.download_status {
        summary.status_path = download_status(ctx, &client).await?;
    }

    info!("✓ Station data download completed");
    Ok(summary)
}

async fn download_metadata(
    ctx: &DownloadStationsContext,
    client: &DownloadClient,
) -> Result<Option<PathBuf>> {
    log_banner("Downloading station metadata");

    let information = match client
        .fetch_json::<GbfsFeed<StationInformationData>>(&ctx.station_information_url())
        .await
    {
        Ok(feed) => feed,
        Err(e) => {
            error!("Failed to fetch station information: {}", e);
            return Ok(None);
        }
    };

    let regions = match client
        .fetch_json::<GbfsFeed<SystemRegionsData>>(&ctx.system_regions_url())
        .await
    {
        Ok(feed) => feed,
        Err(e) => {
            error!("Failed to fetch system regions: {}", e);
            return Ok(None);
        }
    };

    let mut stations = parse_station_information(information);
    let regions = parse_system_regions(regions);
    merge_regions(&mut stations, &regions);

    let output_path = save_station_metadata(&stations, &ctx.stations_dir())?;
    if output_path.is_some() {
        log_banner("✓ Metadata download completed");
    }
    Ok(output_path)
}

/// Write `station_information.csv` into `dir`. Nothing is written for an empty list.
pub fn save_station_metadata(stations: &[StationMetadata], dir: &Path) -> Result<Option<PathBuf>> {
    if stations.is_empty() {
        warn!("No stations to save");
        return Ok(None);
    }

    let output_path = dir.join(STATION_INFORMATION_FILE);
    CsvWriter::new().write_table(&output_path, StationMetadata::COLUMNS, stations)?;
    info!("✓ Saved {} stations to {}", stations.len(), output_path.display());
    Ok(Some(output_path))
}

async fn download_status(
    ctx: &DownloadStationsContext,
    client: &DownloadClient,
) -> Result<Option<PathBuf>> {
    log_banner("Downloading station status");

    let feed = match client
        .fetch_json::<GbfsFeed<StationStatusData>>(&ctx.station_status_url())
        .await
    {
        Ok(feed) => feed,
        Err(e) => {
            error!("Failed to fetch station status: {}", e);
            return Ok(None);
        }
    };

    let statuses = parse_station_status(feed);
    if statuses.is_empty() {
        warn!("No status data to save");
        return Ok(None);
    }

    let output_path = ctx.stations_dir().join(status_file_name(Utc::now()));
    CsvWriter::new().write_table(&output_path, StationStatus::COLUMNS, &statuses)?;
    info!(
        "✓ Saved status for {} stations to {}",
        statuses.len(),
        output_path.display()
    );

    log_banner("✓ Status download completed");
    Ok(Some(output_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const STATION_INFORMATION: &str = r#"{
        "last_updated": 1700000000,
        "ttl": 5,
        "data": {
            "stations": [
                {"station_id": "a1", "name": "MIT at Mass Ave", "short_name": "M32006",
                 "lat": 42.3581, "lon": -71.0936, "capacity": 27, "region_id": "10",
                 "rental_uris": {"ios": "x"}},
                {"station_id": "b2", "name": "Mystery", "short_name": "Z1",
                 "lat": 42.3, "lon": -71.1, "capacity": 11, "region_id": "99"},
                {"station_id": "c3", "name": "No region"},
                {"station_id": "d4", "name": "Off the map", "short_name": "Q9",
                 "lat": 142.0, "lon": -71.1, "region_id": "10"}
            ]
        }
    }"#;

    const SYSTEM_REGIONS: &str = r#"{
        "data": {"regions": [{"region_id": "10", "name": "Cambridge"}]}
    }"#;

    const STATION_STATUS: &str = r#"{
        "data": {
            "stations": [
                {"station_id": "a1", "is_installed": 1, "is_renting": 1, "is_returning": 0,
                 "num_bikes_available": 7, "num_ebikes_available": 2,
                 "num_docks_available": 20, "last_reported": 1700000000},
                {"station_id": "b2", "is_installed": true, "is_renting": false,
                 "num_ebikes_available": 1}
            ]
        }
    }"#;

    #[test]
    fn test_parse_and_merge_regions() {
        let info: GbfsFeed<StationInformationData> =
            serde_json::from_str(STATION_INFORMATION).unwrap();
        let regions: GbfsFeed<SystemRegionsData> = serde_json::from_str(SYSTEM_REGIONS).unwrap();

        let mut stations = parse_station_information(info);
        let regions = parse_system_regions(regions);
        merge_regions(&mut stations, &regions);

        let region_names: Vec<Option<&str>> = stations
            .iter()
            .map(|s| s.region_name.as_deref())
            .collect();
        assert_eq!(
            region_names,
            vec![Some("Cambridge"), Some("Unknown"), Some("Unknown")]
        );
        assert_eq!(stations[0].short_name.as_deref(), Some("M32006"));
        assert_eq!(stations[0].capacity, Some(27));
        assert_eq!(stations[2].lat, None);
    }

    #[test]
    fn test_out_of_range_station_is_not_written() -> Result<()> {
        let info: GbfsFeed<StationInformationData> = serde_json::from_str(STATION_INFORMATION)?;
        let regions: GbfsFeed<SystemRegionsData> = serde_json::from_str(SYSTEM_REGIONS)?;

        let mut stations = parse_station_information(info);
        merge_regions(&mut stations, &parse_system_regions(regions));

        let dir = TempDir::new()?;
        let path = save_station_metadata(&stations, dir.path())?.unwrap();
        let contents = fs::read_to_string(path)?;

        assert_eq!(contents.lines().count(), 4);
        assert!(contents.contains("a1,MIT at Mass Ave,M32006"));
        assert!(!contents.contains("d4"));
        assert!(!contents.contains("Off the map"));

        Ok(())
    }

    #[test]
    fn test_empty_station_list_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        assert_eq!(save_station_metadata(&[], dir.path())?, None);
        assert!(!dir.path().join(STATION_INFORMATION_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_parse_station_status_derives_conventional_count() {
        let feed: GbfsFeed<StationStatusData> = serde_json::from_str(STATION_STATUS).unwrap();
        let statuses = parse_station_status(feed);

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].num_conventional_available, 5);
        assert_eq!(statuses[0].is_returning, Some(0));
        assert_eq!(statuses[1].is_installed, Some(1));
        assert_eq!(statuses[1].is_renting, Some(0));
        assert_eq!(statuses[1].num_bikes_available, None);
        assert_eq!(statuses[1].num_conventional_available, -1);
    }

    #[test]
    fn test_status_file_name_uses_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 5).unwrap();
        assert_eq!(status_file_name(at), "station_status_250102_083005.csv");
    }

    #[test]
    fn test_missing_data_section_is_an_error() {
        let result: std::result::Result<GbfsFeed<StationStatusData>, _> =
            serde_json::from_str(r#"{"last_updated": 1}"#);
        assert!(result.is_err());
    }
}
