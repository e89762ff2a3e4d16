use serde::{Deserialize, Serialize};
use validator::Validate;

/// One row of `station_information.csv`: GBFS station information with the
/// region name merged in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[validate(length(min = 1))]
    pub station_id: String,

    pub name: Option<String>,

    /// Legacy/alternate identifier, used by trip files since the 2023 id change.
    pub short_name: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,

    pub capacity: Option<u32>,

    pub region_id: Option<String>,

    pub region_name: Option<String>,
}

impl StationMetadata {
    pub const COLUMNS: &'static [&'static str] = &[
        "station_id",
        "name",
        "short_name",
        "lat",
        "lon",
        "capacity",
        "region_id",
        "region_name",
    ];

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

/// One row of a `station_status_<timestamp>.csv` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationStatus {
    pub station_id: String,
    pub is_installed: Option<i64>,
    pub is_renting: Option<i64>,
    pub is_returning: Option<i64>,
    pub num_bikes_available: Option<i64>,
    pub num_ebikes_available: Option<i64>,
    pub num_bikes_disabled: Option<i64>,
    pub num_docks_available: Option<i64>,
    pub num_docks_disabled: Option<i64>,
    pub num_scooters_available: Option<i64>,
    pub num_scooters_unavailable: Option<i64>,
    pub last_reported: Option<i64>,
    #[serde(default)]
    pub num_conventional_available: i64,
}

impl StationStatus {
    pub const COLUMNS: &'static [&'static str] = &[
        "station_id",
        "is_installed",
        "is_renting",
        "is_returning",
        "num_bikes_available",
        "num_ebikes_available",
        "num_bikes_disabled",
        "num_docks_available",
        "num_docks_disabled",
        "num_scooters_available",
        "num_scooters_unavailable",
        "last_reported",
        "num_conventional_available",
    ];

    /// Fill the derived conventional bike count. Missing counts are taken as zero.
    pub fn with_conventional_count(mut self) -> Self {
        let bikes = self.num_bikes_available.unwrap_or(0);
        let ebikes = self.num_ebikes_available.unwrap_or(0);
        self.num_conventional_available = bikes - ebikes;
        self
    }
}
