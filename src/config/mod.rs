pub mod contexts;
pub mod settings;

pub use contexts::{
    validate_hourly_start_date, AggregateTripsContext, DataLayout, DownloadStationsContext,
    DownloadTripsContext,
};
pub use settings::{
    check_missing_keys, AggregateTripsSettings, DownloadStationsSettings, DownloadTripsSettings,
    Settings, StorageMode,
};
