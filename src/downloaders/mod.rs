pub mod client;
pub mod gbfs;
pub mod trips;

pub use client::DownloadClient;
pub use gbfs::{download_stations, StationDownloadSummary};
pub use trips::{download_trips, DownloadStatus, DownloadSummary};
