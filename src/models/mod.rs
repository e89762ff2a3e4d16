pub mod aggregates;
pub mod station;
pub mod trip;

pub use aggregates::{DailyAggregate, HourlyKey, HourlyStationAggregate};
pub use station::{StationMetadata, StationStatus};
pub use trip::{CleanedTrip, TripRecord};
