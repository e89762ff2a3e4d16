pub mod aggregate_reader;
pub mod station_reader;
pub mod stations_of_interest;
pub mod trip_reader;

pub use aggregate_reader::AggregateReader;
pub use station_reader::StationReader;
pub use stations_of_interest::{parse_stations_of_interest, read_stations_of_interest};
pub use trip_reader::{TripFileStats, TripReader};
