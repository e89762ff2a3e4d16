pub mod daily_aggregator;
pub mod hourly_aggregator;
pub mod pipeline;
pub mod trip_cleaner;

pub use daily_aggregator::DailyAggregator;
pub use hourly_aggregator::HourlyStationAggregator;
pub use pipeline::{aggregate_trips, AggregationSummary};
pub use trip_cleaner::{CleaningReport, TripCleaner};
