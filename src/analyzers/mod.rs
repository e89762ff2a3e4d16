pub mod aggregate_analyzer;
pub mod profiles;

pub use aggregate_analyzer::{AggregateAnalyzer, AggregateStatistics};
pub use profiles::{daily_series, rolling_mean, station_totals, weekly_profile, WeeklyProfilePoint};
