use crate::error::{ProcessingError, Result};
use crate::models::{CleanedTrip, DailyAggregate};
use crate::utils::dates::date_range;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// System-wide trip counts per calendar day, with empty days filled in.
pub struct DailyAggregator;

impl DailyAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, trips: &[CleanedTrip]) -> Result<Vec<DailyAggregate>> {
        let counts = Self::count_by_date(trips);

        let (min_date, max_date) = match (counts.keys().next(), counts.keys().next_back()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => {
                return Err(ProcessingError::EmptyInput(
                    "no cleaned trips remain, cannot derive a date range".to_string(),
                ))
            }
        };

        let aggregates: Vec<DailyAggregate> = date_range(min_date, max_date)
            .map(|date| DailyAggregate::new(date, counts.get(&date).copied().unwrap_or(0)))
            .collect();

        let empty_days = aggregates.iter().filter(|a| a.trip_count == 0).count();
        info!(
            "Daily aggregates: {} days ({} with no trips), {} to {}",
            aggregates.len(),
            empty_days,
            min_date,
            max_date
        );

        Ok(aggregates)
    }

    fn count_by_date(trips: &[CleanedTrip]) -> BTreeMap<NaiveDate, u64> {
        let mut counts = BTreeMap::new();
        for date in trips.iter().filter_map(|t| t.trip.start_date()) {
            *counts.entry(date).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for DailyAggregator {
    fn default() -> Self {
        Self::new()
    }
}
