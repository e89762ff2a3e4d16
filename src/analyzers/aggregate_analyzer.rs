use crate::error::{ProcessingError, Result};
use crate::models::{DailyAggregate, HourlyStationAggregate};
use crate::readers::AggregateReader;
use crate::analyzers::profiles::station_totals;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug)]
pub struct AggregateStatistics {
    pub daily: DailyStatistics,
    pub hourly: Option<HourlyStatistics>,
}

#[derive(Debug)]
pub struct DailyStatistics {
    pub days: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub total_trips: u64,
    pub zero_days: usize,
    pub busiest_day: (NaiveDate, u64),
}

impl DailyStatistics {
    pub fn mean_per_day(&self) -> f64 {
        self.total_trips as f64 / self.days as f64
    }
}

#[derive(Debug)]
pub struct HourlyStatistics {
    pub records: usize,
    pub stations: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub pickups: u64,
    pub dropoffs: u64,
    pub member_pickups: u64,
    pub ebike_pickups: u64,
    pub top_stations: Vec<(String, u64, u64)>,
}

impl HourlyStatistics {
    pub fn member_percentage(&self) -> f64 {
        percentage(self.member_pickups, self.pickups)
    }

    pub fn ebike_percentage(&self) -> f64 {
        percentage(self.ebike_pickups, self.pickups)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub struct AggregateAnalyzer {
    top_n: usize,
}

impl AggregateAnalyzer {
    pub fn new() -> Self {
        Self { top_n: 5 }
    }

    pub fn with_top_stations(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Analyse the daily table, and the hourly table when it exists.
    pub fn analyze_files(&self, daily_path: &Path, hourly_path: &Path) -> Result<AggregateStatistics> {
        let reader = AggregateReader::new();
        let daily = reader.read_daily(daily_path)?;
        let hourly = if hourly_path.exists() {
            Some(reader.read_hourly(hourly_path)?)
        } else {
            None
        };

        self.analyze(&daily, hourly.as_deref())
    }

    pub fn analyze(
        &self,
        daily: &[DailyAggregate],
        hourly: Option<&[HourlyStationAggregate]>,
    ) -> Result<AggregateStatistics> {
        let daily = Self::daily_statistics(daily)?;
        let hourly = hourly
            .filter(|rows| !rows.is_empty())
            .map(|rows| self.hourly_statistics(rows));

        Ok(AggregateStatistics { daily, hourly })
    }

    fn daily_statistics(daily: &[DailyAggregate]) -> Result<DailyStatistics> {
        let (first, last) = match (daily.first(), daily.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(ProcessingError::EmptyInput(
                    "daily aggregates table has no rows".to_string(),
                ))
            }
        };

        let busiest = daily
            .iter()
            .max_by(|a, b| a.trip_count.cmp(&b.trip_count).then_with(|| b.date.cmp(&a.date)))
            .unwrap_or(first);

        Ok(DailyStatistics {
            days: daily.len(),
            date_range: (first.date, last.date),
            total_trips: daily.iter().map(|d| d.trip_count).sum(),
            zero_days: daily.iter().filter(|d| d.trip_count == 0).count(),
            busiest_day: (busiest.date, busiest.trip_count),
        })
    }

    fn hourly_statistics(&self, hourly: &[HourlyStationAggregate]) -> HourlyStatistics {
        let stations: BTreeSet<&str> = hourly.iter().map(|r| r.station_id.as_str()).collect();
        let min_date = hourly.iter().map(|r| r.date).min();
        let max_date = hourly.iter().map(|r| r.date).max();

        let mut top_stations = station_totals(hourly);
        top_stations.truncate(self.top_n);

        HourlyStatistics {
            records: hourly.len(),
            stations: stations.len(),
            date_range: (
                min_date.unwrap_or_default(),
                max_date.unwrap_or_default(),
            ),
            pickups: hourly.iter().map(|r| r.pickups).sum(),
            dropoffs: hourly.iter().map(|r| r.dropoffs).sum(),
            member_pickups: hourly.iter().filter(|r| r.member == 1).map(|r| r.pickups).sum(),
            ebike_pickups: hourly.iter().filter(|r| r.ebike == 1).map(|r| r.pickups).sum(),
            top_stations,
        }
    }
}

impl Default for AggregateAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateStatistics {
    pub fn summary(&self) -> String {
        let daily = &self.daily;
        let mut summary = format!(
            "Daily Aggregates\n\
            Date Range: {} to {} ({} days)\n\
            Trips: {} total, {:.1} per day\n\
            Busiest Day: {} ({} trips)\n\
            Days Without Trips: {}",
            daily.date_range.0,
            daily.date_range.1,
            daily.days,
            daily.total_trips,
            daily.mean_per_day(),
            daily.busiest_day.0,
            daily.busiest_day.1,
            daily.zero_days,
        );

        match &self.hourly {
            Some(hourly) => {
                summary.push_str(&format!(
                    "\n\nHourly Station Aggregates\n\
                    Records: {} across {} stations\n\
                    Date Range: {} to {}\n\
                    Pickups: {} ({:.1}% members, {:.1}% e-bikes)\n\
                    Dropoffs: {}",
                    hourly.records,
                    hourly.stations,
                    hourly.date_range.0,
                    hourly.date_range.1,
                    hourly.pickups,
                    hourly.member_percentage(),
                    hourly.ebike_percentage(),
                    hourly.dropoffs,
                ));

                if !hourly.top_stations.is_empty() {
                    summary.push_str("\nBusiest Stations (pickups / dropoffs):");
                    for (station, pickups, dropoffs) in &hourly.top_stations {
                        summary.push_str(&format!("\n- {}: {} / {}", station, pickups, dropoffs));
                    }
                }
            }
            None => summary.push_str("\n\nHourly Station Aggregates: none"),
        }

        summary
    }
}
