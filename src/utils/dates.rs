use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

use crate::error::{ProcessingError, Result};

/// Timestamp layouts seen across the trip archive, most common first.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Parse a trip timestamp, returning `None` for anything unrecognised.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_matches('"');
    if value.is_empty() {
        return None;
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn parse_iso_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ProcessingError::InvalidFormat(format!(
            "{} must be in YYYY-MM-DD format, got '{}'",
            field, value
        ))
    })
}

/// Parse a `YYYYMM` month into its first day.
pub fn parse_year_month(value: &str, field: &str) -> Result<NaiveDate> {
    let invalid = || {
        ProcessingError::InvalidFormat(format!("{} must be YYYYMM format, got '{}'", field, value))
    };

    if value.len() != 6 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let year: i32 = value[..4].parse().map_err(|_| invalid())?;
    let month: u32 = value[4..].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

/// Inclusive list of `YYYYMM` strings between two months.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let mut months = Vec::new();
    let mut current = NaiveDate::from_ymd_opt(start.year(), start.month(), 1);

    while let Some(month) = current {
        if month > end {
            break;
        }
        months.push(month.format("%Y%m").to_string());
        current = month.checked_add_months(Months::new(1));
    }

    months
}

pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 1)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2023-04-01 08:05:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-04-01 08:05:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2023-04-01T08:05:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-04-01 08:05"), Some(expected));
        assert_eq!(parse_timestamp("04/01/2023 08:05"), Some(expected));
        assert_eq!(parse_timestamp("\"2023-04-01 08:05:00\""), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_fractional_seconds() {
        let parsed = parse_timestamp("2015-01-01 00:21:44.1230").unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2023-13-01 08:00:00"), None);
    }

    #[test]
    fn test_parse_year_month() {
        assert_eq!(
            parse_year_month("202304", "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
        );
        assert!(parse_year_month("2023-04", "start_date").is_err());
        assert!(parse_year_month("202313", "start_date").is_err());
        assert!(parse_year_month("20234", "start_date").is_err());
    }

    #[test]
    fn test_month_range_crosses_year() {
        let start = parse_year_month("202311", "start").unwrap();
        let end = parse_year_month("202402", "end").unwrap();

        assert_eq!(
            month_range(start, end),
            vec!["202311", "202312", "202401", "202402"]
        );
    }

    #[test]
    fn test_month_range_empty_when_reversed() {
        let start = parse_year_month("202402", "start").unwrap();
        let end = parse_year_month("202311", "end").unwrap();
        assert!(month_range(start, end).is_empty());
    }

    #[test]
    fn test_date_range_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days: Vec<NaiveDate> = date_range(start, end).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
