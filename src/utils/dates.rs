// utils/dates.rs
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::errors::{AppError, Result};

/// Inclusive window of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimestampRange {
    pub start: i64,
    pub end: i64,
}

/// Provider day key, `YYYYMMDD`.
pub fn format_date_for_api<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y%m%d").to_string()
}

/// Today's and tomorrow's day keys on the local wall clock.
pub fn today_and_tomorrow() -> (String, String) {
    let now = Local::now();
    let tomorrow = now + Duration::hours(24);
    (format_date_for_api(&now), format_date_for_api(&tomorrow))
}

pub fn parse_day(day: &str) -> Result<NaiveDate> {
    if day.len() != 8 || !day.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::invalid_data(format!(
            "Invalid day '{}'. Expected YYYYMMDD",
            day
        )));
    }

    NaiveDate::parse_from_str(day, "%Y%m%d")
        .map_err(|_| AppError::invalid_data(format!("Invalid calendar day '{}'", day)))
}

/// `[00:00:00, 23:59:59]` of the given day in local time, as epoch seconds.
pub fn day_to_timestamp_range(day: &str) -> Result<TimestampRange> {
    let date = parse_day(day)?;

    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::invalid_data(format!("Invalid calendar day '{}'", day)))?;
    let end = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| AppError::invalid_data(format!("Invalid calendar day '{}'", day)))?;

    Ok(TimestampRange {
        start: local_epoch(start)?,
        end: local_epoch(end)?,
    })
}

fn local_epoch(naive: NaiveDateTime) -> Result<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| AppError::invalid_data(format!("{} does not exist in local time", naive)))
}
