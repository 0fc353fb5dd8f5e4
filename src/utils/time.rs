use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::{AppError, AppResult};

/// Parse an ISO 8601 timestamp. Values without an offset are read in `local`.
pub fn parse_timestamp(raw: &str, local: FixedOffset) -> AppResult<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| local.from_local_datetime(&naive).single())
        .ok_or_else(|| {
            AppError::Validation("Invalid time format. Please use ISO 8601 format.".to_string())
        })
}

/// Parse a wall-clock time of day given as `HH:MM:SS` or `HH:MM`.
pub fn parse_time_of_day(raw: &str) -> AppResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| {
            AppError::Validation(
                "Invalid time format for departure_time_of_day. Use HH:MM:SS.".to_string(),
            )
        })
}
