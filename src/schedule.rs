use crate::models::Show;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid start time {0:?}")]
    InvalidTimeInput(String),
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Shows starting exactly at `reference` count as upcoming.
pub fn is_upcoming(show: &Show, reference: NaiveDateTime) -> bool {
    show.start_time >= reference
}

/// Splits `shows` into `(past, upcoming)`, keeping input order in both halves.
pub fn classify(shows: &[Show], reference: NaiveDateTime) -> (Vec<&Show>, Vec<&Show>) {
    shows.iter().partition(|show| !is_upcoming(show, reference))
}

pub fn parse_start_time(input: &str) -> Result<NaiveDateTime, ScheduleError> {
    let input = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ScheduleError::InvalidTimeInput(input.to_string()))
}
