use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::ApiError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        TaskStatus::from_str(value).map_err(|_| ApiError::invalid_argument("Invalid task status"))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        TaskPriority::from_str(value)
            .map_err(|_| ApiError::invalid_argument("Invalid task priority"))
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = 5)]
    pub employee_id: i64,

    pub assigned_by: Option<i64>,

    #[schema(example = "Prepare quarterly report")]
    pub title: String,

    pub description: Option<String>,

    #[schema(example = "medium")]
    pub priority: String,

    #[schema(example = "2026-08-14", value_type = String, format = "date")]
    pub due_date: NaiveDate,

    #[schema(example = "assigned")]
    pub status: String,

    /// Accumulated working time in whole seconds
    #[schema(example = 5400)]
    pub time_spent: i64,

    #[schema(value_type = String, format = "date-time")]
    pub timer_started_at: Option<DateTime<Utc>>,
}

/// Whole seconds to add to the accumulator when a running timer stops.
pub fn elapsed_seconds(started_at: DateTime<Utc>, stopped_at: DateTime<Utc>) -> i64 {
    (stopped_at - started_at).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn elapsed_counts_whole_seconds() {
        let start = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2026, 8, 7, 11, 30, 15).unwrap();
        assert_eq!(elapsed_seconds(start, stop), 5415);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let start = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap();
        assert_eq!(elapsed_seconds(start, stop), 0);
    }

    #[test]
    fn status_strings_round_trip() {
        assert_eq!(TaskStatus::parse("in_progress").unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
        assert!(TaskStatus::parse("paused").is_err());
    }
}
