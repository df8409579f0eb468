use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::ApiError;

/// One row per employee per calendar day. `check-in`, `check-out` and
/// `absent` are reachable through the normal flow; the remaining statuses
/// only ever appear via the manager/admin correction path.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    CheckIn,
    CheckOut,
    Absent,
    Present,
    Late,
    OnLeave,
    HalfDay,
}

impl AttendanceStatus {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        AttendanceStatus::from_str(value)
            .map_err(|_| ApiError::invalid_argument("Invalid status value"))
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = 5)]
    pub employee_id: i64,

    #[schema(example = "2026-08-07", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "2026-08-07T09:00:00Z", value_type = String, format = "date-time")]
    pub check_in: Option<DateTime<Utc>>,

    #[schema(example = "2026-08-07T17:30:00Z", value_type = String, format = "date-time")]
    pub check_out: Option<DateTime<Utc>>,

    #[schema(example = "check-out")]
    pub status: String,

    #[schema(example = 8.5)]
    pub hours_worked: Option<f64>,

    pub corrected_by: Option<i64>,

    pub correction_reason: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub correction_time: Option<DateTime<Utc>>,
}

impl Attendance {
    fn parsed_status(&self) -> Option<AttendanceStatus> {
        AttendanceStatus::from_str(&self.status).ok()
    }
}

/// Worked hours between two timestamps, rounded to 2 decimals.
pub fn hours_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    let ms = (check_out - check_in).num_milliseconds() as f64;
    (ms / 3_600_000.0 * 100.0).round() / 100.0
}

/// First attendance action of the day wins: an existing row of any terminal
/// or in-progress status blocks a new check-in.
pub fn ensure_can_check_in(existing: Option<&Attendance>) -> Result<(), ApiError> {
    let Some(record) = existing else {
        return Ok(());
    };

    match record.parsed_status() {
        Some(AttendanceStatus::Absent) => {
            Err(ApiError::conflict("You are marked absent today"))
        }
        Some(AttendanceStatus::CheckIn) | Some(AttendanceStatus::CheckOut) => {
            Err(ApiError::conflict("Already checked in today"))
        }
        // Corrected statuses (present/late/...) also occupy the day's slot.
        Some(_) | None => Err(ApiError::conflict("Attendance already marked for today")),
    }
}

/// Check-out requires an open check-in. Returns the open record so the
/// caller can derive hours from its `check_in` timestamp.
pub fn ensure_can_check_out(existing: Option<&Attendance>) -> Result<&Attendance, ApiError> {
    let Some(record) = existing else {
        return Err(ApiError::invalid_transition(
            "Check-in first before check-out",
        ));
    };

    match record.parsed_status() {
        Some(AttendanceStatus::Absent) => {
            Err(ApiError::invalid_transition("You are marked absent today"))
        }
        Some(AttendanceStatus::CheckOut) => {
            Err(ApiError::invalid_transition("Already checked out today"))
        }
        Some(AttendanceStatus::CheckIn) if record.check_in.is_some() => Ok(record),
        _ => Err(ApiError::invalid_transition(
            "Check-in first before check-out",
        )),
    }
}

pub fn ensure_can_mark_absent(existing: Option<&Attendance>) -> Result<(), ApiError> {
    if existing.is_some() {
        return Err(ApiError::conflict("Attendance already marked for today"));
    }
    Ok(())
}

/// Field values a correction writes, after normalization.
#[derive(Debug, PartialEq)]
pub struct Correction {
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub hours_worked: Option<f64>,
}

/// An `absent` correction wipes both timestamps no matter what was supplied.
/// A non-absent correction recomputes hours only when both timestamps are
/// present and ordered; otherwise hours stay NULL.
pub fn normalize_correction(
    status: AttendanceStatus,
    check_in: Option<DateTime<Utc>>,
    check_out: Option<DateTime<Utc>>,
) -> Result<Correction, ApiError> {
    if status == AttendanceStatus::Absent {
        return Ok(Correction {
            check_in: None,
            check_out: None,
            hours_worked: None,
        });
    }

    let hours_worked = match (check_in, check_out) {
        (Some(start), Some(end)) => {
            if end <= start {
                return Err(ApiError::invalid_argument(
                    "check_out must be after check_in",
                ));
            }
            Some(hours_between(start, end))
        }
        _ => None,
    };

    Ok(Correction {
        check_in,
        check_out,
        hours_worked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, h, m, 0).unwrap()
    }

    fn record(status: &str, check_in: Option<DateTime<Utc>>) -> Attendance {
        Attendance {
            id: 1,
            employee_id: 5,
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            check_in,
            check_out: None,
            status: status.to_string(),
            hours_worked: None,
            corrected_by: None,
            correction_reason: None,
            correction_time: None,
        }
    }

    #[test]
    fn full_day_rounds_to_two_decimals() {
        assert_eq!(hours_between(ts(9, 0), ts(17, 30)), 8.5);
        assert_eq!(hours_between(ts(9, 0), ts(17, 0)), 8.0);
        // 7 minutes = 0.11666... hours
        assert_eq!(hours_between(ts(9, 0), ts(9, 7)), 0.12);
    }

    #[test]
    fn check_in_on_a_clean_day_is_allowed() {
        assert!(ensure_can_check_in(None).is_ok());
    }

    #[test]
    fn second_check_in_conflicts() {
        let existing = record("check-in", Some(ts(9, 0)));
        let err = ensure_can_check_in(Some(&existing)).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn check_in_after_absent_conflicts() {
        let existing = record("absent", None);
        let err = ensure_can_check_in(Some(&existing)).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn check_out_without_check_in_is_invalid() {
        let err = ensure_can_check_out(None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition(_)));
    }

    #[test]
    fn check_out_after_absent_is_invalid() {
        let existing = record("absent", None);
        let err = ensure_can_check_out(Some(&existing)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition(_)));
    }

    #[test]
    fn double_check_out_is_invalid() {
        let existing = record("check-out", Some(ts(9, 0)));
        let err = ensure_can_check_out(Some(&existing)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition(_)));
    }

    #[test]
    fn open_check_in_allows_check_out() {
        let existing = record("check-in", Some(ts(9, 0)));
        let open = ensure_can_check_out(Some(&existing)).unwrap();
        assert_eq!(open.check_in, Some(ts(9, 0)));
    }

    #[test]
    fn absent_only_on_a_clean_day() {
        assert!(ensure_can_mark_absent(None).is_ok());

        let existing = record("check-in", Some(ts(9, 0)));
        let err = ensure_can_mark_absent(Some(&existing)).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn absent_correction_forces_nulls() {
        let fixed =
            normalize_correction(AttendanceStatus::Absent, Some(ts(9, 0)), Some(ts(17, 0)))
                .unwrap();
        assert_eq!(
            fixed,
            Correction {
                check_in: None,
                check_out: None,
                hours_worked: None
            }
        );
    }

    #[test]
    fn correction_with_both_times_recomputes_hours() {
        let fixed =
            normalize_correction(AttendanceStatus::Present, Some(ts(9, 0)), Some(ts(17, 30)))
                .unwrap();
        assert_eq!(fixed.hours_worked, Some(8.5));
    }

    #[test]
    fn correction_with_one_time_leaves_hours_null() {
        let fixed = normalize_correction(AttendanceStatus::Late, Some(ts(9, 45)), None).unwrap();
        assert_eq!(fixed.check_in, Some(ts(9, 45)));
        assert_eq!(fixed.hours_worked, None);
    }

    #[test]
    fn correction_with_reversed_times_is_rejected() {
        let err = normalize_correction(AttendanceStatus::Present, Some(ts(17, 0)), Some(ts(9, 0)))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn status_parsing_covers_the_full_enumeration() {
        for raw in ["check-in", "check-out", "absent", "present", "late", "on-leave", "half-day"] {
            assert!(AttendanceStatus::parse(raw).is_ok(), "{raw} should parse");
        }
        assert!(AttendanceStatus::parse("vacationing").is_err());
    }
}
