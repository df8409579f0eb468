use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = 5)]
    pub employee_id: i64,

    #[schema(example = "2026-08-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-08-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    #[schema(example = "sick")]
    pub leave_type: String,

    #[schema(example = "Flu")]
    pub reason: Option<String>,

    #[schema(example = "pending")]
    pub status: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
