use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PerformanceReview {
    pub id: i64,
    pub employee_id: i64,
    pub reviewer_id: Option<i64>,

    #[schema(example = "2026-06-30", value_type = String, format = "date")]
    pub review_date: NaiveDate,

    /// 1 (poor) to 5 (outstanding)
    #[schema(example = 4)]
    pub rating: i16,

    pub comments: Option<String>,
}
