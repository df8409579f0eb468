use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Salary {
    pub id: i64,
    pub employee_id: i64,

    #[schema(example = "2026-08-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_salary: f64,
}

/// Net pay is always derived server-side, never trusted from the client.
pub fn net_salary(base_salary: f64, bonus: f64, deductions: f64) -> f64 {
    base_salary + bonus - deductions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_is_base_plus_bonus_minus_deductions() {
        assert_eq!(net_salary(50_000.0, 5_000.0, 2_000.0), 53_000.0);
        assert_eq!(net_salary(50_000.0, 0.0, 0.0), 50_000.0);
    }
}
