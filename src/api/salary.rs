use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::salary::{Salary, net_salary};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSalary {
    #[schema(example = 5)]
    pub employee_id: i64,

    #[schema(example = "2026-08-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub bonus: f64,

    #[schema(example = 2000.0)]
    pub deductions: f64,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateSalary {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,

    #[schema(example = 6000.0)]
    pub bonus: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SalaryQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 5)]
    pub employee_id: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct SalaryListResponse {
    pub data: Vec<Salary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const SALARY_COLUMNS: &str =
    "id, employee_id, month, base_salary, bonus, deductions, net_salary";

#[utoipa::path(
    post,
    path = "/api/salaries",
    request_body = CreateSalary,
    responses(
        (status = 201, description = "Salary record created", body = Salary),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn create_salary(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<CreateSalary>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let net = net_salary(payload.base_salary, payload.bonus, payload.deductions);

    let salary = sqlx::query_as::<_, Salary>(
        r#"
        INSERT INTO salaries
        (employee_id, month, base_salary, bonus, deductions, net_salary)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, employee_id, month, base_salary, bonus, deductions, net_salary
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.base_salary)
    .bind(payload.bonus)
    .bind(payload.deductions)
    .bind(net)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(salary))
}

#[utoipa::path(
    put,
    path = "/api/salaries/{salary_id}",
    request_body = UpdateSalary,
    params(("salary_id", Path, description = "Salary record ID")),
    responses(
        (status = 200, description = "Salary updated", body = Salary),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Salary record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn update_salary(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<UpdateSalary>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let salary_id = path.into_inner();

    let current = sqlx::query_as::<_, Salary>(&format!(
        "SELECT {SALARY_COLUMNS} FROM salaries WHERE id = $1"
    ))
    .bind(salary_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(current) = current else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Salary record not found"
        })));
    };

    let base_salary = body.base_salary.unwrap_or(current.base_salary);
    let bonus = body.bonus.unwrap_or(current.bonus);
    let deductions = body.deductions.unwrap_or(current.deductions);
    let net = net_salary(base_salary, bonus, deductions);

    let salary = sqlx::query_as::<_, Salary>(
        r#"
        UPDATE salaries
        SET base_salary = $1, bonus = $2, deductions = $3, net_salary = $4
        WHERE id = $5
        RETURNING id, employee_id, month, base_salary, bonus, deductions, net_salary
        "#,
    )
    .bind(base_salary)
    .bind(bonus)
    .bind(deductions)
    .bind(net)
    .bind(salary_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(salary))
}

#[utoipa::path(
    get,
    path = "/api/salaries/{salary_id}",
    params(("salary_id", Path, description = "Salary record ID")),
    responses(
        (status = 200, body = Salary),
        (status = 403, description = "Not your salary record"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_salary(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let salary_id = path.into_inner();

    let salary = sqlx::query_as::<_, Salary>(&format!(
        "SELECT {SALARY_COLUMNS} FROM salaries WHERE id = $1"
    ))
    .bind(salary_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(salary) = salary else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Salary record not found"
        })));
    };

    if !auth.can_view_employee(salary.employee_id) {
        return Err(ApiError::forbidden("You can only view your own salary records"));
    }

    Ok(HttpResponse::Ok().json(salary))
}

#[utoipa::path(
    get,
    path = "/api/salaries",
    params(SalaryQuery),
    responses(
        (status = 200, body = SalaryListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn list_salaries(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    query: web::Query<SalaryQuery>,
) -> Result<impl Responder, ApiError> {
    // Employees are scoped to their own records
    let scope_employee = if auth.is_employee() {
        Some(auth.linked_employee()?)
    } else {
        query.employee_id
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = ((page - 1) * per_page) as i64;

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM salaries WHERE 1=1");
    if let Some(emp_id) = scope_employee {
        count_qb.push(" AND employee_id = ").push_bind(emp_id);
    }

    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data_qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {SALARY_COLUMNS} FROM salaries WHERE 1=1"
    ));
    if let Some(emp_id) = scope_employee {
        data_qb.push(" AND employee_id = ").push_bind(emp_id);
    }
    data_qb
        .push(" ORDER BY month DESC LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let data = data_qb
        .build_query_as::<Salary>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(SalaryListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/salaries/{salary_id}",
    params(("salary_id", Path, description = "Salary record ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn delete_salary(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let salary_id = path.into_inner();

    let result = sqlx::query("DELETE FROM salaries WHERE id = $1")
        .bind(salary_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Salary record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Salary record deleted"
    })))
}
