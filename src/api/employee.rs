use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::employee::Employee;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateEmployee {
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "Backend Engineer")]
    pub position: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 5)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

const EMPLOYEE_COLUMNS: &str =
    "id, first_name, last_name, email, position, department, hire_date, status";

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 403, description = "Admin only"),
        (status = 400, description = "Duplicate email")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        INSERT INTO employees
        (first_name, last_name, email, position, department, hire_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, first_name, last_name, email, position, department, hire_date, status
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.position)
    .bind(&payload.department)
    .bind(payload.hire_date)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    _auth: AuthUser,
    pool: web::Data<PgPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<impl Responder, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = ((page - 1) * per_page) as i64;

    // ---------- build WHERE clause dynamically ----------
    fn apply_filters(qb: &mut QueryBuilder<Postgres>, query: &EmployeeQuery) {
        if let Some(department) = &query.department {
            qb.push(" AND department = ").push_bind(department.clone());
        }
        if let Some(position) = &query.position {
            qb.push(" AND position = ").push_bind(position.clone());
        }
        if let Some(status) = &query.status {
            qb.push(" AND status = ").push_bind(status.clone());
        }
        if let Some(search) = &query.search {
            let like = format!("%{}%", search);
            qb.push(" AND (first_name ILIKE ")
                .push_bind(like.clone())
                .push(" OR last_name ILIKE ")
                .push_bind(like.clone())
                .push(" OR email ILIKE ")
                .push_bind(like)
                .push(")");
        }
    }

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM employees WHERE 1=1");
    apply_filters(&mut count_qb, &query);

    debug!(page, per_page, "Counting employees");

    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data_qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE 1=1"
    ));
    apply_filters(&mut data_qb, &query);
    data_qb
        .push(" ORDER BY id DESC LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let employees = data_qb
        .build_query_as::<Employee>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// The employee record linked to the calling account
#[utoipa::path(
    get,
    path = "/api/employees/current",
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "No employee record linked to this account")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn current_employee(
    auth: AuthUser,
    pool: web::Data<PgPool>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.linked_employee()?;

    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
    ))
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Employee record not found"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    if !auth.can_view_employee(employee_id) {
        return Err(ApiError::forbidden("You can only access your own data"));
    }

    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
    ))
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Update Employee. Partial payload; omitted fields keep their value.
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<UpdateEmployee>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        UPDATE employees
        SET first_name = COALESCE($1, first_name),
            last_name  = COALESCE($2, last_name),
            email      = COALESCE($3, email),
            position   = COALESCE($4, position),
            department = COALESCE($5, department),
            status     = COALESCE($6, status),
            hire_date  = COALESCE($7, hire_date)
        WHERE id = $8
        RETURNING id, first_name, last_name, email, position, department, hire_date, status
        "#,
    )
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.email)
    .bind(&body.position)
    .bind(&body.department)
    .bind(&body.status)
    .bind(body.hire_date)
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully"
    })))
}
