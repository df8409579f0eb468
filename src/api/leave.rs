use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{LeaveRequest, LeaveType};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLeave {
    #[schema(example = "2026-08-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "Flu")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    #[schema(example = 5)]
    pub employee_id: Option<i64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

const LEAVE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, leave_type, reason, status, created_at";

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Bad dates or leave type"),
        (status = 404, description = "No employee record linked to this account")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<CreateLeave>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.linked_employee()?;

    if payload.start_date > payload.end_date {
        return Err(ApiError::invalid_argument(
            "start_date cannot be after end_date",
        ));
    }

    let leave = sqlx::query_as::<_, LeaveRequest>(
        r#"
        INSERT INTO leave_requests
            (employee_id, start_date, end_date, leave_type, reason)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, employee_id, start_date, end_date, leave_type, reason, status, created_at
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.to_string())
    .bind(&payload.reason)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Approve leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}/approve",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 403, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'approved'
        WHERE id = $1
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}/reject",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 403, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'rejected'
        WHERE id = $1
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected"
    })))
}

#[utoipa::path(
    get,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Not your leave request"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = $1"
    ))
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(leave) = leave else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        })));
    };

    if !auth.can_view_employee(leave.employee_id) {
        return Err(ApiError::forbidden("You can only view your own leave requests"));
    }

    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, ApiError> {
    // Employees see their own requests; managers and admins see everything.
    let scope_employee = if auth.is_employee() {
        Some(auth.linked_employee()?)
    } else {
        query.employee_id
    };

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = ((page - 1) * per_page) as i64;

    fn apply_filters(
        qb: &mut QueryBuilder<Postgres>,
        scope_employee: Option<i64>,
        status: Option<&str>,
    ) {
        if let Some(emp_id) = scope_employee {
            qb.push(" AND employee_id = ").push_bind(emp_id);
        }
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status.to_string());
        }
    }

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM leave_requests WHERE 1=1");
    apply_filters(&mut count_qb, scope_employee, query.status.as_deref());

    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data_qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE 1=1"
    ));
    apply_filters(&mut data_qb, scope_employee, query.status.as_deref());
    data_qb
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let leaves = data_qb
        .build_query_as::<LeaveRequest>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    }))
}
