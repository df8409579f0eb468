use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{
    Attendance, AttendanceStatus, ensure_can_check_in, ensure_can_check_out,
    ensure_can_mark_absent, hours_between, normalize_correction,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AttendanceActionReq {
    #[schema(example = 5)]
    pub employee_id: i64,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CorrectAttendanceReq {
    /// Target by attendance row id...
    pub attendance_id: Option<i64>,
    /// ...or by employee and date
    pub employee_id: Option<i64>,
    #[schema(example = "2026-08-07", value_type = String, format = "date")]
    pub date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date-time")]
    pub check_in: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub check_out: Option<DateTime<Utc>>,
    #[schema(example = "present")]
    pub status: String,
    #[schema(example = "Forgot to check out")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub employee_id: Option<i64>,
    #[schema(example = "2026-08-07", value_type = String, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceListItem {
    pub id: i64,
    pub employee_id: i64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub check_in: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub check_out: Option<DateTime<Utc>>,
    pub status: String,
    pub hours_worked: Option<f64>,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceListItem>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

const SELECT_FOR_DAY: &str =
    "SELECT id, employee_id, date, check_in, check_out, status, hours_worked, \
     corrected_by, correction_reason, correction_time \
     FROM attendance WHERE employee_id = $1 AND date = $2 FOR UPDATE";

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    request_body = AttendanceActionReq,
    responses(
        (status = 201, description = "Checked in", body = Attendance),
        (status = 400, description = "Already marked for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your employee record"),
        (status = 404, description = "No employee record linked to this account")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<AttendanceActionReq>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_self_employee(payload.employee_id)?;

    let today = Utc::now().date_naive();
    let now = Utc::now();

    // Existence check and insert run under one transaction; the unique
    // constraint on (employee_id, date) closes the double-submit race.
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Attendance>(SELECT_FOR_DAY)
        .bind(employee_id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

    ensure_can_check_in(existing.as_ref())?;

    let record = sqlx::query_as::<_, Attendance>(
        r#"
        INSERT INTO attendance (employee_id, date, check_in, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id, employee_id, date, check_in, check_out, status, hours_worked,
                  corrected_by, correction_reason, correction_time
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .bind(now)
    .bind(AttendanceStatus::CheckIn.to_string())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::conflict("Already checked in today");
            }
        }
        ApiError::from(e)
    })?;

    tx.commit().await?;

    tracing::info!(employee_id, "Checked in");
    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/checkout",
    request_body = AttendanceActionReq,
    responses(
        (status = 200, description = "Checked out", body = Attendance),
        (status = 400, description = "No open check-in for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your employee record")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<AttendanceActionReq>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_self_employee(payload.employee_id)?;

    let today = Utc::now().date_naive();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Attendance>(SELECT_FOR_DAY)
        .bind(employee_id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

    let open = ensure_can_check_out(existing.as_ref())?;
    let Some(started) = open.check_in else {
        return Err(ApiError::invalid_transition("Check-in first before check-out"));
    };

    let hours_worked = hours_between(started, now);

    let record = sqlx::query_as::<_, Attendance>(
        r#"
        UPDATE attendance
        SET check_out = $1, hours_worked = $2, status = $3
        WHERE id = $4
        RETURNING id, employee_id, date, check_in, check_out, status, hours_worked,
                  corrected_by, correction_reason, correction_time
        "#,
    )
    .bind(now)
    .bind(hours_worked)
    .bind(AttendanceStatus::CheckOut.to_string())
    .bind(open.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(employee_id, hours_worked, "Checked out");
    Ok(HttpResponse::Ok().json(record))
}

/// Mark-absent endpoint. First attendance action of the day wins; absence
/// never overwrites a check-in.
#[utoipa::path(
    post,
    path = "/api/attendance/absent",
    request_body = AttendanceActionReq,
    responses(
        (status = 201, description = "Marked absent", body = Attendance),
        (status = 400, description = "Attendance already marked for today"),
        (status = 403, description = "Not your employee record")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_absent(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<AttendanceActionReq>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_self_employee(payload.employee_id)?;

    let today = Utc::now().date_naive();

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Attendance>(SELECT_FOR_DAY)
        .bind(employee_id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

    ensure_can_mark_absent(existing.as_ref())?;

    let record = sqlx::query_as::<_, Attendance>(
        r#"
        INSERT INTO attendance (employee_id, date, status)
        VALUES ($1, $2, $3)
        RETURNING id, employee_id, date, check_in, check_out, status, hours_worked,
                  corrected_by, correction_reason, correction_time
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .bind(AttendanceStatus::Absent.to_string())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::conflict("Attendance already marked for today");
            }
        }
        ApiError::from(e)
    })?;

    tx.commit().await?;

    Ok(HttpResponse::Created().json(record))
}

/// Today's record for one employee, or a null-status sentinel
#[utoipa::path(
    get,
    path = "/api/attendance/today/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Today's record, or null status if none"),
        (status = 403, description = "Employees may only query themselves")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    if !auth.can_view_employee(employee_id) {
        return Err(ApiError::forbidden("You can only view your own attendance"));
    }

    let today = Utc::now().date_naive();

    let record = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, status, hours_worked,
               corrected_by, correction_reason, correction_time
        FROM attendance
        WHERE employee_id = $1 AND date = $2
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?;

    match record {
        Some(r) => Ok(HttpResponse::Ok().json(r)),
        None => Ok(HttpResponse::Ok().json(json!({
            "status": null,
            "message": "No attendance record for today"
        }))),
    }
}

/// All attendance records with employee details (manager/admin)
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 403, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    query: web::Query<AttendanceQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = ((page - 1) * per_page) as i64;

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM attendance a WHERE 1=1");
    if let Some(employee_id) = query.employee_id {
        count_qb.push(" AND a.employee_id = ").push_bind(employee_id);
    }
    if let Some(date) = query.date {
        count_qb.push(" AND a.date = ").push_bind(date);
    }

    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await?;

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT a.id, a.employee_id, a.date, a.check_in, a.check_out, a.status, \
         a.hours_worked, e.first_name, e.last_name, e.position, e.department \
         FROM attendance a \
         JOIN employees e ON a.employee_id = e.id \
         WHERE 1=1",
    );
    if let Some(employee_id) = query.employee_id {
        qb.push(" AND a.employee_id = ").push_bind(employee_id);
    }
    if let Some(date) = query.date {
        qb.push(" AND a.date = ").push_bind(date);
    }
    qb.push(" ORDER BY a.date DESC, a.id DESC LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let data = qb
        .build_query_as::<AttendanceListItem>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Per-employee attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Attendance history"),
        (status = 403, description = "Employees may only query themselves")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    if !auth.can_view_employee(employee_id) {
        return Err(ApiError::forbidden("You can only view your own attendance"));
    }

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, status, hours_worked,
               corrected_by, correction_reason, correction_time
        FROM attendance
        WHERE employee_id = $1
        ORDER BY date DESC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Aggregate worked hours into day counts (8h = one work day)
#[utoipa::path(
    get,
    path = "/api/attendance/summary/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Total hours, days present, work days"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    if !auth.can_view_employee(employee_id) {
        return Err(ApiError::forbidden("You can only view your own work days"));
    }

    let total_hours: Option<f64> = sqlx::query_scalar(
        "SELECT SUM(hours_worked) FROM attendance WHERE employee_id = $1 AND status = $2",
    )
    .bind(employee_id)
    .bind(AttendanceStatus::CheckOut.to_string())
    .fetch_one(pool.get_ref())
    .await?;

    let days_present: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance WHERE employee_id = $1 AND status = $2",
    )
    .bind(employee_id)
    .bind(AttendanceStatus::CheckOut.to_string())
    .fetch_one(pool.get_ref())
    .await?;

    let total_hours = total_hours.unwrap_or(0.0);
    let work_days = (total_hours / 8.0).floor() as i64;

    Ok(HttpResponse::Ok().json(json!({
        "employee_id": employee_id,
        "total_hours": total_hours,
        "work_days": work_days,
        "days_present": days_present,
    })))
}

/// Correction endpoint: the privileged side door around the daily state
/// machine. Upserts by attendance id, or by (employee_id, date).
#[utoipa::path(
    put,
    path = "/api/attendance/correct",
    request_body = CorrectAttendanceReq,
    responses(
        (status = 200, description = "Record corrected", body = Attendance),
        (status = 400, description = "Invalid status value"),
        (status = 403, description = "Manager/Admin only; managers cannot correct their own record"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn correct_attendance(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<CorrectAttendanceReq>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let status = AttendanceStatus::parse(&payload.status)?;
    let fixed = normalize_correction(status, payload.check_in, payload.check_out)?;

    let mut tx = pool.begin().await?;

    // Resolve the target row (if any) while holding its lock.
    let existing = if let Some(attendance_id) = payload.attendance_id {
        let record = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, employee_id, date, check_in, check_out, status, hours_worked,
                   corrected_by, correction_reason, correction_time
            FROM attendance WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(attendance_id)
        .fetch_optional(&mut *tx)
        .await?;

        Some(record.ok_or_else(|| ApiError::not_found("Attendance record not found"))?)
    } else {
        let (Some(employee_id), Some(date)) = (payload.employee_id, payload.date) else {
            return Err(ApiError::invalid_argument(
                "Either attendance_id or employee_id and date are required",
            ));
        };

        sqlx::query_as::<_, Attendance>(SELECT_FOR_DAY)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&mut *tx)
            .await?
    };

    let target_employee = existing
        .as_ref()
        .map(|r| r.employee_id)
        .or(payload.employee_id)
        .ok_or_else(|| ApiError::invalid_argument("employee_id is required"))?;

    // A manager may not rewrite their own day; that takes an admin.
    if auth.is_manager() && auth.employee_id == Some(target_employee) {
        return Err(ApiError::forbidden(
            "Managers cannot correct their own attendance record",
        ));
    }

    let record = if let Some(existing) = existing {
        sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendance
            SET check_in = $1, check_out = $2, status = $3, hours_worked = $4,
                corrected_by = $5, correction_time = NOW(), correction_reason = $6
            WHERE id = $7
            RETURNING id, employee_id, date, check_in, check_out, status, hours_worked,
                      corrected_by, correction_reason, correction_time
            "#,
        )
        .bind(fixed.check_in)
        .bind(fixed.check_out)
        .bind(status.to_string())
        .bind(fixed.hours_worked)
        .bind(auth.user_id)
        .bind(&payload.reason)
        .bind(existing.id)
        .fetch_one(&mut *tx)
        .await?
    } else {
        let Some(date) = payload.date else {
            return Err(ApiError::invalid_argument("date is required"));
        };

        sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance
                (employee_id, date, check_in, check_out, status, hours_worked,
                 corrected_by, correction_time, correction_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), $8)
            RETURNING id, employee_id, date, check_in, check_out, status, hours_worked,
                      corrected_by, correction_reason, correction_time
            "#,
        )
        .bind(target_employee)
        .bind(date)
        .bind(fixed.check_in)
        .bind(fixed.check_out)
        .bind(status.to_string())
        .bind(fixed.hours_worked)
        .bind(auth.user_id)
        .bind(&payload.reason)
        .fetch_one(&mut *tx)
        .await?
    };

    tx.commit().await?;

    tracing::info!(
        attendance_id = record.id,
        corrected_by = auth.user_id,
        "Attendance corrected"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record corrected",
        "data": record,
    })))
}
