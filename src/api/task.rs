use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::task::{Task, TaskPriority, TaskStatus, elapsed_seconds};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTask {
    #[schema(example = 5)]
    pub employee_id: i64,
    #[schema(example = "Prepare quarterly report")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "medium")]
    pub priority: String,
    #[schema(example = "2026-08-14", format = "date", value_type = String)]
    pub due_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskStatus {
    #[schema(example = "completed")]
    pub status: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub employee_id: Option<i64>,
    #[schema(example = "assigned")]
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TaskListResponse {
    pub data: Vec<Task>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const TASK_COLUMNS: &str = "id, employee_id, assigned_by, title, description, priority, \
     due_date, status, time_spent, timer_started_at";

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task assigned", body = Task),
        (status = 400, description = "Invalid priority"),
        (status = 403, description = "Manager/Admin only"),
        (status = 404, description = "Assignee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn create_task(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<CreateTask>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let priority = TaskPriority::parse(&payload.priority)?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::invalid_argument("Title is required"));
    }

    let assignee_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE id = $1)")
            .bind(payload.employee_id)
            .fetch_one(pool.get_ref())
            .await?;

    if !assignee_exists {
        return Err(ApiError::not_found("Employee not found"));
    }

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (employee_id, assigned_by, title, description, priority, due_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, employee_id, assigned_by, title, description, priority,
                  due_date, status, time_spent, timer_started_at
        "#,
    )
    .bind(payload.employee_id)
    .bind(auth.user_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(priority.to_string())
    .bind(payload.due_date)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(task))
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskQuery),
    responses(
        (status = 200, description = "Paginated task list", body = TaskListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn list_tasks(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, ApiError> {
    // Employees see their own tasks; managers and admins see everything
    let scope_employee = if auth.is_employee() {
        Some(auth.linked_employee()?)
    } else {
        query.employee_id
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
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
        QueryBuilder::new("SELECT COUNT(*) FROM tasks WHERE 1=1");
    apply_filters(&mut count_qb, scope_employee, query.status.as_deref());

    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data_qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE 1=1"));
    apply_filters(&mut data_qb, scope_employee, query.status.as_deref());
    data_qb
        .push(" ORDER BY due_date ASC, id DESC LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let data = data_qb
        .build_query_as::<Task>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

async fn fetch_task_for_update(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    task_id: i64,
) -> Result<Task, ApiError> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
    ))
    .bind(task_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Task not found"))
}

/// Status change by the assignee or a manager/admin
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}/status",
    params(("task_id", Path, description = "Task ID")),
    request_body = UpdateTaskStatus,
    responses(
        (status = 200, description = "Status updated", body = Task),
        (status = 400, description = "Invalid task status"),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn update_task_status(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateTaskStatus>,
) -> Result<impl Responder, ApiError> {
    let task_id = path.into_inner();
    let status = TaskStatus::parse(&payload.status)?;

    let mut tx = pool.begin().await?;
    let task = fetch_task_for_update(&mut tx, task_id).await?;

    if !auth.can_view_employee(task.employee_id) {
        return Err(ApiError::forbidden("You can only update your own tasks"));
    }

    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET status = $1
        WHERE id = $2
        RETURNING id, employee_id, assigned_by, title, description, priority,
                  due_date, status, time_spent, timer_started_at
        "#,
    )
    .bind(status.to_string())
    .bind(task_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Start the work timer. The server owns the clock; the client never
/// reports elapsed time.
#[utoipa::path(
    post,
    path = "/api/tasks/{task_id}/timer/start",
    params(("task_id", Path, description = "Task ID")),
    responses(
        (status = 200, description = "Timer started", body = Task),
        (status = 400, description = "Timer already running or task completed"),
        (status = 403, description = "Only the assignee works the timer"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn start_timer(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let task_id = path.into_inner();
    let own_employee = auth.linked_employee()?;

    let mut tx = pool.begin().await?;
    let task = fetch_task_for_update(&mut tx, task_id).await?;

    if task.employee_id != own_employee {
        return Err(ApiError::forbidden("You can only work on your own tasks"));
    }

    if task.status == TaskStatus::Completed.to_string() {
        return Err(ApiError::invalid_transition("Task is already completed"));
    }

    if task.timer_started_at.is_some() {
        return Err(ApiError::conflict("Timer is already running"));
    }

    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET timer_started_at = $1, status = $2
        WHERE id = $3
        RETURNING id, employee_id, assigned_by, title, description, priority,
                  due_date, status, time_spent, timer_started_at
        "#,
    )
    .bind(Utc::now())
    .bind(TaskStatus::InProgress.to_string())
    .bind(task_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Stop the work timer and fold the elapsed seconds into the accumulator.
#[utoipa::path(
    post,
    path = "/api/tasks/{task_id}/timer/stop",
    params(("task_id", Path, description = "Task ID")),
    responses(
        (status = 200, description = "Timer stopped, time accumulated", body = Task),
        (status = 400, description = "No running timer"),
        (status = 403, description = "Only the assignee works the timer"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn stop_timer(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let task_id = path.into_inner();
    let own_employee = auth.linked_employee()?;

    let mut tx = pool.begin().await?;
    let task = fetch_task_for_update(&mut tx, task_id).await?;

    if task.employee_id != own_employee {
        return Err(ApiError::forbidden("You can only work on your own tasks"));
    }

    let Some(started_at) = task.timer_started_at else {
        return Err(ApiError::invalid_transition("No running timer for this task"));
    };

    let elapsed = elapsed_seconds(started_at, Utc::now());

    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET time_spent = time_spent + $1, timer_started_at = NULL
        WHERE id = $2
        RETURNING id, employee_id, assigned_by, title, description, priority,
                  due_date, status, time_spent, timer_started_at
        "#,
    )
    .bind(elapsed)
    .bind(task_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(task_id, elapsed, "Timer stopped");
    Ok(HttpResponse::Ok().json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    params(("task_id", Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 403, description = "Manager/Admin only"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn delete_task(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let task_id = path.into_inner();

    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Task not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task deleted"
    })))
}
