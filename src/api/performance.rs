use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::performance::PerformanceReview;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateReview {
    #[schema(example = 5)]
    pub employee_id: i64,
    #[schema(example = "2026-06-30", format = "date", value_type = String)]
    pub review_date: NaiveDate,
    #[schema(example = 4, minimum = 1, maximum = 5)]
    pub rating: i16,
    pub comments: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateReview {
    pub rating: Option<i16>,
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub employee_id: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<PerformanceReview>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const REVIEW_COLUMNS: &str =
    "id, employee_id, reviewer_id, review_date, rating, comments";

fn validate_rating(rating: i16) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::invalid_argument("Rating must be between 1 and 5"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/performance",
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review recorded", body = PerformanceReview),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn create_review(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    payload: web::Json<CreateReview>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;
    validate_rating(payload.rating)?;

    let review = sqlx::query_as::<_, PerformanceReview>(
        r#"
        INSERT INTO performance_reviews (employee_id, reviewer_id, review_date, rating, comments)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, employee_id, reviewer_id, review_date, rating, comments
        "#,
    )
    .bind(payload.employee_id)
    .bind(auth.user_id)
    .bind(payload.review_date)
    .bind(payload.rating)
    .bind(&payload.comments)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(review))
}

#[utoipa::path(
    get,
    path = "/api/performance",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Paginated review list", body = ReviewListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn list_reviews(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    query: web::Query<ReviewQuery>,
) -> Result<impl Responder, ApiError> {
    let scope_employee = if auth.is_employee() {
        Some(auth.linked_employee()?)
    } else {
        query.employee_id
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = ((page - 1) * per_page) as i64;

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM performance_reviews WHERE 1=1");
    if let Some(emp_id) = scope_employee {
        count_qb.push(" AND employee_id = ").push_bind(emp_id);
    }

    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data_qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {REVIEW_COLUMNS} FROM performance_reviews WHERE 1=1"
    ));
    if let Some(emp_id) = scope_employee {
        data_qb.push(" AND employee_id = ").push_bind(emp_id);
    }
    data_qb
        .push(" ORDER BY review_date DESC LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let data = data_qb
        .build_query_as::<PerformanceReview>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(ReviewListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/performance/{review_id}",
    params(("review_id", Path, description = "Review ID")),
    responses(
        (status = 200, body = PerformanceReview),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn get_review(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let review_id = path.into_inner();

    let review = sqlx::query_as::<_, PerformanceReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM performance_reviews WHERE id = $1"
    ))
    .bind(review_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(review) = review else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Review not found"
        })));
    };

    if !auth.can_view_employee(review.employee_id) {
        return Err(ApiError::forbidden("You can only view your own reviews"));
    }

    Ok(HttpResponse::Ok().json(review))
}

#[utoipa::path(
    put,
    path = "/api/performance/{review_id}",
    params(("review_id", Path, description = "Review ID")),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = PerformanceReview),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Manager/Admin only"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn update_review(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateReview>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let review_id = path.into_inner();

    let review = sqlx::query_as::<_, PerformanceReview>(
        r#"
        UPDATE performance_reviews
        SET rating = COALESCE($1, rating),
            comments = COALESCE($2, comments)
        WHERE id = $3
        RETURNING id, employee_id, reviewer_id, review_date, rating, comments
        "#,
    )
    .bind(payload.rating)
    .bind(&payload.comments)
    .bind(review_id)
    .fetch_optional(pool.get_ref())
    .await?;

    match review {
        Some(r) => Ok(HttpResponse::Ok().json(r)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Review not found"
        }))),
    }
}

#[utoipa::path(
    delete,
    path = "/api/performance/{review_id}",
    params(("review_id", Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Admin only"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Performance"
)]
pub async fn delete_review(
    auth: AuthUser,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let review_id = path.into_inner();

    let result = sqlx::query("DELETE FROM performance_reviews WHERE id = $1")
        .bind(review_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Review not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Review deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
