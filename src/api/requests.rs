use crate::{auth::auth::AuthUser, config::Config, db::with_timeout, error::AppError};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoteRequestDto {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "hybrid")]
    pub work_mode: String,
    #[schema(example = "Caring for a family member")]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InternalApplicationDto {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "Senior Data Analyst")]
    pub apply_for_position: String,
}

fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Ask to work remotely; the request starts as pending
#[utoipa::path(
    post,
    path = "/remote-request",
    request_body = RemoteRequestDto,
    responses(
        (status = 201, description = "Request submitted", body = Object, example = json!({
            "message": "Request submitted",
            "request": { "id": 3, "employee_id": 7, "work_mode": "hybrid", "status": "pending" }
        })),
        (status = 403, description = "Access denied")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn submit_remote_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RemoteRequestDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_access(payload.employee_id)?;
    required("work_mode", &payload.work_mode)?;
    required("reason", &payload.reason)?;

    let requested_at = Utc::now();

    let result = with_timeout(
        config.store_timeout(),
        sqlx::query(
            r#"
            INSERT INTO remote_request (employee_id, work_mode, reason, requested_at, status)
            VALUES (?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(payload.employee_id)
        .bind(payload.work_mode.trim())
        .bind(payload.reason.trim())
        .bind(requested_at)
        .execute(pool.get_ref()),
    )
    .await?;

    info!(employee_id = payload.employee_id, "Remote work request submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Request submitted",
        "request": {
            "id": result.last_insert_id(),
            "employee_id": payload.employee_id,
            "work_mode": payload.work_mode.trim(),
            "reason": payload.reason.trim(),
            "requested_at": requested_at,
            "status": "pending"
        }
    })))
}

/// Apply for an internal job opening
#[utoipa::path(
    post,
    path = "/internal-application",
    request_body = InternalApplicationDto,
    responses(
        (status = 201, description = "Application submitted", body = Object, example = json!({
            "message": "Application submitted successfully",
            "data": { "id": 2, "employee_id": 7, "apply_for_position": "Senior Data Analyst", "status": "Pending" }
        })),
        (status = 403, description = "Access denied")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn submit_internal_application(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<InternalApplicationDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_access(payload.employee_id)?;
    required("apply_for_position", &payload.apply_for_position)?;

    let result = with_timeout(
        config.store_timeout(),
        sqlx::query(
            "INSERT INTO recruitment (employee_id, apply_for_position, status) VALUES (?, ?, 'Pending')",
        )
        .bind(payload.employee_id)
        .bind(payload.apply_for_position.trim())
        .execute(pool.get_ref()),
    )
    .await?;

    info!(employee_id = payload.employee_id, "Internal application submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Application submitted successfully",
        "data": {
            "id": result.last_insert_id(),
            "employee_id": payload.employee_id,
            "apply_for_position": payload.apply_for_position.trim(),
            "status": "Pending"
        }
    })))
}
