use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::warn;

use crate::{config::Config, db::with_timeout};

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "HRIS API is running" }))
}

/// Health check; answers 503 when the database cannot be reached
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({
            "status": "ok",
            "database": "up",
            "smtp": "configured",
            "leave_approval_mode": "manual"
        })),
        (status = 503, description = "Database unreachable", body = Object, example = json!({
            "status": "degraded",
            "database": "down",
            "smtp": "missing",
            "leave_approval_mode": "manual"
        }))
    ),
    tag = "System"
)]
pub async fn health(pool: web::Data<MySqlPool>, config: web::Data<Config>) -> HttpResponse {
    let ping = with_timeout(
        config.store_timeout(),
        sqlx::query("SELECT 1").execute(pool.get_ref()),
    )
    .await;

    let smtp = if config.smtp.is_some() { "configured" } else { "missing" };
    let mode = config.leave_approval_mode.to_string();

    match ping {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": "up",
            "smtp": smtp,
            "leave_approval_mode": mode,
        })),
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "database": "down",
                "smtp": smtp,
                "leave_approval_mode": mode,
            }))
        }
    }
}
