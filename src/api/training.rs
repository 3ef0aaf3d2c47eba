use crate::{auth::auth::AuthUser, config::Config, db::with_timeout, error::AppError};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

const PARTICIPATION_SQL: &str = r#"
    SELECT JSON_OBJECT(
        'training_id', tp.training_id,
        'feedback', tp.feedback,
        'certificate_url', tp.certificate_url,
        'trainings', JSON_OBJECT(
            'title', t.title,
            'scheduled_date', t.scheduled_date,
            'mandatory', t.mandatory
        )
    ) AS record
    FROM training_participants tp
    LEFT JOIN trainings t ON t.id = tp.training_id
    WHERE tp.employee_id = ?
"#;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrainingFeedbackDto {
    #[schema(example = 4)]
    pub training_id: u64,
    #[schema(example = "Clear and practical sessions")]
    pub feedback: String,
}

/// Trainings the employee participates in, with the training details
#[utoipa::path(
    get,
    path = "/trainings/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Training participation", body = Object, example = json!([{
            "training_id": 4,
            "feedback": null,
            "certificate_url": null,
            "trainings": { "title": "Data Privacy", "scheduled_date": "2026-02-10", "mandatory": 1 }
        }])),
        (status = 403, description = "Access denied")
    ),
    tag = "Training",
    security(("bearer_auth" = []))
)]
pub async fn list_trainings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    let rows = with_timeout(
        config.store_timeout(),
        sqlx::query_scalar::<_, sqlx::types::Json<Value>>(PARTICIPATION_SQL)
            .bind(employee_id)
            .fetch_all(pool.get_ref()),
    )
    .await?;

    let trainings: Vec<Value> = rows.into_iter().map(|json| json.0).collect();
    Ok(HttpResponse::Ok().json(trainings))
}

/// Leave feedback on a training the employee took part in
#[utoipa::path(
    post,
    path = "/trainings/{employee_id}/feedback",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = TrainingFeedbackDto,
    responses(
        (status = 200, description = "Feedback stored", body = Object, example = json!({
            "employee_id": 7, "training_id": 4, "feedback": "Clear and practical sessions"
        })),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Employee is not a participant of that training")
    ),
    tag = "Training",
    security(("bearer_auth" = []))
)]
pub async fn training_feedback(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<TrainingFeedbackDto>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    if payload.feedback.trim().is_empty() {
        return Err(AppError::Validation("feedback is required".to_string()));
    }

    let timeout = config.store_timeout();

    with_timeout(
        timeout,
        sqlx::query(
            "UPDATE training_participants SET feedback = ? WHERE employee_id = ? AND training_id = ?",
        )
        .bind(payload.feedback.trim())
        .bind(employee_id)
        .bind(payload.training_id)
        .execute(pool.get_ref()),
    )
    .await?;

    // MySQL counts changed rows only, so existence is checked by reading back
    let stored = with_timeout(
        timeout,
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT feedback FROM training_participants WHERE employee_id = ? AND training_id = ?",
        )
        .bind(employee_id)
        .bind(payload.training_id)
        .fetch_optional(pool.get_ref()),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Training participation not found".to_string()))?;

    info!(employee_id, training_id = payload.training_id, "Training feedback stored");

    Ok(HttpResponse::Ok().json(json!({
        "employee_id": employee_id,
        "training_id": payload.training_id,
        "feedback": stored,
    })))
}

#[cfg(test)]
mod tests {
    use crate::fake_store::{bearer, call_json, test_app, test_config};
    use crate::model::role::Role;
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    #[actix_web::test]
    async fn feedback_for_someone_else_is_forbidden() {
        let app = test::init_service(test_app(test_config()).build()).await;

        let req = test::TestRequest::post()
            .uri("/trainings/3/feedback")
            .insert_header(bearer(7, Role::Employee))
            .set_json(json!({"training_id": 1, "feedback": "great"}));
        assert_eq!(call_json(&app, req).await.0, StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/trainings/3")
            .insert_header(bearer(7, Role::Employee));
        assert_eq!(call_json(&app, req).await.0, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn blank_feedback_is_rejected() {
        let app = test::init_service(test_app(test_config()).build()).await;

        let req = test::TestRequest::post()
            .uri("/trainings/7/feedback")
            .insert_header(bearer(7, Role::Employee))
            .set_json(json!({"training_id": 1, "feedback": "   "}));
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "feedback is required");
    }
}
