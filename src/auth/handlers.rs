use std::str::FromStr;

use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        otp::{generate_code, hash_code, verify_code},
        store::LoginStore,
    },
    config::Config,
    db::with_timeout,
    error::AppError,
    mail::Mailer,
    model::role::Role,
    models::{LoginRequestDto, VerifyTokenDto},
};
use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Request a one-time login code by email
#[utoipa::path(
    post,
    path = "/login-request",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Code sent", body = Object, example = json!({
            "message": "Login OTP sent to your email"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Store or mail relay failure")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login_request", skip_all, fields(email = %payload.email))]
pub async fn login_request(
    payload: web::Json<LoginRequestDto>,
    store: web::Data<dyn LoginStore>,
    mailer: web::Data<dyn Mailer>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }

    let timeout = config.store_timeout();

    let employee_id = with_timeout(timeout, store.employee_id_by_email(email))
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let code = generate_code();
    let code_hash = hash_code(&code)?;
    let expires_at = Utc::now() + Duration::seconds(config.otp_ttl);

    with_timeout(
        timeout,
        store.insert_login_token(employee_id, &code_hash, expires_at),
    )
    .await?;

    with_timeout(timeout, mailer.send_login_code(email, &code)).await?;

    info!(employee_id, "Login code sent");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login OTP sent to your email"
    })))
}

/// Exchange a login code for an access token
#[utoipa::path(
    post,
    path = "/verify-token",
    request_body = VerifyTokenDto,
    responses(
        (status = 200, description = "Access token issued", body = Object, example = json!({
            "token": "eyJhbGciOiJIUzI1NiJ9..."
        })),
        (status = 400, description = "Invalid, expired or used code"),
        (status = 401, description = "Employee has no user account")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_verify_token", skip_all, fields(email = %payload.email))]
pub async fn verify_token(
    payload: web::Json<VerifyTokenDto>,
    store: web::Data<dyn LoginStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let code = payload.code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("Token missing".to_string()));
    }

    let timeout = config.store_timeout();
    let invalid = || AppError::Validation("Invalid token".to_string());

    let employee_id = with_timeout(timeout, store.employee_id_by_email(payload.email.trim()))
        .await?
        .ok_or_else(invalid)?;

    let open = with_timeout(timeout, store.open_login_tokens(employee_id, Utc::now())).await?;

    let matched = open
        .iter()
        .find(|t| verify_code(code, &t.token))
        .ok_or_else(|| AppError::Validation("Token expired or already used".to_string()))?;

    // single use even when two verifications race
    if !with_timeout(timeout, store.consume_login_token(matched.id)).await? {
        return Err(AppError::Validation(
            "Token expired or already used".to_string(),
        ));
    }

    debug!(employee_id, token_id = matched.id, "Login code consumed");

    let role = lookup_role(store.get_ref(), employee_id, &config).await?;
    let token = generate_access_token(
        employee_id,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    info!(employee_id, role = %role, "Login successful");

    Ok(HttpResponse::Ok().json(json!({ "token": token })))
}

/// The user row may trail the employee row on a lagging replica, so the
/// lookup is retried a bounded number of times with a fixed delay.
async fn lookup_role(
    store: &dyn LoginStore,
    employee_id: u64,
    config: &Config,
) -> Result<Role, AppError> {
    let attempts = config.login_lookup_attempts.max(1);

    for attempt in 1..=attempts {
        match with_timeout(config.store_timeout(), store.role_of(employee_id)).await {
            Ok(Some(raw)) => {
                return Role::from_str(&raw)
                    .map_err(|_| AppError::Unauthorized("Invalid role".to_string()));
            }
            Ok(None) => debug!(employee_id, attempt, "Employee role not visible yet"),
            Err(e) => warn!(employee_id, attempt, error = %e, "Employee role lookup failed"),
        }

        if attempt < attempts {
            tokio::time::sleep(config.login_lookup_delay()).await;
        }
    }

    Err(AppError::Unauthorized("Employee not found".to_string()))
}

/// Echo the authenticated principal
#[utoipa::path(
    get,
    path = "/protected",
    responses(
        (status = 200, description = "Principal decoded from the token", body = Object, example = json!({
            "employee_id": 1, "role": "admin"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn protected(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth)
}

#[cfg(test)]
mod tests {
    use crate::auth::jwt::verify_token as decode_token;
    use crate::fake_store::{CapturingMailer, MemoryLoginStore, call_json, test_app, test_config};
    use crate::model::role::Role;
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn post(uri: &str, body: Value) -> test::TestRequest {
        test::TestRequest::post().uri(uri).set_json(body)
    }

    fn login_fixture(role: Option<&str>) -> (Arc<MemoryLoginStore>, Arc<CapturingMailer>) {
        let store = Arc::new(MemoryLoginStore::default());
        store.put_employee(5, "ayu@company.com", role);
        (store, Arc::new(CapturingMailer::default()))
    }

    #[actix_web::test]
    async fn code_from_email_logs_in_once() {
        let (store, mailer) = login_fixture(Some("employee"));
        let app = test::init_service(
            test_app(test_config()).with_login(store, mailer.clone()).build(),
        )
        .await;

        let (status, _) = call_json(&app, post("/login-request", json!({"email": "ayu@company.com"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (to, code) = mailer.last().unwrap();
        assert_eq!(to, "ayu@company.com");

        let body = json!({"email": "ayu@company.com", "code": code});
        let (status, resp) = call_json(&app, post("/verify-token", body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let claims =
            decode_token(resp["token"].as_str().unwrap(), &test_config().jwt_secret).unwrap();
        assert_eq!(claims.employee_id, 5);
        assert_eq!(claims.role, Role::Employee);

        // second use of the same code
        let (status, resp) = call_json(&app, post("/verify-token", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "validation");
    }

    #[actix_web::test]
    async fn unknown_email_is_not_found() {
        let (store, mailer) = login_fixture(Some("employee"));
        let app = test::init_service(
            test_app(test_config()).with_login(store, mailer.clone()).build(),
        )
        .await;

        let (status, _) = call_json(
            &app,
            post("/login-request", json!({"email": "ghost@company.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(mailer.last().is_none());
    }

    #[actix_web::test]
    async fn wrong_code_is_rejected() {
        let (store, mailer) = login_fixture(Some("admin"));
        let app = test::init_service(
            test_app(test_config()).with_login(store, mailer.clone()).build(),
        )
        .await;

        call_json(&app, post("/login-request", json!({"email": "ayu@company.com"}))).await;
        let (_, code) = mailer.last().unwrap();
        let wrong = if code == "999999" { "100000" } else { "999999" };

        let (status, _) = call_json(
            &app,
            post("/verify-token", json!({"email": "ayu@company.com", "code": wrong})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn expired_code_is_rejected() {
        let mut config = test_config();
        config.otp_ttl = -1;
        let (store, mailer) = login_fixture(Some("employee"));
        let app = test::init_service(test_app(config).with_login(store, mailer.clone()).build()).await;

        call_json(&app, post("/login-request", json!({"email": "ayu@company.com"}))).await;
        let (_, code) = mailer.last().unwrap();

        let (status, resp) = call_json(
            &app,
            post("/verify-token", json!({"email": "ayu@company.com", "code": code})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Token expired or already used");
    }

    #[actix_web::test]
    async fn role_lookup_retries_until_visible() {
        let (store, mailer) = login_fixture(Some("employee"));
        store.hide_role_for(2);
        let app = test::init_service(
            test_app(test_config())
                .with_login(store.clone(), mailer.clone())
                .build(),
        )
        .await;

        call_json(&app, post("/login-request", json!({"email": "ayu@company.com"}))).await;
        let (_, code) = mailer.last().unwrap();

        let (status, _) = call_json(
            &app,
            post("/verify-token", json!({"email": "ayu@company.com", "code": code})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.role_lookups(), 3);
    }

    #[actix_web::test]
    async fn missing_user_account_is_unauthorized_after_retries() {
        let (store, mailer) = login_fixture(None);
        let app = test::init_service(
            test_app(test_config())
                .with_login(store.clone(), mailer.clone())
                .build(),
        )
        .await;

        call_json(&app, post("/login-request", json!({"email": "ayu@company.com"}))).await;
        let (_, code) = mailer.last().unwrap();

        let (status, _) = call_json(
            &app,
            post("/verify-token", json!({"email": "ayu@company.com", "code": code})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(store.role_lookups(), 3);
    }

    #[actix_web::test]
    async fn protected_echoes_principal() {
        let app = test::init_service(test_app(test_config()).build()).await;

        let (status, _) = call_json(&app, test::TestRequest::get().uri("/protected")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(crate::fake_store::bearer(9, Role::Employee));
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"employee_id": 9, "role": "employee"}));
    }
}
