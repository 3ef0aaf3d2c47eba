use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use serde::Serialize;

/// Authenticated caller, decoded from the Bearer token of the request.
/// Handlers take it as a parameter; nothing is stashed on the request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub employee_id: u64,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("Config missing".to_string()))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(AuthUser {
        employee_id: claims.employee_id,
        role: claims.role,
    })
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied: Admin only".to_string()))
        }
    }

    /// Admins may act on anyone; everyone else only on themselves.
    pub fn can_access(&self, employee_id: u64) -> bool {
        self.is_admin() || self.employee_id == employee_id
    }

    pub fn require_access(&self, employee_id: u64) -> Result<(), AppError> {
        if self.can_access(employee_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }
}
