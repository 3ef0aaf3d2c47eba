use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    leave::{
        service::{LeaveApplication, LeaveService},
        store::Decision,
    },
    model::leave_request::LeaveRequest,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveApplicationDto {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Annual Leave")]
    pub leave_type: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = 3)]
    pub days: u32,
}

impl From<LeaveApplicationDto> for LeaveApplication {
    fn from(dto: LeaveApplicationDto) -> Self {
        LeaveApplication {
            employee_id: dto.employee_id,
            leave_type: dto.leave_type,
            start_date: dto.start_date,
            days: dto.days,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelLeaveDto {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveAppliedResponse {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    pub leave: LeaveRequest,
    #[schema(example = 9)]
    pub remaining_balance: u32,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveCanceledResponse {
    #[schema(example = "Leave request has been canceled and balance restored")]
    pub message: String,
    #[schema(example = 3)]
    pub returned_days: u32,
    #[schema(example = 12)]
    pub new_balance: u32,
}

/// Check a leave application against the calendar and the current balance
#[utoipa::path(
    post,
    path = "/leave-preview",
    request_body = LeaveApplicationDto,
    responses(
        (status = 200, description = "Preview computed, nothing stored", body = crate::leave::service::LeavePreview),
        (status = 400, description = "Weekend start, backdated start or unknown leave type"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn preview_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    config: web::Data<Config>,
    payload: web::Json<LeaveApplicationDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_access(payload.employee_id)?;

    let application: LeaveApplication = payload.into_inner().into();
    let preview = service.preview(&application, config.today()).await?;

    Ok(HttpResponse::Ok().json(preview))
}

/// Apply for leave; the balance is reserved atomically with the request
#[utoipa::path(
    post,
    path = "/leave/apply",
    request_body = LeaveApplicationDto,
    responses(
        (status = 201, description = "Leave request stored", body = LeaveAppliedResponse),
        (status = 400, description = "Validation failure or insufficient balance"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "A request already starts on that date")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(name = "http_leave_apply", skip_all, fields(caller = auth.employee_id))]
pub async fn apply_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    config: web::Data<Config>,
    payload: web::Json<LeaveApplicationDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_access(payload.employee_id)?;

    let reservation = service.apply(payload.into_inner().into(), config.today()).await?;

    Ok(HttpResponse::Created().json(LeaveAppliedResponse {
        message: "Leave request submitted".to_string(),
        leave: reservation.request,
        remaining_balance: reservation.remaining_balance,
    }))
}

/// Cancel a pending leave request and restore its days
#[utoipa::path(
    post,
    path = "/leave/cancel",
    request_body = CancelLeaveDto,
    responses(
        (status = 200, description = "Request deleted, balance restored", body = LeaveCanceledResponse),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is no longer pending")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(name = "http_leave_cancel", skip_all, fields(caller = auth.employee_id))]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<CancelLeaveDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_access(payload.employee_id)?;

    let release = service
        .cancel(payload.employee_id, payload.start_date)
        .await?;

    Ok(HttpResponse::Ok().json(LeaveCanceledResponse {
        message: "Leave request has been canceled and balance restored".to_string(),
        returned_days: release.returned_days,
        new_balance: release.new_balance,
    }))
}

/// Leave history of one employee, newest first
#[utoipa::path(
    get,
    path = "/leave/requests/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Leave requests", body = [LeaveRequest]),
        (status = 403, description = "Access denied")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn leave_history(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    let requests = service.history(employee_id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Get a single leave request
#[utoipa::path(
    get,
    path = "/leave/{leave_id}",
    params(("leave_id", Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let request = service.find(path.into_inner()).await?;
    auth.require_access(request.employee_id)?;

    Ok(HttpResponse::Ok().json(request))
}

async fn decide(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    leave_id: u64,
    decision: Decision,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let request = service.decide(leave_id, decision).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave request {}", request.status),
        "leave": request,
    })))
}

/// Approve a pending leave request (admin)
#[utoipa::path(
    put,
    path = "/leave/{leave_id}/approve",
    params(("leave_id", Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave request approved"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    decide(auth, service, path.into_inner(), Decision::Approve).await
}

/// Reject a pending leave request and return its days (admin)
#[utoipa::path(
    put,
    path = "/leave/{leave_id}/reject",
    params(("leave_id", Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave request rejected"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    decide(auth, service, path.into_inner(), Decision::Reject).await
}
