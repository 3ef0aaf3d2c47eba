use crate::{
    auth::auth::AuthUser,
    config::Config,
    db::with_timeout,
    error::AppError,
    leave::service::LeaveService,
    model::employee::{ContractStatus, EMPLOYEE_COLUMNS, Employee, PATCHABLE_COLUMNS},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::{MySqlPool, error::ErrorKind};
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "Ayu Lestari")]
    pub full_name: String,
    #[schema(example = "ayu.lestari@company.com", format = "email")]
    pub email: String,
    pub position: Option<String>,
    pub department: Option<String>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-04-05", format = "date", value_type = String)]
    pub probation_end: Option<NaiveDate>,
    #[schema(example = "permanent")]
    pub contract_type: Option<String>,
    #[serde(default)]
    #[schema(example = 12)]
    pub annual_leave_balance: u32,
    #[serde(default)]
    #[schema(example = 3)]
    pub personal_leave_balance: u32,
    #[serde(default)]
    #[schema(example = 2)]
    pub wellbeing_day_balance: u32,
    pub bank_account: Option<String>,
    pub npwp_number: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
}

async fn fetch_employee(
    pool: &MySqlPool,
    config: &Config,
    employee_id: u64,
) -> Result<Employee, AppError> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    with_timeout(
        config.store_timeout(),
        sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(pool),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
}

/// Own profile of the caller
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Employee profile", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn get_own_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee = fetch_employee(&pool, &config, auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Any employee's profile (admin)
#[utoipa::path(
    get,
    path = "/admin/profile/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee profile", body = Employee),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let employee = fetch_employee(&pool, &config, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Partially update an employee (admin). Balances and id are not editable here.
#[utoipa::path(
    patch,
    path = "/profile/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body(content = Object, example = json!({
        "position": "Senior Data Analyst",
        "probation_end": "2026-04-05"
    })),
    responses(
        (status = 200, description = "Updated employee", body = Employee),
        (status = 400, description = "Empty payload, non-editable field or null required field"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();
    let update = build_update_sql("employees", &payload, "id", employee_id, PATCHABLE_COLUMNS)?;
    debug!(sql = %update.sql, "Updating employee");

    with_timeout(config.store_timeout(), async {
        execute_update(&pool, update).await.map_err(write_error)
    })
    .await?;

    // re-read: an unchanged row reports zero affected rows
    let employee = fetch_employee(&pool, &config, employee_id).await?;

    info!(employee_id, by = auth.employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Constraint violations on employee writes are the client's fault.
fn write_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) => {
            constraint_error(db.kind(), db.message()).unwrap_or_else(|| e.into())
        }
        _ => e.into(),
    }
}

fn constraint_error(kind: ErrorKind, message: &str) -> Option<AppError> {
    match kind {
        ErrorKind::UniqueViolation => Some(AppError::Conflict(
            "An employee with this email already exists".to_string(),
        )),
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            Some(AppError::Validation(message.to_string()))
        }
        _ => None,
    }
}

/// Create an employee (admin); the id is assigned by the store
#[utoipa::path(
    post,
    path = "/profile",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee added successfully",
            "employee": { "id": 12, "full_name": "Ayu Lestari" }
        })),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn create_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<NewEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    if payload.full_name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(AppError::Validation(
            "full_name and email are required".to_string(),
        ));
    }

    let insert = sqlx::query(
        r#"
        INSERT INTO employees
            (full_name, email, position, department, start_date, probation_end, contract_type,
             annual_leave_balance, personal_leave_balance, wellbeing_day_balance,
             bank_account, npwp_number, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.full_name.trim())
    .bind(payload.email.trim())
    .bind(&payload.position)
    .bind(&payload.department)
    .bind(payload.start_date)
    .bind(payload.probation_end)
    .bind(&payload.contract_type)
    .bind(payload.annual_leave_balance)
    .bind(payload.personal_leave_balance)
    .bind(payload.wellbeing_day_balance)
    .bind(&payload.bank_account)
    .bind(&payload.npwp_number)
    .bind(&payload.status);

    let result = with_timeout(config.store_timeout(), async {
        insert.execute(pool.get_ref()).await.map_err(write_error)
    })
    .await?;

    let employee = fetch_employee(&pool, &config, result.last_insert_id()).await?;

    info!(employee_id = employee.id, by = auth.employee_id, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee added successfully",
        "employee": employee
    })))
}

/// Contract status of an employee
#[utoipa::path(
    get,
    path = "/profile/{employee_id}/contract",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Contract status", body = ContractStatus),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn contract_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    let contract = with_timeout(
        config.store_timeout(),
        sqlx::query_as::<_, ContractStatus>(
            "SELECT contract_type, start_date, probation_end, status FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(pool.get_ref()),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(HttpResponse::Ok().json(contract))
}

/// The three leave balances of an employee
#[utoipa::path(
    get,
    path = "/profile/{employee_id}/leave-balance",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Leave balances", body = crate::model::leave_request::LeaveBalances),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn leave_balance(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    let balances = service.balances(employee_id).await?;
    Ok(HttpResponse::Ok().json(balances))
}
