use crate::{auth::auth::AuthUser, config::Config, db::with_timeout, error::AppError};
use actix_web::{HttpResponse, web};
use serde_json::Value;
use sqlx::MySqlPool;

/// A read-only, per-employee HR record list exposed as `GET /{path}/{employee_id}`.
#[derive(Debug, Clone, Copy)]
pub struct RecordKind {
    pub path: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub order_by: Option<&'static str>,
}

pub const RECORD_KINDS: &[RecordKind] = &[
    RecordKind {
        path: "payslips",
        table: "payslips",
        columns: &["period", "file_url"],
        order_by: Some("period DESC"),
    },
    RecordKind {
        path: "performance-review",
        table: "performance_review",
        columns: &["result", "period", "year", "detail", "development_plan"],
        order_by: None,
    },
    RecordKind {
        path: "kpi",
        table: "kpi",
        columns: &["kpi"],
        order_by: None,
    },
    RecordKind {
        path: "reward",
        table: "reward",
        columns: &["reward"],
        order_by: None,
    },
    RecordKind {
        path: "disciplinary",
        table: "disciplinary",
        columns: &["disciplinary", "outcome_letter"],
        order_by: None,
    },
    RecordKind {
        path: "grievance",
        table: "grievance",
        columns: &["grievance", "follow_up", "document"],
        order_by: None,
    },
    RecordKind {
        path: "incident",
        table: "incident",
        columns: &["incident", "follow_up", "document"],
        order_by: None,
    },
    RecordKind {
        path: "timesheet",
        table: "timesheet",
        columns: &["timesheet"],
        order_by: None,
    },
    RecordKind {
        path: "overtime",
        table: "overtime",
        columns: &["ot_record"],
        order_by: None,
    },
    RecordKind {
        path: "clearance",
        table: "clearance",
        columns: &[
            "resignation_date",
            "last_day",
            "exit_interview",
            "final_pay",
            "revoke_it_access",
            "collect_returned_assets",
            "insurance_termination",
            "related_document",
        ],
        order_by: None,
    },
    RecordKind {
        path: "onboarding",
        table: "onboarding",
        columns: &[
            "pre_day_one",
            "day_one",
            "week_one",
            "first_month",
            "day_30",
            "related_document",
        ],
        order_by: None,
    },
    RecordKind {
        path: "transfer",
        table: "transfer",
        columns: &[
            "last_position",
            "last_position_period",
            "new_position",
            "start_date_of_new_position",
        ],
        order_by: None,
    },
    RecordKind {
        path: "workmode",
        table: "work_mode",
        columns: &["work_mode"],
        order_by: None,
    },
    RecordKind {
        path: "remote-checklist",
        table: "remote_checklist",
        columns: &[
            "work_mode",
            "approval",
            "internet",
            "vpn_access",
            "company_devices",
            "work_schedule",
        ],
        order_by: None,
    },
    RecordKind {
        path: "remote-request",
        table: "remote_request",
        columns: &["work_mode", "reason", "status"],
        order_by: Some("requested_at DESC"),
    },
];

impl RecordKind {
    /// One JSON object per row, keyed by column name.
    pub fn select_sql(&self) -> String {
        let fields = self
            .columns
            .iter()
            .map(|c| format!("'{c}', {c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "SELECT JSON_OBJECT({fields}) AS record FROM {} WHERE employee_id = ?",
            self.table
        );
        if let Some(order) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        sql
    }
}

/// Shared handler for every record kind; the kind rides in resource app data.
#[utoipa::path(
    get,
    path = "/{record}/{employee_id}",
    params(
        ("record", Path, description = "payslips, performance-review, kpi, reward, disciplinary, grievance, incident, timesheet, overtime, clearance, onboarding, transfer, workmode, remote-checklist or remote-request"),
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Records of the employee", body = Object),
        (status = 403, description = "Access denied")
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn list_records(
    auth: AuthUser,
    kind: web::Data<RecordKind>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_access(employee_id)?;

    let sql = kind.select_sql();
    let rows = with_timeout(
        config.store_timeout(),
        sqlx::query_scalar::<_, sqlx::types::Json<Value>>(&sql)
            .bind(employee_id)
            .fetch_all(pool.get_ref()),
    )
    .await?;

    let records: Vec<Value> = rows.into_iter().map(|json| json.0).collect();
    Ok(HttpResponse::Ok().json(records))
}
