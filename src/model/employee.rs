use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "full_name": "Ayu Lestari",
        "email": "ayu.lestari@company.com",
        "position": "Data Analyst",
        "department": "Finance",
        "start_date": "2024-01-08",
        "probation_end": "2024-04-08",
        "contract_type": "permanent",
        "annual_leave_balance": 12,
        "personal_leave_balance": 3,
        "wellbeing_day_balance": 2,
        "bank_account": "1234567890",
        "npwp_number": "09.254.294.3-407.000",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Ayu Lestari")]
    pub full_name: String,

    #[schema(example = "ayu.lestari@company.com")]
    pub email: String,

    #[schema(nullable = true)]
    pub position: Option<String>,

    #[schema(nullable = true)]
    pub department: Option<String>,

    #[schema(value_type = String, format = "date", nullable = true)]
    pub start_date: Option<NaiveDate>,

    #[schema(value_type = String, format = "date", nullable = true)]
    pub probation_end: Option<NaiveDate>,

    #[schema(nullable = true)]
    pub contract_type: Option<String>,

    pub annual_leave_balance: u32,
    pub personal_leave_balance: u32,
    pub wellbeing_day_balance: u32,

    #[schema(nullable = true)]
    pub bank_account: Option<String>,

    #[schema(nullable = true)]
    pub npwp_number: Option<String>,

    #[schema(example = "active", nullable = true)]
    pub status: Option<String>,
}

/// Contract-related subset of an employee.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ContractStatus {
    pub contract_type: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub probation_end: Option<NaiveDate>,
    pub status: Option<String>,
}

pub const EMPLOYEE_COLUMNS: &str = "id, full_name, email, position, department, start_date, \
     probation_end, contract_type, annual_leave_balance, personal_leave_balance, \
     wellbeing_day_balance, bank_account, npwp_number, status";

/// Columns an admin may PATCH. Balances only move through the leave workflow.
pub const PATCHABLE_COLUMNS: &[&str] = &[
    "full_name",
    "email",
    "position",
    "department",
    "start_date",
    "probation_end",
    "contract_type",
    "bank_account",
    "npwp_number",
    "status",
];
