use crate::api::leave::{
    CancelLeaveDto, LeaveAppliedResponse, LeaveApplicationDto, LeaveCanceledResponse,
};
use crate::api::profile::NewEmployee;
use crate::api::requests::{InternalApplicationDto, RemoteRequestDto};
use crate::api::training::TrainingFeedbackDto;
use crate::leave::service::LeavePreview;
use crate::model::employee::{ContractStatus, Employee};
use crate::model::leave_request::{LeaveBalances, LeaveCategory, LeaveRequest, LeaveStatus};
use crate::models::{LoginRequestDto, VerifyTokenDto};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRIS API",
        version = "1.0.0",
        description = r#"
## Human Resources Information System (HRIS)

Employee self-service and HR administration over a MySQL store.

### Key Features
- **OTP Login**: a six-digit code is emailed, then exchanged for a JWT
- **Leave Management**: preview, apply, cancel, approve and reject. Balances
  are reserved when a request is stored and restored on cancel or rejection.
- **Profiles**: own profile, admin create/update, contract status, balances
- **HR Records**: payslips, trainings, reviews, KPI and other per-employee lists

### Security
Everything except login, health and these docs needs a **Bearer JWT**.
Admins may act on any employee; everyone else only on themselves.

### Errors
`{"error": "<kind>", "message": "..."}` with kinds `validation`,
`insufficient_balance`, `unauthorized`, `forbidden`, `not_found`, `conflict`,
`upstream`, `timeout` and `internal`.
"#,
    ),
    paths(
        crate::api::system::health,

        crate::auth::handlers::login_request,
        crate::auth::handlers::verify_token,
        crate::auth::handlers::protected,

        crate::api::profile::get_own_profile,
        crate::api::profile::get_profile,
        crate::api::profile::update_profile,
        crate::api::profile::create_profile,
        crate::api::profile::contract_status,
        crate::api::profile::leave_balance,

        crate::api::leave::preview_leave,
        crate::api::leave::apply_leave,
        crate::api::leave::cancel_leave,
        crate::api::leave::leave_history,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::training::list_trainings,
        crate::api::training::training_feedback,

        crate::api::requests::submit_remote_request,
        crate::api::requests::submit_internal_application,

        crate::api::records::list_records
    ),
    components(
        schemas(
            LoginRequestDto,
            VerifyTokenDto,
            Employee,
            NewEmployee,
            ContractStatus,
            LeaveBalances,
            LeaveCategory,
            LeaveStatus,
            LeaveRequest,
            LeaveApplicationDto,
            LeavePreview,
            LeaveAppliedResponse,
            CancelLeaveDto,
            LeaveCanceledResponse,
            TrainingFeedbackDto,
            RemoteRequestDto,
            InternalApplicationDto
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Auth", description = "OTP login and token check"),
        (name = "Profile", description = "Employee profile APIs"),
        (name = "Leave", description = "Leave balance workflow"),
        (name = "Training", description = "Training participation and feedback"),
        (name = "Requests", description = "Remote work requests and internal applications"),
        (name = "Records", description = "Per-employee HR record lists"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
