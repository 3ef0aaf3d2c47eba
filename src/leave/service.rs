use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::calendar::{validate_request, working_day_end_date};
use super::store::{Decision, LeaveStore, NewLeaveRequest, Release, Reservation};
use crate::config::ApprovalMode;
use crate::db::with_timeout;
use crate::error::AppError;
use crate::model::leave_request::{
    LeaveBalances, LeaveCategory, LeaveRequest, LeaveStatus, normalize_leave_type,
};

/// Caller-supplied part of a leave application.
#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub employee_id: u64,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeavePreview {
    pub sufficient: bool,
    pub confirmed: bool,
    pub category: LeaveCategory,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub days: u32,
    pub current_balance: u32,
    pub remaining_balance: u32,
    pub message: String,
}

/// Leave balance workflow: validation and end-date derivation up front,
/// then a single atomic store call per mutation.
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    approval: ApprovalMode,
    timeout: Duration,
}

struct Checked {
    category: LeaveCategory,
    end_date: NaiveDate,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, approval: ApprovalMode, timeout: Duration) -> Self {
        Self {
            store,
            approval,
            timeout,
        }
    }

    fn check(&self, application: &LeaveApplication, today: NaiveDate) -> Result<Checked, AppError> {
        let category = validate_request(
            &application.leave_type,
            application.start_date,
            application.days,
            today,
        )?;
        let end_date = working_day_end_date(application.start_date, application.days)
            .ok_or_else(|| AppError::Validation("Leave period is out of range".to_string()))?;
        Ok(Checked { category, end_date })
    }

    pub async fn balances(&self, employee_id: u64) -> Result<LeaveBalances, AppError> {
        with_timeout(self.timeout, self.store.balances(employee_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
    }

    pub async fn preview(
        &self,
        application: &LeaveApplication,
        today: NaiveDate,
    ) -> Result<LeavePreview, AppError> {
        let checked = self.check(application, today)?;
        let current_balance = self
            .balances(application.employee_id)
            .await?
            .get(checked.category);

        let sufficient = current_balance >= application.days;
        let remaining_balance = if sufficient {
            current_balance - application.days
        } else {
            current_balance
        };

        Ok(LeavePreview {
            sufficient,
            confirmed: sufficient,
            category: checked.category,
            start_date: application.start_date,
            end_date: checked.end_date,
            days: application.days,
            current_balance,
            remaining_balance,
            message: if sufficient {
                "Balance is sufficient. You may proceed with the request.".to_string()
            } else {
                "Balance is insufficient for this leave.".to_string()
            },
        })
    }

    #[instrument(name = "leave_apply", skip(self, application), fields(employee_id = application.employee_id))]
    pub async fn apply(
        &self,
        application: LeaveApplication,
        today: NaiveDate,
    ) -> Result<Reservation, AppError> {
        let checked = self.check(&application, today)?;

        let status = match self.approval {
            ApprovalMode::Manual => LeaveStatus::Pending,
            ApprovalMode::Auto => LeaveStatus::Approved,
        };

        let reservation = with_timeout(
            self.timeout,
            self.store.reserve(NewLeaveRequest {
                employee_id: application.employee_id,
                category: checked.category,
                leave_type: normalize_leave_type(&application.leave_type),
                start_date: application.start_date,
                end_date: checked.end_date,
                days: application.days,
                status,
                requested_at: Utc::now(),
            }),
        )
        .await?;

        info!(
            leave_id = reservation.request.id,
            days = application.days,
            remaining = reservation.remaining_balance,
            status = %status,
            "Leave request stored"
        );

        Ok(reservation)
    }

    #[instrument(name = "leave_cancel", skip(self))]
    pub async fn cancel(&self, employee_id: u64, start_date: NaiveDate) -> Result<Release, AppError> {
        let release = with_timeout(self.timeout, self.store.release(employee_id, start_date)).await?;

        info!(
            leave_id = release.request.id,
            returned_days = release.returned_days,
            new_balance = release.new_balance,
            "Leave request canceled"
        );

        Ok(release)
    }

    #[instrument(name = "leave_decide", skip(self))]
    pub async fn decide(&self, leave_id: u64, decision: Decision) -> Result<LeaveRequest, AppError> {
        let request = with_timeout(self.timeout, self.store.decide(leave_id, decision)).await?;
        info!(status = %request.status, "Leave request decided");
        Ok(request)
    }

    pub async fn find(&self, leave_id: u64) -> Result<LeaveRequest, AppError> {
        with_timeout(self.timeout, self.store.find(leave_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))
    }

    pub async fn history(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, AppError> {
        with_timeout(self.timeout, self.store.history(employee_id)).await
    }
}
