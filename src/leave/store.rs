use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::model::leave_request::{LeaveBalances, LeaveCategory, LeaveRequest, LeaveStatus};

/// A validated request ready to be reserved against a balance.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub category: LeaveCategory,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub status: LeaveStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub request: LeaveRequest,
    pub remaining_balance: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub request: LeaveRequest,
    pub returned_days: u32,
    pub new_balance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Storage for leave requests and the balances they draw from.
///
/// `reserve`, `release` and `decide` must each be atomic: the balance change
/// and the request change land together or not at all, and concurrent calls
/// for the same employee are serialized.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn balances(&self, employee_id: u64) -> Result<Option<LeaveBalances>, AppError>;

    /// Decrements the category balance by `days` only if it covers them,
    /// then records the request. Fails with `NotFound`, `InsufficientBalance`
    /// or `Conflict` (a non-rejected request already starts on that date).
    async fn reserve(&self, request: NewLeaveRequest) -> Result<Reservation, AppError>;

    /// Deletes the most recent request starting on `start_date` and gives its
    /// days back. Only `pending` requests can be released.
    async fn release(&self, employee_id: u64, start_date: NaiveDate)
    -> Result<Release, AppError>;

    /// Settles a pending request. Rejection gives the days back.
    async fn decide(&self, leave_id: u64, decision: Decision) -> Result<LeaveRequest, AppError>;

    async fn find(&self, leave_id: u64) -> Result<Option<LeaveRequest>, AppError>;

    /// Newest first.
    async fn history(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, AppError>;
}
