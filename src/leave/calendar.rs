//! Working-day arithmetic and the pre-storage checks on a leave request.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::AppError;
use crate::model::leave_request::LeaveCategory;

/// Upper bound on a single request: one working year.
pub const MAX_LEAVE_DAYS: u32 = 260;

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Date of the `days`-th working day counted inclusively from `start`.
///
/// Weekend days are walked over but never counted, so a Friday start with
/// `days = 2` ends on the following Monday. Returns `None` for `days = 0`
/// or when the calendar runs out.
pub fn working_day_end_date(start: NaiveDate, days: u32) -> Option<NaiveDate> {
    if days == 0 {
        return None;
    }

    let mut cursor = start;
    let mut counted = 0;
    loop {
        if is_working_day(cursor) {
            counted += 1;
            if counted == days {
                return Some(cursor);
            }
        }
        cursor = cursor.succ_opt()?;
    }
}

/// Checks a request before any storage is involved and resolves its
/// balance category. Rules run in a fixed order: weekend start, backdated
/// start, unknown leave type, day count.
pub fn validate_request(
    leave_type: &str,
    start_date: NaiveDate,
    days: u32,
    today: NaiveDate,
) -> Result<LeaveCategory, AppError> {
    if !is_working_day(start_date) {
        return Err(AppError::Validation(
            "Leave start date cannot fall on a Saturday or Sunday".to_string(),
        ));
    }

    if start_date < today {
        return Err(AppError::Validation(
            "Leave start date cannot be in the past".to_string(),
        ));
    }

    let category = LeaveCategory::resolve(leave_type).ok_or_else(|| {
        AppError::Validation(format!(
            "Invalid leave type '{}'. Allowed: annual, personal, wellbeing",
            leave_type
        ))
    })?;

    if days == 0 || days > MAX_LEAVE_DAYS {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {}",
            MAX_LEAVE_DAYS
        )));
    }

    Ok(category)
}
