use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Balance category a leave type draws from.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveCategory {
    Annual,
    Personal,
    Wellbeing,
}

impl LeaveCategory {
    /// Resolves a free-form leave type ("Annual Leave", "wellbeing day", ...)
    /// by substring match on its normalized form.
    pub fn resolve(leave_type: &str) -> Option<Self> {
        let normalized = normalize_leave_type(leave_type);

        if normalized.contains("annual") {
            Some(LeaveCategory::Annual)
        } else if normalized.contains("personal") {
            Some(LeaveCategory::Personal)
        } else if normalized.contains("wellbeing") {
            Some(LeaveCategory::Wellbeing)
        } else {
            None
        }
    }

    /// Column on `employees` holding this category's balance.
    pub fn balance_column(&self) -> &'static str {
        match self {
            LeaveCategory::Annual => "annual_leave_balance",
            LeaveCategory::Personal => "personal_leave_balance",
            LeaveCategory::Wellbeing => "wellbeing_day_balance",
        }
    }
}

/// Lower-cases and collapses whitespace runs into `_`.
pub fn normalize_leave_type(leave_type: &str) -> String {
    leave_type
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual_leave")]
    pub leave_type: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub days: u32,
    pub status: LeaveStatus,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
}

/// The three day-count balances of one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalances {
    #[schema(example = 12)]
    pub annual_leave_balance: u32,
    #[schema(example = 3)]
    pub personal_leave_balance: u32,
    #[schema(example = 2)]
    pub wellbeing_day_balance: u32,
}

impl LeaveBalances {
    pub fn get(&self, category: LeaveCategory) -> u32 {
        match category {
            LeaveCategory::Annual => self.annual_leave_balance,
            LeaveCategory::Personal => self.personal_leave_balance,
            LeaveCategory::Wellbeing => self.wellbeing_day_balance,
        }
    }

    pub fn get_mut(&mut self, category: LeaveCategory) -> &mut u32 {
        match category {
            LeaveCategory::Annual => &mut self.annual_leave_balance,
            LeaveCategory::Personal => &mut self.personal_leave_balance,
            LeaveCategory::Wellbeing => &mut self.wellbeing_day_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_leave_type("Annual  Leave"), "annual_leave");
        assert_eq!(normalize_leave_type("Wellbeing\tDay"), "wellbeing_day");
    }

    #[test]
    fn resolves_category_by_substring() {
        assert_eq!(LeaveCategory::resolve("Annual Leave"), Some(LeaveCategory::Annual));
        assert_eq!(LeaveCategory::resolve("PERSONAL"), Some(LeaveCategory::Personal));
        assert_eq!(
            LeaveCategory::resolve("Wellbeing Day"),
            Some(LeaveCategory::Wellbeing)
        );
        assert_eq!(LeaveCategory::resolve("sick"), None);
    }

    #[test]
    fn balances_index_by_category() {
        let mut balances = LeaveBalances {
            annual_leave_balance: 10,
            personal_leave_balance: 4,
            wellbeing_day_balance: 1,
        };
        assert_eq!(balances.get(LeaveCategory::Personal), 4);

        *balances.get_mut(LeaveCategory::Wellbeing) += 2;
        assert_eq!(balances.wellbeing_day_balance, 3);
    }

    #[test]
    fn status_round_trips_through_its_stored_name() {
        use std::str::FromStr;

        assert_eq!(LeaveStatus::Pending.as_ref(), "pending");
        assert_eq!(LeaveStatus::from_str("rejected").unwrap(), LeaveStatus::Rejected);
    }
}
