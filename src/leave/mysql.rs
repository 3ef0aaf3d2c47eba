use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySqlConnection, MySqlPool, prelude::FromRow};
use tracing::debug;

use super::store::{Decision, LeaveStore, NewLeaveRequest, Release, Reservation};
use crate::error::AppError;
use crate::model::leave_request::{LeaveBalances, LeaveCategory, LeaveRequest, LeaveStatus};

const LEAVE_COLUMNS: &str =
    "id, employee_id, leave_type, start_date, end_date, days, status, requested_at";

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: u32,
    status: String,
    requested_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            AppError::Upstream(format!(
                "leave request {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row.leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            status,
            requested_at: row.requested_at,
        })
    }
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Takes the employee row lock; every balance mutation goes through here
/// first so concurrent workflows for one employee queue up.
async fn lock_employee(conn: &mut MySqlConnection, employee_id: u64) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ? FOR UPDATE")
        .bind(employee_id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

async fn read_balance(
    conn: &mut MySqlConnection,
    employee_id: u64,
    category: LeaveCategory,
) -> Result<Option<u32>, AppError> {
    let sql = format!(
        "SELECT {} FROM employees WHERE id = ?",
        category.balance_column()
    );
    let balance = sqlx::query_scalar::<_, u32>(&sql)
        .bind(employee_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

async fn restore_balance(
    conn: &mut MySqlConnection,
    employee_id: u64,
    category: LeaveCategory,
    days: u32,
) -> Result<u32, AppError> {
    let column = category.balance_column();
    let sql = format!("UPDATE employees SET {column} = {column} + ? WHERE id = ?");
    sqlx::query(&sql)
        .bind(days)
        .bind(employee_id)
        .execute(&mut *conn)
        .await?;

    read_balance(conn, employee_id, category)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
}

fn category_of(request: &LeaveRequest) -> Result<LeaveCategory, AppError> {
    LeaveCategory::resolve(&request.leave_type).ok_or_else(|| {
        AppError::Validation(format!(
            "Leave request {} has invalid leave type '{}'",
            request.id, request.leave_type
        ))
    })
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn balances(&self, employee_id: u64) -> Result<Option<LeaveBalances>, AppError> {
        let balances = sqlx::query_as::<_, LeaveBalances>(
            r#"
            SELECT annual_leave_balance, personal_leave_balance, wellbeing_day_balance
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(balances)
    }

    async fn reserve(&self, new: NewLeaveRequest) -> Result<Reservation, AppError> {
        let column = new.category.balance_column();
        let mut tx = self.pool.begin().await?;

        // conditional decrement; holds the employee row lock until commit
        let decrement = format!(
            "UPDATE employees SET {column} = {column} - ? WHERE id = ? AND {column} >= ?"
        );
        let decremented = sqlx::query(&decrement)
            .bind(new.days)
            .bind(new.employee_id)
            .bind(new.days)
            .execute(&mut *tx)
            .await?;

        if decremented.rows_affected() == 0 {
            let available = read_balance(&mut tx, new.employee_id, new.category).await?;
            tx.rollback().await?;
            return Err(match available {
                None => AppError::NotFound("Employee not found".to_string()),
                Some(available) => AppError::InsufficientBalance {
                    category: new.category,
                    available,
                    requested: new.days,
                },
            });
        }

        let duplicate = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT id FROM leave_requests
            WHERE employee_id = ? AND start_date = ? AND status <> 'rejected'
            LIMIT 1
            "#,
        )
        .bind(new.employee_id)
        .bind(new.start_date)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = duplicate {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Leave request {} already starts on {}",
                existing, new.start_date
            )));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, days, status, requested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(&new.leave_type)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.days)
        .bind(new.status.as_ref())
        .bind(new.requested_at)
        .execute(&mut *tx)
        .await?;

        let remaining_balance = read_balance(&mut tx, new.employee_id, new.category)
            .await?
            .unwrap_or_default();

        tx.commit().await?;

        let id = inserted.last_insert_id();
        debug!(leave_id = id, employee_id = new.employee_id, "Leave reserved");

        Ok(Reservation {
            request: LeaveRequest {
                id,
                employee_id: new.employee_id,
                leave_type: new.leave_type,
                start_date: new.start_date,
                end_date: new.end_date,
                days: new.days,
                status: new.status,
                requested_at: new.requested_at,
            },
            remaining_balance,
        })
    }

    async fn release(&self, employee_id: u64, start_date: NaiveDate) -> Result<Release, AppError> {
        let mut tx = self.pool.begin().await?;

        if !lock_employee(&mut tx, employee_id).await? {
            tx.rollback().await?;
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND start_date = ? ORDER BY id DESC LIMIT 1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(start_date)
            .fetch_optional(&mut *tx)
            .await?;

        let request: LeaveRequest = match row {
            Some(row) => row.try_into()?,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound("Leave request not found".to_string()));
            }
        };

        if request.status != LeaveStatus::Pending {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Only pending leave requests can be canceled".to_string(),
            ));
        }

        let category = category_of(&request)?;

        sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(request.id)
            .execute(&mut *tx)
            .await?;

        let new_balance = restore_balance(&mut tx, employee_id, category, request.days).await?;

        tx.commit().await?;

        Ok(Release {
            returned_days: request.days,
            request,
            new_balance,
        })
    }

    async fn decide(&self, leave_id: u64, decision: Decision) -> Result<LeaveRequest, AppError> {
        let employee_id = sqlx::query_scalar::<_, u64>(
            "SELECT employee_id FROM leave_requests WHERE id = ?",
        )
        .bind(leave_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

        let mut tx = self.pool.begin().await?;

        // same lock order as reserve/release: employee row, then request row
        if !lock_employee(&mut tx, employee_id).await? {
            tx.rollback().await?;
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(leave_id)
            .fetch_optional(&mut *tx)
            .await?;

        let mut request: LeaveRequest = match row {
            Some(row) => row.try_into()?,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound("Leave request not found".to_string()));
            }
        };

        if request.status != LeaveStatus::Pending {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Leave request already processed".to_string(),
            ));
        }

        let status = match decision {
            Decision::Approve => LeaveStatus::Approved,
            Decision::Reject => LeaveStatus::Rejected,
        };

        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(leave_id)
            .execute(&mut *tx)
            .await?;

        if decision == Decision::Reject {
            let category = category_of(&request)?;
            let balance = restore_balance(&mut tx, request.employee_id, category, request.days).await?;
            debug!(leave_id, balance, "Rejected leave returned to balance");
        }

        tx.commit().await?;

        request.status = status;
        Ok(request)
    }

    async fn find(&self, leave_id: u64) -> Result<Option<LeaveRequest>, AppError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(leave_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn history(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, AppError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE employee_id = ? \
             ORDER BY requested_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }
}

/// These run against a real MySQL loaded with `schema.sql`:
/// `DATABASE_URL=mysql://... cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::mysql::MySqlPoolOptions;

    async fn store() -> MySqlLeaveStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .unwrap();
        MySqlLeaveStore::new(pool)
    }

    /// A fresh employee per test, so runs never share rows.
    async fn hire(store: &MySqlLeaveStore, annual: u32) -> u64 {
        sqlx::query(
            "INSERT INTO employees (full_name, email, annual_leave_balance) VALUES (?, ?, ?)",
        )
        .bind("Store Test")
        .bind(format!("{}@store.test", uuid::Uuid::new_v4()))
        .bind(annual)
        .execute(&store.pool)
        .await
        .unwrap()
        .last_insert_id()
    }

    fn annual(employee_id: u64, start: (i32, u32, u32), days: u32) -> NewLeaveRequest {
        let start_date = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        NewLeaveRequest {
            employee_id,
            category: LeaveCategory::Annual,
            leave_type: "Annual Leave".to_string(),
            start_date,
            end_date: start_date,
            days,
            status: LeaveStatus::Pending,
            requested_at: Utc::now(),
        }
    }

    async fn annual_balance(store: &MySqlLeaveStore, employee_id: u64) -> u32 {
        store
            .balances(employee_id)
            .await
            .unwrap()
            .unwrap()
            .annual_leave_balance
    }

    #[actix_web::test]
    #[ignore = "needs DATABASE_URL"]
    async fn insufficient_balance_rolls_back() {
        let store = store().await;
        let id = hire(&store, 2).await;

        let err = store.reserve(annual(id, (2030, 1, 7), 3)).await.unwrap_err();
        assert_eq!(
            err,
            AppError::InsufficientBalance {
                category: LeaveCategory::Annual,
                available: 2,
                requested: 3,
            }
        );
        assert_eq!(annual_balance(&store, id).await, 2);
        assert!(store.history(id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    #[ignore = "needs DATABASE_URL"]
    async fn duplicate_start_rolls_back_the_decrement() {
        let store = store().await;
        let id = hire(&store, 10).await;

        let first = store.reserve(annual(id, (2030, 1, 7), 3)).await.unwrap();
        assert_eq!(first.remaining_balance, 7);

        let err = store.reserve(annual(id, (2030, 1, 7), 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(annual_balance(&store, id).await, 7);
        assert_eq!(store.history(id).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    #[ignore = "needs DATABASE_URL"]
    async fn cancel_of_decided_request_changes_nothing() {
        let store = store().await;
        let id = hire(&store, 10).await;
        let start = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();

        let reserved = store.reserve(annual(id, (2030, 1, 7), 3)).await.unwrap();
        store
            .decide(reserved.request.id, Decision::Approve)
            .await
            .unwrap();

        let err = store.release(id, start).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let kept = store.find(reserved.request.id).await.unwrap().unwrap();
        assert_eq!(kept.status, LeaveStatus::Approved);
        assert_eq!(annual_balance(&store, id).await, 7);
    }

    #[actix_web::test]
    #[ignore = "needs DATABASE_URL"]
    async fn cancel_and_reject_give_the_days_back() {
        let store = store().await;
        let id = hire(&store, 10).await;

        store.reserve(annual(id, (2030, 1, 7), 3)).await.unwrap();
        let released = store
            .release(id, NaiveDate::from_ymd_opt(2030, 1, 7).unwrap())
            .await
            .unwrap();
        assert_eq!(released.new_balance, 10);
        assert!(store.history(id).await.unwrap().is_empty());

        let reserved = store.reserve(annual(id, (2030, 2, 4), 4)).await.unwrap();
        let rejected = store
            .decide(reserved.request.id, Decision::Reject)
            .await
            .unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        assert_eq!(annual_balance(&store, id).await, 10);

        let err = store
            .decide(reserved.request.id, Decision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    #[ignore = "needs DATABASE_URL"]
    async fn concurrent_reserves_cannot_overcommit() {
        let store = store().await;
        let id = hire(&store, 5).await;

        let (a, b) = futures::join!(
            store.reserve(annual(id, (2030, 1, 7), 3)),
            store.reserve(annual(id, (2030, 1, 14), 3)),
        );

        let granted = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(granted, 1, "{a:?} / {b:?}");
        let refused = if a.is_ok() { b } else { a };
        assert!(matches!(
            refused,
            Err(AppError::InsufficientBalance { requested: 3, .. })
        ));

        assert_eq!(annual_balance(&store, id).await, 2);
        assert_eq!(store.history(id).await.unwrap().len(), 1);
    }
}
