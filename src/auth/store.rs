use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, prelude::FromRow};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct LoginToken {
    pub id: u64,
    pub employee_id: u64,
    /// argon2 hash of the code
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Persistence used by the OTP login flow.
#[async_trait]
pub trait LoginStore: Send + Sync {
    async fn employee_id_by_email(&self, email: &str) -> Result<Option<u64>, AppError>;

    async fn insert_login_token(
        &self,
        employee_id: u64,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Unused, unexpired tokens of one employee, newest first.
    async fn open_login_tokens(
        &self,
        employee_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<LoginToken>, AppError>;

    /// Marks a token used. `false` when someone else already did.
    async fn consume_login_token(&self, token_id: u64) -> Result<bool, AppError>;

    /// Stored role name of the employee's user account, if both exist.
    async fn role_of(&self, employee_id: u64) -> Result<Option<String>, AppError>;
}

pub struct MySqlLoginStore {
    pool: MySqlPool,
}

impl MySqlLoginStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginStore for MySqlLoginStore {
    async fn employee_id_by_email(&self, email: &str) -> Result<Option<u64>, AppError> {
        let id = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert_login_token(
        &self,
        employee_id: u64,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO login_tokens (employee_id, token, expires_at, used)
            VALUES (?, ?, ?, FALSE)
            "#,
        )
        .bind(employee_id)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn open_login_tokens(
        &self,
        employee_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<LoginToken>, AppError> {
        let tokens = sqlx::query_as::<_, LoginToken>(
            r#"
            SELECT id, employee_id, token, expires_at
            FROM login_tokens
            WHERE employee_id = ? AND used = FALSE AND expires_at > ?
            ORDER BY id DESC
            LIMIT 5
            "#,
        )
        .bind(employee_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(tokens)
    }

    async fn consume_login_token(&self, token_id: u64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE login_tokens SET used = TRUE WHERE id = ? AND used = FALSE")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn role_of(&self, employee_id: u64) -> Result<Option<String>, AppError> {
        let role = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.role
            FROM employees e
            INNER JOIN users u ON u.employee_id = e.id
            WHERE e.id = ?
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }
}
