use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::config::Config;
use crate::error::AppError;

pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.store_timeout())
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Bounds one upstream call; an elapsed timer becomes `AppError::Timeout`.
pub async fn with_timeout<T, E, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<AppError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Upstream call timed out");
            Err(AppError::Timeout(limit.as_millis() as u64))
        }
    }
}
