use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use dotenvy::dotenv;
use strum_macros::{Display, EnumString};

/// Whether a reserved leave request waits for an admin or is approved on the spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApprovalMode {
    Manual,
    Auto,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub db_max_connections: u32,
    pub store_timeout_ms: u64,

    // OTP login
    pub otp_ttl: i64,
    pub login_lookup_attempts: u32,
    pub login_lookup_delay_ms: u64,

    pub leave_approval_mode: ApprovalMode,
    /// Offset of the business day boundary; "today" for backdating checks.
    pub utc_offset: FixedOffset,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_verify_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    /// Browser origins allowed by CORS; `*` allows any.
    pub cors_allowed_origins: Vec<String>,

    pub log_dir: String,
    pub log_level: tracing::Level,

    pub smtp: Option<SmtpConfig>,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parse_or("SMTP_PORT", 465)?,
                user: required("SMTP_USER")?,
                pass: required("SMTP_PASS")?,
                from: required("SMTP_FROM")?,
            }),
            _ => None,
        };

        let mode = env::var("LEAVE_APPROVAL_MODE").unwrap_or_else(|_| "manual".to_string());
        let offset_minutes: i32 = parse_or("UTC_OFFSET_MINUTES", 0)?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", 3600)?, // 1 hour
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            store_timeout_ms: parse_or("STORE_TIMEOUT_MS", 5000)?,

            otp_ttl: parse_or("OTP_TTL", 600)?, // 10 min
            login_lookup_attempts: parse_or("LOGIN_LOOKUP_ATTEMPTS", 3)?,
            login_lookup_delay_ms: parse_or("LOGIN_LOOKUP_DELAY_MS", 500)?,

            leave_approval_mode: ApprovalMode::from_str(&mode)
                .with_context(|| format!("LEAVE_APPROVAL_MODE has unknown value '{}'", mode))?,
            utc_offset: utc_offset(offset_minutes)?,

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_verify_per_min: parse_or("RATE_VERIFY_PER_MIN", 30)?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_default(),
            cors_allowed_origins: split_list(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parse_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            smtp,
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn login_lookup_delay(&self) -> Duration {
        Duration::from_millis(self.login_lookup_delay_ms)
    }

    /// Calendar date at `now` on the business clock.
    pub fn business_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.business_date(Utc::now())
    }
}

fn utc_offset(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES is out of range: {}", minutes))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}
