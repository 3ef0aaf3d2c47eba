use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::SmtpConfig;
use crate::error::AppError;

/// Outbound mail used by the OTP login flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_login_code(&self, to: &str, code: &str) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .with_context(|| format!("invalid SMTP relay '{}'", config.host))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("SMTP_FROM '{}' is not a mailbox", config.from))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_login_code(&self, to: &str, code: &str) -> Result<(), AppError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("Invalid email address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Your OTP Code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your OTP code is {}", code))
            .map_err(|e| AppError::Internal(format!("otp email build failed: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Upstream(format!("mail relay: {}", e)))?;

        Ok(())
    }
}

/// Stand-in when no relay is configured: records the delivery in the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_login_code(&self, to: &str, code: &str) -> Result<(), AppError> {
        warn!(to, "SMTP not configured, login code not emailed");
        info!(to, code, "Login code issued");
        Ok(())
    }
}
