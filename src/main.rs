use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod leave;
mod mail;
mod model;
mod models;
mod routes;
mod utils;

#[cfg(test)]
mod fake_store;

use crate::auth::store::{LoginStore, MySqlLoginStore};
use crate::docs::ApiDoc;
use crate::leave::mysql::MySqlLeaveStore;
use crate::leave::service::LeaveService;
use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::routes::RateLimits;
use config::Config;
use db::init_db;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "hris.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        approval = %config.leave_approval_mode,
        origins = ?config.cors_allowed_origins,
        "Server starting..."
    );

    let pool = init_db(&config).await?;

    let leave_service = Data::new(LeaveService::new(
        Arc::new(MySqlLeaveStore::new(pool.clone())),
        config.leave_approval_mode,
        config.store_timeout(),
    ));

    let login_store: Data<dyn LoginStore> =
        Data::from(Arc::new(MySqlLoginStore::new(pool.clone())) as Arc<dyn LoginStore>);

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            warn!("SMTP_HOST not set, login codes are written to the log");
            Arc::new(LogMailer)
        }
    };
    let mailer: Data<dyn Mailer> = Data::from(mailer);

    let limits = RateLimits::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());
    let pool_data = Data::new(pool);

    HttpServer::new(move || {
        let config = config.clone();
        let limits = limits.clone();

        App::new()
            .wrap(NormalizePath::trim())
            .wrap(routes::cors(&config))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(leave_service.clone())
            .app_data(login_store.clone())
            .app_data(mailer.clone())
            .configure(move |cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
