use crate::{
    api::{leave, profile, records, requests, system, training},
    auth::handlers,
    config::Config,
    error::AppError,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{http::header, web};
use anyhow::anyhow;

type Limit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Limiter state lives in the config, so one `RateLimits` shared by all
/// workers gives one budget per client address.
#[derive(Clone)]
pub struct RateLimits {
    login: Limit,
    verify: Limit,
    protected: Limit,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: per_minute(config.rate_login_per_min)?,
            verify: per_minute(config.rate_verify_per_min)?,
            protected: per_minute(config.rate_protected_per_min)?,
        })
    }
}

fn per_minute(requests_per_min: u32) -> anyhow::Result<Limit> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {} per minute", requests_per_min))
}

/// Browser access for the configured origins; `*` allows any origin.
pub fn cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_any_origin();
    }

    config
        .cors_allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Malformed JSON or path segments are client errors in the common error shape
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );

    // Public routes
    cfg.service(system::index)
        .service(web::resource("/health").route(web::get().to(system::health)))
        .service(
            web::resource("/login-request")
                .wrap(Governor::new(&limits.login))
                .route(web::post().to(handlers::login_request)),
        )
        .service(
            web::resource("/verify-token")
                .wrap(Governor::new(&limits.verify))
                .route(web::post().to(handlers::verify_token)),
        );

    // Protected routes: every handler takes an `AuthUser`
    let mut protected = web::scope(&config.api_prefix)
        .service(web::resource("/protected").route(web::get().to(handlers::protected)))
        // /profile
        .service(
            web::resource("/profile")
                .route(web::get().to(profile::get_own_profile))
                .route(web::post().to(profile::create_profile)),
        )
        .service(
            web::resource("/admin/profile/{employee_id}")
                .route(web::get().to(profile::get_profile)),
        )
        .service(
            web::resource("/profile/{employee_id}")
                .route(web::patch().to(profile::update_profile)),
        )
        .service(
            web::resource("/profile/{employee_id}/contract")
                .route(web::get().to(profile::contract_status)),
        )
        .service(
            web::resource("/profile/{employee_id}/leave-balance")
                .route(web::get().to(profile::leave_balance)),
        )
        // leave workflow
        .service(web::resource("/leave-preview").route(web::post().to(leave::preview_leave)))
        .service(web::resource("/leave/apply").route(web::post().to(leave::apply_leave)))
        .service(web::resource("/leave/cancel").route(web::post().to(leave::cancel_leave)))
        .service(
            web::resource("/leave/requests/{employee_id}")
                .route(web::get().to(leave::leave_history)),
        )
        .service(web::resource("/leave/{leave_id}").route(web::get().to(leave::get_leave)))
        .service(
            web::resource("/leave/{leave_id}/approve").route(web::put().to(leave::approve_leave)),
        )
        .service(
            web::resource("/leave/{leave_id}/reject").route(web::put().to(leave::reject_leave)),
        )
        // trainings
        .service(
            web::resource("/trainings/{employee_id}")
                .route(web::get().to(training::list_trainings)),
        )
        .service(
            web::resource("/trainings/{employee_id}/feedback")
                .route(web::post().to(training::training_feedback)),
        )
        // submissions
        .service(
            web::resource("/remote-request")
                .route(web::post().to(requests::submit_remote_request)),
        )
        .service(
            web::resource("/internal-application")
                .route(web::post().to(requests::submit_internal_application)),
        );

    // /{record}/{employee_id}
    for kind in records::RECORD_KINDS {
        protected = protected.service(
            web::resource(format!("/{}/{{employee_id}}", kind.path))
                .app_data(web::Data::new(*kind))
                .route(web::get().to(records::list_records)),
        );
    }

    cfg.service(protected.wrap(Governor::new(&limits.protected)));
}
