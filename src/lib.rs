//! Portfolio API - library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod rate_limit;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::mail::{Mailer, Notifier};
use crate::state::AppState;

/// CORS restricted to the configured origins, credentials allowed.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config.allowed_origins);
    let body_limit = state.config.max_upload_bytes;
    tracing::info!(origins = ?state.config.allowed_origins, "CORS configured");

    Router::new()
        .route("/api/auth/status", get(routes::auth::status))
        .route(
            "/api/blogs",
            get(routes::blog::list_posts).post(routes::blog::create_post),
        )
        .route("/api/blogs/tag/{tag}", get(routes::blog::posts_by_tag))
        // GET takes a slug, PUT and DELETE a numeric id
        .route(
            "/api/blogs/{key}",
            get(routes::blog::get_post)
                .put(routes::blog::update_post)
                .delete(routes::blog::delete_post),
        )
        .route(
            "/api/projects",
            get(routes::project::list_projects).post(routes::project::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::project::get_project)
                .put(routes::project::update_project)
                .delete(routes::project::delete_project),
        )
        .route(
            "/api/social-links",
            get(routes::social_link::list_links).post(routes::social_link::create_link),
        )
        .route(
            "/api/social-links/{id}",
            delete(routes::social_link::delete_link),
        )
        .route(
            "/api/contact",
            post(routes::contact::submit_contact).get(routes::contact::list_messages),
        )
        .route(
            "/api/contact/{id}/voice-memo",
            get(routes::contact::download_voice_memo),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn(error::json_payload_too_large))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init(&logging::LoggingConfig::from_env());

    routes::health::init_start_time();

    let config = AppConfig::from_env();

    if config.is_production() {
        if config.identity_secret.trim().is_empty() {
            panic!(
                "FATAL: IDENTITY_JWT_SECRET must be set in production. \
                 Refusing to start without a way to verify the administrator."
            );
        }
        if config.admin_email.is_empty() || config.admin_email == "admin@example.com" {
            tracing::warn!(
                "SECURITY: ADMIN_EMAIL is using an insecure default. \
                 Set ADMIN_EMAIL to the identity the administrator signs in with."
            );
        }
    }

    let (pool, stores) = match db::open_storage(config.database.as_ref()).await {
        Ok(storage) => storage,
        Err(e) => panic!(
            "FATAL: DATABASE_URL is set but the database is unusable: {e}. \
             Refusing to start without durable storage; unset DATABASE_URL to run in memory."
        ),
    };

    let mailer = Mailer::from_config_or_log_only(&config.mail);
    let notifier = Notifier::spawn(mailer);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT configuration");

    let state = AppState::new(config, pool, stores, notifier);
    state.rate_limiter.spawn_sweeper();

    if let Err(e) = state.blogs.seed_sample_post().await {
        tracing::warn!(error = %e, "Failed to seed sample blog post");
    }

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
