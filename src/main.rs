//! GearShare Backend Server
//!
//! Rust backend for the GearShare peer-to-peer gear rental marketplace,
//! providing the booking lifecycle API backed by PostgreSQL and Stripe.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gearshare_backend::booking::{BookingService, PgBookingStore};
use gearshare_backend::config::Config;
use gearshare_backend::db;
use gearshare_backend::gear::PgGearStore;
use gearshare_backend::messaging::LogMessaging;
use gearshare_backend::payments::StripeProvider;
use gearshare_backend::routes;
use gearshare_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting up");

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    // Wire up the booking service with its production collaborators
    let booking_store = Arc::new(PgBookingStore::new(pool.clone()));
    let gear_store = Arc::new(PgGearStore::new(pool.clone()));
    let payments = Arc::new(StripeProvider::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    ));
    let messaging = Arc::new(LogMessaging);

    let booking_service = Arc::new(BookingService::new(
        booking_store,
        gear_store,
        payments,
        messaging,
        config.currency.clone(),
    ));

    let app_state = AppState::new(booking_service, config.payment_webhook_secret.clone());

    let health_pool = pool.clone();
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_pool.clone())))
        .merge(routes::booking_routes())
        .merge(routes::payment_routes())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "GearShare API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let db_status = match db::check_health(&pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &gearshare_backend::config::Config) -> CorsLayer {
    let allowed_origins_str = config.cors_allowed_origins.clone().unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
