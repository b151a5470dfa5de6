//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::{AuthConfig, AuthGateway, MemoryCredentialStore, MemorySessionStore, api_router};
use axum::{
    Router, http,
    http::{Method, header},
    routing::get,
};
use platform::rate_limit::{MemoryRateLimitStore, RateLimitStore};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

type Gateway = AuthGateway<MemoryCredentialStore, MemorySessionStore>;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                //.unwrap_or_else(|_| "api=debug,auth=debug,tower_http=debug".into()),
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuthConfig::from_env()?;
    tracing::info!(?config, "Auth configuration loaded");

    let gateway: Gateway = AuthGateway::new(
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(MemorySessionStore::new()),
        config,
    );
    let limiter = Arc::new(MemoryRateLimitStore::new());

    // A failed bootstrap should not prevent server startup
    match gateway.ensure_bootstrap_admin().await {
        Ok(true) => tracing::info!("Bootstrap admin created"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Bootstrap admin failed, continuing anyway"),
    }

    spawn_session_sweep(gateway.clone(), gateway.config().session_sweep_interval);
    spawn_rate_limit_sweep(limiter.clone(), gateway.config().rate_limit_sweep_interval);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    let app = app(gateway, limiter)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Routes without the outer transport layers
fn app(gateway: Gateway, limiter: Arc<MemoryRateLimitStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api_router(gateway, limiter))
}

async fn health() -> &'static str {
    "ok"
}

/// Periodically deactivate expired sessions and prune old records
fn spawn_session_sweep(gateway: Gateway, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match gateway.sweep_expired_sessions().await {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "Expired sessions swept"),
                Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
            }
        }
    });
}

/// Periodically drop rate-limit counters whose window has closed
fn spawn_rate_limit_sweep(limiter: Arc<MemoryRateLimitStore>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match limiter.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Rate limit counters purged"),
                Err(e) => tracing::warn!(error = %e, "Rate limit purge failed"),
            }
        }
    });
}
