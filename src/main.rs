//! Questline Backend Server
//!
//! Serves wallet login (nonce challenge, signature verification, session
//! tokens) and the authenticated profile endpoints.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use chrono::Duration;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use questline_server::auth::{AuthService, ChallengeService, NonceRegistry, TokenService};
use questline_server::clock::{Clock, SystemClock};
use questline_server::config::Config;
use questline_server::db;
use questline_server::routes::app_router;
use questline_server::state::AppState;
use questline_server::store::{InMemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting Questline server");

    let user_store: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!(
                database = ?config.database_url_masked(),
                "Using Postgres user store"
            );
            let pool = db::create_pool(database_url, config.db_max_connections).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory user store");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let registry = Arc::new(NonceRegistry::new(
        Duration::seconds(config.auth_nonce_ttl_seconds),
        clock.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        ChallengeService::new(registry, config.app_name.clone()),
        TokenService::new(
            &config.jwt_secret,
            Duration::seconds(config.session_ttl_seconds),
            clock.clone(),
        ),
        user_store.clone(),
        clock,
    ));

    let app_state = AppState::new(auth_service, user_store);

    let app = app_router(app_state).layer(configure_cors(&config));

    let host = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid HOST: {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins = config.cors_allowed_origins.as_deref().unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
