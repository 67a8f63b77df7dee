//! AHWR frontend
//!
//! Single-binary service that:
//! 1. Sends users to Defra ID to sign in (authorization code + PKCE)
//! 2. Asks them to confirm the organisation details held for their claim
//! 3. Hands them to the Land and Farm Service when those details are wrong

mod config;
mod error;
mod metrics;
mod routes;
mod session;
mod view;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum_extra::extract::cookie::Key;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::routes::{check_details, sign_in, update_details};
use crate::session::{MemorySessionStore, SessionStore};

/// How long in-flight requests may run after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub(crate) struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    /// Signs the session cookie; derived from COOKIE_PASSWORD
    pub cookie_key: Key,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, prometheus: PrometheusHandle) -> Self {
        let sessions: Arc<dyn SessionStore> =
            Arc::new(MemorySessionStore::new(config.cache.expires_in));
        // The loader guarantees at least 32 characters, which derive_from requires.
        let cookie_key = Key::derive_from(config.cookie.password.expose().as_bytes());
        Self {
            config: Arc::new(config),
            sessions,
            cookie_key,
            prometheus,
            started_at: Instant::now(),
        }
    }
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/sign-in", get(sign_in::sign_in))
        .route(
            "/check-details",
            get(check_details::show).post(check_details::submit),
        )
        .route("/update-details", get(update_details::redirect))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting ahwr-frontend");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        env = ?config.env,
        port = config.port,
        namespace = config.namespace.as_deref().unwrap_or(""),
        lfs_update_enabled = config.lfs_update.enabled,
        dev_login_enabled = config.dev_login_enabled,
        "configuration loaded"
    );
    if config.use_redis {
        warn!(
            host = %config.cache.host,
            port = config.cache.port,
            "redis session cache is not available in this build, using in-memory sessions"
        );
    }

    let prometheus = metrics::install_recorder().context("failed to install metrics recorder")?;
    let listen_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = build_router(AppState::new(config, prometheus));

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires, not when the
    // server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Liveness endpoint: always 200 once the listener is up.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": "healthy",
            "uptime_seconds": state.started_at.elapsed().as_secs(),
        })
        .to_string(),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
