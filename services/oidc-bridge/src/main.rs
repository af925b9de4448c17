//! OpenID Connect Login Bridge
//!
//! Single-binary Rust service that:
//! 1. Discovers the identity provider and loads its signing keys
//! 2. Serves `/auth/start` and `/auth/complete` for browser and desktop logins
//! 3. Provisions users on first login and mints sessions or pairing tokens
//!
//! If discovery fails the service still starts, reporting `degraded` on
//! `/health` with the login routes unmounted.

mod config;
mod error;
mod metrics;
mod service;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use bridge::{BridgeState, Hosts};
use identity::{InMemoryDirectory, InMemoryPairingIssuer, InMemorySessionStore};
use oidc_client::OidcClient;
use state_store::CorrelationStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::service::{
    BridgeStatus, DRAIN_TIMEOUT, ServiceAction, ServiceEvent, ServiceState, handle_event,
};

/// Shared state for the service-level handlers
#[derive(Clone)]
struct AppState {
    bridge: BridgeStatus,
    store: Arc<CorrelationStore>,
    started_at: Instant,
    prometheus: PrometheusHandle,
}

/// Build the axum router. The `/auth/*` routes are merged only when the
/// provider client was built.
fn build_router(state: AppState, bridge: Option<BridgeState>, max_connections: usize) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);
    if let Some(bridge) = bridge {
        app = app.merge(bridge::routes(bridge));
    }
    app.layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
}

/// In-process host stores for standalone deployments.
fn in_memory_hosts(pairing_ttl: Duration) -> Hosts {
    Hosts {
        directory: Arc::new(InMemoryDirectory::new()),
        sessions: Arc::new(InMemorySessionStore::new()),
        pairing: Arc::new(InMemoryPairingIssuer::with_ttl(pairing_ttl)),
    }
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

    info!("starting oidc-bridge");

    let prometheus_handle = metrics::install_recorder();

    // --- State: Initializing ---
    let mut state = ServiceState::Initializing;

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        issuer = %config.oidc.issuer_url,
        client_id = %config.oidc.client_id,
        "configuration loaded"
    );

    let (new_state, action) = handle_event(
        state,
        ServiceEvent::ConfigLoaded {
            listen_addr: config.server.listen_addr,
        },
    );
    state = new_state;
    if action != ServiceAction::Discover {
        anyhow::bail!("unexpected action after ConfigLoaded: {action:?}");
    }
    info!("state: Discovering");

    let settings = config
        .oidc_settings()
        .context("client secret missing after config load")?;

    let client = match OidcClient::discover(reqwest::Client::new(), settings).await {
        Ok(client) => {
            info!(
                issuer = %client.metadata().issuer,
                authorization_endpoint = %client.metadata().authorization_endpoint,
                "identity provider discovered"
            );
            let (new_state, _) = handle_event(state, ServiceEvent::DiscoveryCompleted);
            state = new_state;
            Some(client)
        }
        Err(e) => {
            error!(error = %e, "identity provider discovery failed, login routes disabled");
            let (new_state, _) = handle_event(state, ServiceEvent::DiscoveryFailed(e.into()));
            state = new_state;
            None
        }
    };

    let (listen_addr, bridge_status) = match &state {
        ServiceState::Starting {
            listen_addr,
            bridge,
        } => (*listen_addr, bridge.clone()),
        other => anyhow::bail!("unexpected state after discovery: {other:?}"),
    };
    metrics::set_bridge_enabled(bridge_status.is_enabled());

    let store = Arc::new(CorrelationStore::new(
        config.state_ttl(),
        config.state.max_entries,
    ));
    let sweeper = state_store::spawn_sweeper(store.clone(), config.sweep_interval());

    let bridge_settings = config
        .bridge_settings()
        .context("invalid session settings")?;
    let bridge_state = client.map(|client| {
        let authorize = client.authorize_params().clone();
        BridgeState::new(
            authorize,
            Arc::new(client),
            store.clone(),
            in_memory_hosts(config.pairing_ttl()),
            bridge_settings,
        )
    });

    let app_state = AppState {
        bridge: bridge_status,
        store,
        started_at: Instant::now(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, bridge_state, config.server.max_connections);

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    let (new_state, _) = handle_event(state, ServiceEvent::ListenerReady);
    state = new_state;
    info!(addr = %listen_addr, "state: Running, accepting requests");

    // The drain timer starts at signal receipt, not at server start
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let (_state, action) = handle_event(state, ServiceEvent::ShutdownSignal);
    info!(?action, "state: Stopped, draining");

    let _ = shutdown_tx.send(());
    sweeper.abort();

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    metrics::set_bridge_enabled(false);

    info!("shutdown complete");
    Ok(())
}

/// 200 with the bridge enabled, 503 when discovery failed.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.started_at.elapsed().as_secs();
    let pending = state.store.len().await;

    let (status_code, body) = match &state.bridge {
        BridgeStatus::Enabled => (
            axum::http::StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "bridge": state.bridge.label(),
                "pending_states": pending,
                "uptime_seconds": uptime,
            }),
        ),
        BridgeStatus::Disabled { reason } => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "degraded",
                "bridge": state.bridge.label(),
                "reason": reason,
                "pending_states": pending,
                "uptime_seconds": uptime,
            }),
        ),
    };

    (
        status_code,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus text exposition.
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
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
