//! Vanish Room Service
//!
//! Entry point for the ephemeral chat room service. Wires the Redis store
//! and notifier into the router and serves until shutdown.

use room_service::config::Config;
use room_service::notify::RedisNotifier;
use room_service::routes::{self, AppState};
use room_service::store::RedisStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting room service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        pending_ttl_seconds = config.pending_ttl_seconds,
        live_ttl_seconds = config.live_ttl_seconds,
        max_members = config.max_members,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder.
    // This must happen before any metrics are recorded.
    info!("Initializing Prometheus metrics recorder...");
    let metrics_handle = room_service::observability::metrics::init_metrics_recorder()
        .map_err(|e| {
            error!(error = %e, "Failed to install Prometheus metrics recorder");
            e
        })?;
    info!("Prometheus metrics recorder initialized");

    // Connect the store and notifier
    info!("Connecting to store...");
    let store = RedisStore::connect(&config.redis_url).await.map_err(|e| {
        error!("Failed to connect to store: {}", e);
        e
    })?;

    let notifier = RedisNotifier::connect(&config.redis_url).await.map_err(|e| {
        error!("Failed to connect notifier: {}", e);
        e
    })?;

    info!("Store connection established");

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState::new(
        Arc::new(store),
        Arc::new(notifier),
        config,
    ));

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Room service listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Room service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    // Graceful shutdown drain period
    let drain_secs: u64 = std::env::var("ROOM_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (ROOM_DRAIN_SECONDS=0)");
    }
}
