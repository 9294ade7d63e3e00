//! BufferRelay - store-and-forward relay server.
//!
//! This binary:
//! - Accepts form-encoded submissions on `POST /fact`
//! - Buffers them in memory in arrival order
//! - Periodically forwards them to the configured destination
//!
//! Queued entries are not persisted; anything still queued at shutdown is lost.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::{router, AppState, Config, FactQueue, Forwarder, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    Config::load_dotenv();
    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    info!(
        destination_url = %config.destination_url,
        queue_check_period_secs = config.queue_check_period_secs,
        max_errors_count = config.max_errors_count,
        request_timeout_ms = config.request_timeout_ms,
        extra_success_statuses = ?config.extra_success_statuses,
        queue_capacity = ?config.queue_capacity,
        port = config.port,
        "config_loaded"
    );

    let forwarder = Forwarder::from_config(&config).context("Failed to create HTTP client")?;
    let queue = FactQueue::with_capacity(config.queue_capacity);

    // Start the drain scheduler
    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(
        queue.clone(),
        Arc::new(forwarder),
        config.drain_period(),
        config.max_errors_count,
    )
    .spawn(shutdown.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, queue.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the scheduler between ticks
    shutdown.cancel();
    if let Err(e) = scheduler.await {
        warn!(error = %e, "scheduler_join_failed");
    }

    let remaining = queue.len();
    if remaining > 0 {
        warn!(queue_depth = remaining, "relay_dropping_undelivered_entries");
    }

    info!("relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("relay_shutting_down");
}
