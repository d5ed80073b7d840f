//! Read Receipts Service Binary
//!
//! Runs the read receipts router as a standalone HTTP service:
//! - Structured JSON logging
//! - Access log with request ids and the authenticated caller
//! - Graceful shutdown handling
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (in-memory store when unset)
//! - `IDENTITY_HEADER`: Header carrying the caller's user id (default: Mattermost-User-ID)
//! - `PLUGIN_MOUNT_PATH`: Prefix to serve under, e.g. `/plugins/com.example.read-receipts`
//! - `PORT`: Service port (default: 8001)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run --bin read_receipts_service --features postgres
//! ```

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use read_receipts::service::{build_app, ServiceState};
use read_receipts::{InMemoryKvStore, LogFormat, PluginConfig, ServerConfig};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "read_receipts_service=info,read_receipts=info,tower_http=info,sqlx=warn".into()
    });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true)
                )
                .init();
        }
    }
}

/// Build the application over the configured store.
async fn build_router(
    plugin: PluginConfig,
    mount_path: &str,
) -> Result<Router, Box<dyn std::error::Error>> {
    #[cfg(feature = "postgres")]
    {
        let database_configured = std::env::var("DATABASE_URL")
            .map(|url| !url.is_empty())
            .unwrap_or(false);

        if database_configured {
            info!("Connecting to PostgreSQL...");
            let connect_start = std::time::Instant::now();

            let store = match tokio::time::timeout(
                std::time::Duration::from_secs(30),
                read_receipts::PostgresKvStore::from_env(),
            ).await {
                Ok(Ok(store)) => store,
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    return Err(e.into());
                }
                Err(_) => {
                    tracing::error!("PostgreSQL connection timeout after 30s");
                    return Err("Database connection timeout".into());
                }
            };

            info!(
                latency_ms = connect_start.elapsed().as_millis() as u64,
                "PostgreSQL connection established"
            );

            return Ok(build_app(ServiceState::with_config(store, plugin), mount_path));
        }
    }

    warn!("No database configured, using in-memory store. Read markers will not survive a restart.");
    Ok(build_app(
        ServiceState::with_config(InMemoryKvStore::new(), plugin),
        mount_path,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = ServerConfig::from_env();
    init_tracing(server.log_format);

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(
        version = version,
        build_sha = build_sha,
        "Starting Read Receipts Service"
    );

    let plugin = PluginConfig::from_env();
    info!(
        identity_header = %plugin.identity_header,
        cache_enabled = plugin.cache.enabled,
        cache_max_entries = plugin.cache.max_entries,
        "Plugin configuration loaded"
    );

    let app = build_router(plugin, &server.mount_path).await?;

    let addr: SocketAddr = server.bind_address().parse()?;
    info!(
        address = %addr,
        version = version,
        "Read Receipts Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    // Graceful shutdown handling
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
            _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
        }
    };

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Read Receipts Service shutdown complete");

    Ok(())
}
