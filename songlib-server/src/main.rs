//! songlib-server - Song catalog HTTP service
//!
//! Settings resolve in order: command line / environment, TOML config file,
//! built-in defaults.

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use songlib_common::config::TomlConfig;
use songlib_common::db::init_database;
use songlib_common::time::secs_to_duration;
use songlib_server::services::{
    HttpMetadataResolver, MetadataResolver, SongLifecycle, StubMetadataResolver,
};
use songlib_server::{build_router, AppState};
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Command-line arguments for songlib-server
#[derive(Parser, Debug)]
#[command(name = "songlib-server")]
#[command(about = "Song library catalog service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SONGLIB_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SONGLIB_DATABASE")]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SONGLIB_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SONGLIB_PORT")]
    port: Option<u16>,

    /// Base URL of the song metadata API; the built-in stub is used when unset
    #[arg(long, env = "SONGLIB_METADATA_URL")]
    metadata_url: Option<String>,
}

impl Args {
    fn apply_to(self, config: &mut TomlConfig) {
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.metadata_url {
            config.metadata.api_url = Some(url);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config_source = args.config.clone();
    args.apply_to(&mut config);

    // RUST_LOG takes precedence over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting songlib-server v{}", env!("CARGO_PKG_VERSION"));
    match config_source {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: platform default location or built-in defaults"),
    }

    let pool = init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    info!("Database path: {}", config.database_path.display());

    let metadata: Arc<dyn MetadataResolver> = match &config.metadata.api_url {
        Some(url) => {
            let timeout = secs_to_duration(config.metadata.timeout_secs);
            let resolver = HttpMetadataResolver::new(url.as_str(), timeout)
                .context("Failed to create metadata client")?;
            info!("Metadata API: {}", resolver.api_url());
            Arc::new(resolver)
        }
        None => {
            warn!("No metadata API configured, using stub song details");
            Arc::new(StubMetadataResolver)
        }
    };

    let state = AppState::new(
        SongLifecycle::new(pool.clone(), metadata),
        secs_to_duration(config.request_timeout_secs),
    );
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("songlib-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = Arc::clone(&shutdown);
            async move {
                shutdown_signal().await;
                shutdown.notify_one();
            }
        })
        .into_future();

    let drain_limit = secs_to_duration(config.shutdown_timeout_secs);
    tokio::select! {
        result = server => result.context("Server error")?,
        _ = drain_deadline(&shutdown, drain_limit) => {
            warn!("In-flight requests still running after {:?}, forcing shutdown", drain_limit);
        }
    }

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Completes `limit` after a shutdown signal was received
async fn drain_deadline(shutdown: &Notify, limit: Duration) {
    shutdown.notified().await;
    tokio::time::sleep(limit).await;
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
