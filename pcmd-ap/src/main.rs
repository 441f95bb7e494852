//! PCM Audio Player (pcmd-ap) - Main entry point
//!
//! Loads configuration, opens the audio output and serves the binary control
//! protocol until interrupted.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use pcmd_ap::config::{Config, ConfigOverrides};
use pcmd_ap::{audio, ControlServer, TransportController};

/// Command-line arguments for pcmd-ap
#[derive(Parser, Debug)]
#[command(name = "pcmd-ap")]
#[command(about = "Network-controlled PCM audio player")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "PCMD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to accept control connections on
    #[arg(short, long, env = "PCMD_BIND")]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "PCMD_PORT")]
    port: Option<u16>,

    /// Folder relative filenames are resolved against
    #[arg(short, long, env = "PCMD_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Output device name
    #[arg(short, long, env = "PCMD_DEVICE")]
    device: Option<String>,

    /// Sink poll interval in milliseconds
    #[arg(long, env = "PCMD_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Connection timeout in milliseconds (0 disables)
    #[arg(long, env = "PCMD_CONNECTION_TIMEOUT_MS")]
    connection_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PCMD_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env().ok();
    let env_filter_set = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| "pcmd_ap=info,pcmd_common=info".into()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let overrides = ConfigOverrides {
        bind_address: args.bind,
        port: args.port,
        root_folder: args.root_folder,
        poll_interval_ms: args.poll_interval_ms,
        connection_timeout_ms: args.connection_timeout_ms,
        device: args.device,
        log_level: args.log_level,
    };
    let config = Config::load(args.config.as_deref(), overrides)
        .await
        .context("Failed to load configuration")?;

    if !env_filter_set {
        filter_handle
            .reload(EnvFilter::new(format!(
                "pcmd_ap={0},pcmd_common={0}",
                config.log_level
            )))
            .context("Failed to apply log level")?;
    }

    info!("Starting PCM Audio Player on {}", config.listen_addr);

    let sink = audio::open_sink(&config).context("Failed to open audio output")?;
    let transport = Arc::new(Mutex::new(TransportController::new(
        sink,
        config.poll_interval,
        config.root_folder.clone(),
    )));

    let server = ControlServer::bind(
        config.listen_addr,
        Arc::clone(&transport),
        config.connection_timeout,
    )
    .await
    .context("Failed to bind control socket")?;

    server
        .run(shutdown_signal())
        .await
        .context("Server error")?;

    tokio::task::spawn_blocking(move || {
        transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown();
    })
    .await
    .context("Failed to stop playback")?;

    info!("Server shutdown complete");
    Ok(())
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
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
