//! Resocks - Local SOCKS5 relay to an authenticated upstream proxy
//!
//! This is the main entry point for the Resocks application.

use anyhow::{Context, Result};
use clap::Parser;
use resocks::config::{load_config, save_config, Config, RelayConfig, SettingsState};
use resocks::controller::RelayController;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Resocks - Local SOCKS5 relay that chains through an authenticated upstream proxy
#[derive(Parser, Debug)]
#[command(name = "resocks")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (created with defaults if missing)
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,

    /// Start the relay even if the stored settings are disabled
    #[arg(long)]
    start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    // Load configuration
    let config = load_or_create_config(&args.config)?;

    info!("Resocks v{}", resocks::VERSION);
    info!("Configuration loaded from: {:?}", args.config);
    if config.upstream.is_configured() {
        info!("Upstream proxy: {}", config.upstream.upstream_endpoint());
    } else {
        warn!("Upstream proxy is not configured");
    }

    let state = SettingsState::new(config.upstream.clone());
    let persist = tokio::spawn(persist_settings(
        args.config.clone(),
        config.relay.clone(),
        state.subscribe(),
    ));
    let controller = RelayController::new(config.relay, state);

    if args.start {
        let addr = controller.start_proxy().await?;
        info!("SOCKS5 relay started at {}", addr);
    } else if controller.auto_start().await? {
        info!("SOCKS5 relay started at {}", controller.local_address());
    } else {
        info!("Relay is disabled, pass --start to run it");
    }

    wait_for_shutdown().await;

    controller.shutdown().await?;
    persist.abort();
    Ok(())
}

/// Read the config file, writing a default one when it does not exist
fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }

    let config = Config::default();
    save_config(path, &config)
        .with_context(|| format!("Failed to create default config at {:?}", path))?;
    info!("Created default configuration at {:?}", path);
    Ok(config)
}

/// Write every settings change back to the config file
async fn persist_settings(
    path: PathBuf,
    relay: RelayConfig,
    mut settings: watch::Receiver<resocks::Settings>,
) {
    while settings.changed().await.is_ok() {
        let config = Config {
            upstream: settings.borrow_and_update().clone(),
            relay: relay.clone(),
        };
        if let Err(e) = save_config(&path, &config) {
            warn!("Failed to persist settings: {:#}", e);
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
            }
            Err(e) => {
                warn!("Failed to setup SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On Windows, only handle Ctrl+C
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
