//! Klipper Penguin Bridge - Main Entry Point
//!
//! Loads the bridge configuration, wires the shell executor and the Moonraker
//! client into the task runner, and runs passes until SIGINT or SIGTERM.

mod logging;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use penguin_bridge_core::application::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use penguin_bridge_core::application::{shutdown_channel, PassScheduler, ShutdownSender, TaskRunner};
use penguin_bridge_core::domain::BridgeConfig;
use penguin_bridge_core::port::{IntervalTicker, SystemTimeProvider};
use penguin_bridge_infra_moonraker::MoonrakerClient;
use penguin_bridge_infra_system::ShellExecutor;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize logging (kept alive until exit so the file writer flushes)
    let _log_guard = logging::init_logging()?;

    info!("Klipper Penguin Bridge v{} starting...", VERSION);

    // 2. Load configuration
    let config_path = resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok());
    info!(path = %config_path.display(), "Loading configuration...");

    let config = BridgeConfig::load(&config_path)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
    let config = Arc::new(config);

    info!(
        moonraker = %config.base_url(),
        macro_name = %config.macro_name(),
        tasks = config.tasks().len(),
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let executor = Arc::new(ShellExecutor::new(time_provider.clone()));
    let remote = Arc::new(
        MoonrakerClient::new(&config).context("Failed to build Moonraker HTTP client")?,
    );

    let span = tracing::info_span!("bridge", macro_name = %config.macro_name());
    let runner = Arc::new(TaskRunner::new(
        config.clone(),
        executor,
        remote,
        time_provider,
        span,
    ));

    // 4. Shutdown on SIGINT / SIGTERM
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(forward_signals(shutdown_tx));

    // 5. Run passes until shutdown
    info!("Press Ctrl+C to shutdown");
    let scheduler = PassScheduler::new(runner);
    let passes = scheduler
        .run(IntervalTicker::new(config.update_interval()), shutdown_rx)
        .await;

    info!(passes = passes, "Shutdown complete.");
    Ok(())
}

/// Config path from the environment, `~` expanded, or the default
fn resolve_config_path(from_env: Option<String>) -> PathBuf {
    let raw = from_env
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Wait for the first termination signal and request shutdown
async fn forward_signals(shutdown_tx: ShutdownSender) {
    match wait_for_signal().await {
        Ok(name) => info!(signal = name, "Shutdown signal received. Exiting gracefully..."),
        Err(e) => error!(error = ?e, "Failed to listen for shutdown signals, stopping"),
    }
    shutdown_tx.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}
