//! Logging bootstrap
//!
//! Human-readable output on stderr by default, JSON lines with
//! `PENGUIN_BRIDGE_LOG_FORMAT=json`. Setting `PENGUIN_BRIDGE_LOG_FILE`
//! mirrors every event into that file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use penguin_bridge_core::application::constants::DEFAULT_LOG_FILTER;

const LOG_FORMAT_ENV: &str = "PENGUIN_BRIDGE_LOG_FORMAT";
const LOG_FILE_ENV: &str = "PENGUIN_BRIDGE_LOG_FILE";

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging() -> Result<Option<WorkerGuard>> {
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v == "json");

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    let (file_writer, guard) = match std::env::var(LOG_FILE_ENV) {
        Ok(path) => {
            let (dir, file_name) = split_log_path(&shellexpand::tilde(&path))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        // Production: JSON structured logging
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().json().with_writer(w)))
            .try_init()
    } else {
        registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()
    };
    installed.context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Split a log file path into (directory, file name)
fn split_log_path(path: &str) -> Result<(PathBuf, PathBuf)> {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file_name)))
}
