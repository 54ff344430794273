//! Logging init: file under the platform data dir, or stderr as a fallback.

use anyhow::Result;
use std::{fs, path::PathBuf, sync::Mutex};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,video_fetch_gui=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging to `<data dir>/video-fetch-gui.log`.
/// Returns Err when the log file cannot be opened so the caller can fall back to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let log_dir = crate::config::project_dirs()?.data_local_dir().to_path_buf();
    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join("video-fetch-gui.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("logging to {}", log_file_path.display());
    Ok(log_file_path)
}

/// Stderr-only logging for when `init_logging` fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
