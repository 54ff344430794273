use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::OutputFormat;

/// Overrides `backend_url` from the config file when set.
pub const BACKEND_URL_ENV: &str = "VIDEO_FETCH_BACKEND_URL";

/// Settings loaded from `<config dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the download service; `/download` is appended.
    pub backend_url: String,
    /// Folder downloaded files are saved into.
    pub download_dir: PathBuf,
    /// Format preselected when the window opens.
    pub default_format: OutputFormat,
    /// Optional request timeout in seconds (None = wait as long as the server needs).
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            download_dir: default_download_dir(),
            default_format: OutputFormat::Mp4,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Applies environment overrides on top of the file values.
    pub fn with_env(mut self, backend_url: Option<String>) -> Self {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
        self
    }
}

fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("./downloads"))
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "video-fetch-gui").context("no home directory to place config in")
}

pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AppConfig> {
    let path = config_path()?;
    let cfg: AppConfig = if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
    } else {
        let default_cfg = AppConfig::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(&default_cfg)?)?;
        tracing::info!("created default config at {}", path.display());
        default_cfg
    };

    Ok(cfg.with_env(std::env::var(BACKEND_URL_ENV).ok()))
}
