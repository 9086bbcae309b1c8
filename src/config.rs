use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};

const APP_DIR: &str = "daily-devotion";
pub const API_URL_ENV: &str = "DEVOTION_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: Option<String>,

    /// When false every storage operation is a no-op returning empty results.
    #[serde(default = "default_storage_enabled")]
    pub storage_enabled: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_program")]
    pub default_program: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("devotion.db").to_string_lossy().to_string()
}

// Baked in at build time when DEVOTION_API_URL is set for the compiler.
fn default_api_base_url() -> Option<String> {
    option_env!("DEVOTION_API_URL").map(str::to_string)
}

fn default_storage_enabled() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

fn default_program() -> String {
    "Open Heavens".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_base_url: default_api_base_url(),
            storage_enabled: default_storage_enabled(),
            request_timeout_secs: default_request_timeout(),
            default_program: default_program(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            let config = Config::default();
            Self::write(&config.first_run_toml()?)?;
            config
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            tracing::debug!("Using API URL from {}", API_URL_ENV);
            config.api_base_url = Some(url);
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Contents of the config file written on first run. The build-time API
    /// URL is left out so a later rebuild with a different one still applies.
    fn first_run_toml(&self) -> Result<String> {
        Config {
            api_base_url: None,
            ..self.clone()
        }
        .to_toml()
    }

    fn write(content: &str) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Parsed API base URL. Errors when none is configured.
    pub fn api_url(&self) -> Result<Url> {
        let raw = self.api_base_url.as_deref().ok_or_else(|| {
            AppError::Config(format!(
                "no API base URL configured; set api_base_url in {} or {}",
                Self::config_path().display(),
                API_URL_ENV
            ))
        })?;
        Ok(Url::parse(raw)?)
    }

    /// Per-request HTTP timeout, never shorter than one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
