use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::provider::openweather::DEFAULT_BASE_URL;

/// Key sent upstream when none is configured. Requests will be rejected by
/// the provider, which surfaces as an upstream failure.
pub const API_KEY_PLACEHOLDER: &str = "your_default_key_here";

pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENWEATHER_BASE_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";

/// Top-level configuration stored on disk, with environment overrides.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// port = 3000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Port the proxy server listens on.
    pub port: u16,

    pub api_base_url: String,

    /// Directory served for everything outside `/api`.
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            port: 3000,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            static_dir: "public".to_string(),
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply `.env` and process
    /// environment overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut cfg = Self::load_file()?;
        cfg.apply_env(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Override fields from environment-style variables. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(dir) = var(ENV_STATIC_DIR) {
            self.static_dir = dir;
        }
        if let Some(port) = var(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{port}'"))?;
        }

        Ok(())
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// The configured key, or [`API_KEY_PLACEHOLDER`] with a warning.
    pub fn api_key_or_placeholder(&self) -> &str {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                tracing::warn!(
                    "No OpenWeather API key configured; set {ENV_API_KEY} or run `weather-dashboard configure`"
                );
                API_KEY_PLACEHOLDER
            }
        }
    }
}
