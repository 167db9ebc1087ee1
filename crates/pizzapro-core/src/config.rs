//! Application configuration management.
//!
//! This module handles loading and saving the partner dashboard
//! configuration: the API base URL and the request timeout.
//!
//! Configuration is stored at `~/.config/pizzapro/config.json`. The
//! `PIZZAPRO_API_BASE_URL` environment variable overrides the stored URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "pizzapro";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured API base URL
pub const API_BASE_URL_ENV: &str = "PIZZAPRO_API_BASE_URL";

/// HTTP request timeout in seconds when none is configured.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// The API base URL, from the environment or the config file.
    pub fn api_base_url(&self) -> Result<Url> {
        let env_value = std::env::var(API_BASE_URL_ENV).ok();
        Self::resolve_base_url(env_value.as_deref(), self.api_base_url.as_deref())
    }

    fn resolve_base_url(env_value: Option<&str>, file_value: Option<&str>) -> Result<Url> {
        let raw = env_value
            .filter(|v| !v.trim().is_empty())
            .or(file_value)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "API base URL is not configured (set {} or run `pizzapro config set-base-url`)",
                    API_BASE_URL_ENV
                )
            })?;

        let url = Url::parse(raw.trim()).with_context(|| format!("Invalid API base URL: {}", raw))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use http or https: {}", raw);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file() {
        let url =
            Config::resolve_base_url(Some("https://env.example"), Some("https://file.example"))
                .expect("env URL");
        assert_eq!(url.host_str(), Some("env.example"));

        let url = Config::resolve_base_url(Some("  "), Some("https://file.example"))
            .expect("file URL");
        assert_eq!(url.host_str(), Some("file.example"));
    }

    #[test]
    fn test_missing_or_invalid_base_url() {
        assert!(Config::resolve_base_url(None, None).is_err());
        assert!(Config::resolve_base_url(None, Some("not a url")).is_err());
        assert!(Config::resolve_base_url(None, Some("ftp://files.example")).is_err());
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(Config::default().request_timeout(), Duration::from_secs(30));
        let config = Config {
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("pizzapro-config-test-{}", std::process::id()))
            .join(CONFIG_FILE);
        let config = Config {
            api_base_url: Some("https://api.pizzapro.dev".to_string()),
            request_timeout_secs: None,
        };

        config.save_to(&path).expect("save config");
        assert_eq!(Config::load_from(&path).expect("load config"), config);

        let _ = std::fs::remove_dir_all(path.parent().expect("config dir"));
    }
}
