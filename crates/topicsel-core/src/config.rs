//! Application configuration management.
//!
//! Holds the base URLs of the two service partitions (auth and business),
//! the request timeout, the token backend and the last used identifier.
//!
//! Configuration is stored at `~/.config/topicsel/config.json`. Environment
//! variables override the file:
//! - `TOPICSEL_AUTH_BASE_URL`
//! - `TOPICSEL_API_BASE_URL`
//! - `TOPICSEL_TIMEOUT_MS`
//! - `TOPICSEL_TOKEN_BACKEND` (`file` or `keyring`)
//! - `TOPICSEL_CACHE_DIR`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::ClientConfig;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "topicsel";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default base URL of the authentication partition (login, captcha)
pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8091/api/security";

/// Default base URL of the business partition (theses, selections)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8091/api";

pub const ENV_AUTH_BASE_URL: &str = "TOPICSEL_AUTH_BASE_URL";
pub const ENV_API_BASE_URL: &str = "TOPICSEL_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "TOPICSEL_TIMEOUT_MS";
pub const ENV_TOKEN_BACKEND: &str = "TOPICSEL_TOKEN_BACKEND";
pub const ENV_CACHE_DIR: &str = "TOPICSEL_CACHE_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
}

impl TokenBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenBackend::File),
            "keyring" => Ok(TokenBackend::Keyring),
            other => bail!("unsupported token backend '{}' (expected 'file' or 'keyring')", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub auth_base_url: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    pub cache_dir: Option<PathBuf>,
    pub last_identifier: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
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

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_AUTH_BASE_URL) {
            self.auth_base_url = Some(url);
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = Some(url);
        }
        if let Some(raw) = get(ENV_TIMEOUT_MS) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of milliseconds, got '{}'", ENV_TIMEOUT_MS, raw))?;
            if ms == 0 {
                bail!("{} must be greater than zero", ENV_TIMEOUT_MS);
            }
            self.timeout_ms = Some(ms);
        }
        if let Some(raw) = get(ENV_TOKEN_BACKEND) {
            self.token_backend = TokenBackend::parse(&raw)?;
        }
        if let Some(dir) = get(ENV_CACHE_DIR) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Client configuration for the authentication partition.
    pub fn auth_partition(&self) -> ClientConfig {
        self.partition(self.auth_base_url.as_deref().unwrap_or(DEFAULT_AUTH_BASE_URL))
    }

    /// Client configuration for the business partition.
    pub fn business_partition(&self) -> ClientConfig {
        self.partition(self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL))
    }

    fn partition(&self, base_url: &str) -> ClientConfig {
        let config = ClientConfig::new(base_url);
        // A zero timeout in the file falls back to the default
        match self.timeout_ms.filter(|ms| *ms > 0) {
            Some(ms) => config.timeout(Duration::from_millis(ms)),
            None => config,
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
