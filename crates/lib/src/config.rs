//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.transito/config.json`) and environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ChatClient, DEFAULT_BASE_URL, DEFAULT_CHANNEL};
use crate::session::SessionStorage;

/// Top-level application config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Chat orchestrator endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Where replies come from: the remote orchestrator or the offline keyword responder.
    #[serde(default)]
    pub mode: ResponderMode,
}

/// Chat orchestrator base URL, timeout, and channel tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Base URL (default http://localhost:8080). Overridden by TRANSITO_API_BASE_URL env.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sent as `metadata.channel` with every message (default "web").
    #[serde(default = "default_channel")]
    pub channel: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderMode {
    /// Send every turn to the chat orchestrator.
    #[default]
    Remote,

    /// Answer locally from the keyword table; no network.
    Offline,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            channel: default_channel(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Resolve the API base URL: env TRANSITO_API_BASE_URL overrides config; default http://localhost:8080.
pub fn resolve_base_url(config: &Config) -> String {
    std::env::var("TRANSITO_API_BASE_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .api
                .base_url
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Build the chat client described by `config`, bound to `session`.
pub fn build_client(config: &Config, session: SessionStorage) -> ChatClient {
    ChatClient::new(Some(resolve_base_url(config)), session)
        .with_timeout(config.api.timeout())
        .with_channel(config.api.channel.clone())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TRANSITO_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".transito").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or TRANSITO_CONFIG_PATH).
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = read_config(&path)?;
    Ok((config, path))
}

fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let config = serde_json::from_str(&s)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}
