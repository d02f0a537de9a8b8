use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{ArtgateError, Result};

/// Server secret used when neither the environment nor the config provides one.
/// Matches the development default of earlier deployments so existing stored
/// credentials stay readable on a dev box.
pub const DEV_SERVER_SECRET: &str = "your-secret-key-change-in-production";

/// Main configuration structure for Artgate
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token and vault secret configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Credential store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upstream defaults applied when a stored record leaves a field empty
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Config {
    /// Load configuration from an explicit path, or search the default locations
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".artgate").join("config.toml")),
            dirs::config_dir().map(|c| c.join("artgate").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArtgateError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| ArtgateError::Config(format!("Failed to parse config: {e}")))
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upstream connect timeout in seconds. There is no whole-request timeout
    /// because it would cut off long-running streams.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Bearer token and vault secret configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the server secret
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    /// Inline server secret, used when the environment variable is unset
    #[serde(default)]
    pub secret: Option<String>,
    /// Lifetime of issued bearer tokens in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
            secret: None,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl AuthConfig {
    /// Resolve the server-wide secret: environment, then inline, then the dev default
    pub fn resolve_secret(&self) -> String {
        if let Ok(value) = env::var(&self.secret_env) {
            if !value.is_empty() {
                return value;
            }
        }
        if let Some(secret) = self.secret.as_ref().filter(|s| !s.is_empty()) {
            return secret.clone();
        }
        tracing::warn!(
            "No server secret in ${} or config; falling back to the development default",
            self.secret_env
        );
        DEV_SERVER_SECRET.to_string()
    }
}

fn default_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_ttl_secs() -> i64 {
    7 * 24 * 60 * 60
}

/// Credential store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for the credential store snapshot
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".artgate"))
        .unwrap_or_else(|| PathBuf::from(".artgate"))
}

/// Upstream defaults
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL for OpenAI-compatible chat completions when a record has none
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,
    /// Model used when a record has none
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature used when a record has none
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Base URL stored for agent records saved without one
    #[serde(default = "default_agent_base_url")]
    pub agent_base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            llm_base_url: default_llm_base_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            agent_base_url: default_agent_base_url(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_agent_base_url() -> String {
    "https://maas.hikvision.com.cn".to_string()
}
