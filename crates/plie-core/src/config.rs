//! Configuration management for Plié.
//!
//! Loads configuration from ${PLIE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Env var that overrides `[api] base_url`.
pub const BASE_URL_ENV: &str = "PLIE_API_BASE_URL";

/// Returns the default config template.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for Plié configuration and data files.
    //!
    //! PLIE_HOME resolution order:
    //! 1. PLIE_HOME environment variable (if set)
    //! 2. ~/.config/plie (default)

    use std::path::PathBuf;

    /// Returns the Plié home directory.
    pub fn plie_home() -> PathBuf {
        if let Ok(home) = std::env::var("PLIE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".plie"),
            |h| h.join(".config").join("plie"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        plie_home().join("config.toml")
    }

    /// Returns the default path of the persisted credential.
    pub fn credentials_path() -> PathBuf {
        plie_home().join("credentials.json")
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            timeout_ms: Config::DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Credential storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Upper bound for a single storage operation in milliseconds
    pub timeout_ms: u64,
    /// Optional override for the credentials file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Config::DEFAULT_STORAGE_TIMEOUT_MS,
            credentials_file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://3.7.81.243/projects/plie-api/public/api";
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
    pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Returns the base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not well-formed.
    pub fn effective_base_url(&self) -> Result<String> {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok(), Some(&self.api.base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.timeout_ms)
    }

    /// Returns the credentials file, honoring the config override.
    pub fn credentials_path(&self) -> PathBuf {
        match self.storage.credentials_file.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => paths::credentials_path(),
        }
    }
}

/// Picks the first non-empty candidate (env, then config) or the default,
/// and validates it. A trailing slash is dropped so paths join cleanly.
fn resolve_base_url(env_value: Option<String>, config_value: Option<&str>) -> Result<String> {
    let chosen = env_value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| config_value.map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(Config::DEFAULT_BASE_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}
