//! Configuration file and state directory locations
//!
//! The config file is TOML, defaulting every missing key. Persisted state
//! (partitions and the registration record) lives under one state directory
//! that `SHELTER_STATE_DIR` can relocate.

pub mod schema;

pub use schema::Config;

use crate::error::{ShelterError, ShelterResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

/// Environment variable that relocates all persisted state
pub const STATE_DIR_ENV: &str = "SHELTER_STATE_DIR";

/// Everything wrong with `config`, empty when it is usable
pub fn problems(config: &Config) -> Vec<String> {
    let mut found = Vec::new();

    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        found.push(format!(
            "general.log_format must be text or json, got {:?}",
            config.general.log_format
        ));
    }
    for (key, value) in [
        ("cache.prefix", &config.cache.prefix),
        ("cache.version", &config.cache.version),
    ] {
        if value.trim().is_empty() {
            found.push(format!("{} cannot be empty", key));
        }
    }
    if !config.cache.offline_url.is_empty() && !config.cache.offline_url.starts_with('/') {
        found.push(format!(
            "cache.offline_url must be an origin-relative path, got {:?}",
            config.cache.offline_url
        ));
    }

    // The base URL only matters when fetches go over HTTP
    if config.origin.site_dir.is_none() {
        match Url::parse(&config.origin.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => found.push(format!(
                "origin.base_url must be http or https, got {}",
                url.scheme()
            )),
            Err(e) => found.push(format!("origin.base_url is not a URL: {}", e)),
        }
    }

    found
}

/// Reads and writes the config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/shelter/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shelter")
            .join("config.toml")
    }

    pub fn state_dir() -> PathBuf {
        match std::env::var_os(STATE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("shelter"),
        }
    }

    /// Root of the on-disk cache partitions
    pub fn caches_dir() -> PathBuf {
        Self::state_dir().join("caches")
    }

    pub fn registration_path() -> PathBuf {
        Self::state_dir().join("registration.json")
    }

    /// Load and validate the config, with defaults when the file is absent
    pub async fn load(&self) -> ShelterResult<Config> {
        let path = self.config_path.as_path();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShelterError::io(format!("reading config from {}", path.display()), e))?;
        let invalid = |reason: String| ShelterError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let config: Config = toml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        let found = problems(&config);
        if !found.is_empty() {
            return Err(invalid(found.join("; ")));
        }
        Ok(config)
    }

    pub async fn save(&self, config: &Config) -> ShelterResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShelterError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShelterError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Create the state and caches directories
    pub async fn ensure_state_dirs() -> ShelterResult<()> {
        for dir in [Self::state_dir(), Self::caches_dir()] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                ShelterError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
