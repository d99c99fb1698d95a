//! Configuration schema for Shelter
//!
//! Configuration is stored at `~/.config/shelter/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache partition and precache settings
    pub cache: CacheConfig,

    /// Where network fetches go
    pub origin: OriginConfig,

    /// Push notification presentation
    pub notifications: NotificationConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Partition name prefix
    pub prefix: String,

    /// Controller version tag; changing it rotates both partitions
    pub version: String,

    /// Bootstrap assets precached at install time
    pub manifest: Vec<String>,

    /// Document served for failed navigations
    pub offline_url: String,

    /// Activate a freshly installed version without waiting for pages to close
    pub skip_waiting: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: "portfolio".to_string(),
            version: "v2.0".to_string(),
            manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/static/js/bundle.js".to_string(),
                "/static/css/main.css".to_string(),
                "/manifest.json".to_string(),
                "/favicon.ico".to_string(),
                "/offline.html".to_string(),
            ],
            offline_url: "/offline.html".to_string(),
            skip_waiting: true,
        }
    }
}

/// Network origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL that origin-relative paths resolve against
    pub base_url: String,

    /// Serve fetches from a local build directory instead of HTTP
    pub site_dir: Option<PathBuf>,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4173".to_string(),
            site_dir: None,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Notification title
    pub title: String,

    /// Body used when a push carries no payload
    pub default_body: String,

    /// Icon and badge URL
    pub icon: String,

    /// Vibration pattern in milliseconds
    pub vibrate: Vec<u32>,

    /// Window opened by the "explore" action
    pub open_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio Update".to_string(),
            default_body: "New portfolio update!".to_string(),
            icon: "/favicon.ico".to_string(),
            vibrate: vec![100, 50, 100],
            open_url: "/".to_string(),
        }
    }
}
