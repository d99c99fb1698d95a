//! Error types for Shelter
//!
//! All modules use `ShelterResult<T>` as their return type. Network-layer
//! rejections are modelled separately by [`crate::fetch::FetchError`] and are
//! wrapped here once a caching decision has run out of fallbacks.

use crate::fetch::FetchError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Shelter operations
pub type ShelterResult<T> = Result<T, ShelterError>;

/// All errors that can occur in Shelter
#[derive(Error, Debug)]
pub enum ShelterError {
    // Lifecycle errors
    #[error("Failed to precache {url} for {version}: {reason}")]
    InstallAssetFetch {
        version: String,
        url: String,
        reason: String,
    },

    #[error("Controller {version} is {state}, it does not handle requests")]
    ControllerNotActive { version: String, state: String },

    #[error("Invalid lifecycle transition for {version}: cannot {action} while {state}")]
    InvalidTransition {
        version: String,
        action: &'static str,
        state: String,
    },

    #[error("No active controller version")]
    NoActiveVersion,

    #[error("No waiting controller version")]
    NoWaitingVersion,

    // Request errors
    #[error("Network request for {url} failed with no cached fallback: {source}")]
    RuntimeFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Navigation to {url} failed and offline document {offline_url} is not cached")]
    OfflineNavigation { url: String, offline_url: String },

    // Cache errors
    #[error("Failed to write {key} into {partition}: {reason}")]
    CacheWrite {
        partition: String,
        key: String,
        reason: String,
    },

    #[error("Cache partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    CacheEntryCorrupt { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShelterError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache write error
    pub fn cache_write(
        partition: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::CacheWrite {
            partition: partition.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a request failure the page sees as a network error
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::RuntimeFetch { .. } | Self::OfflineNavigation { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoActiveVersion => Some("Run: shelter install"),
            Self::NoWaitingVersion => Some("Run: shelter install <new-version>"),
            Self::ControllerNotActive { .. } => Some("Run: shelter activate"),
            Self::InstallAssetFetch { .. } => {
                Some("Every manifest URL must answer 200; check [cache].manifest and [origin]")
            }
            Self::OfflineNavigation { .. } => {
                Some("Add the offline document to [cache].manifest so it is precached")
            }
            _ => None,
        }
    }
}
