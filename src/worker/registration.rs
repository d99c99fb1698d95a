//! Registration state persisted between host invocations
//!
//! Tracks which controller version is active, which one (if any) is waiting,
//! and the lifecycle of every version seen so far.

use super::controller::{Activation, AssetCacheController, ControllerSettings};
use super::lifecycle::{Lifecycle, LifecycleState};
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::fetch::Fetcher;
use crate::store::CacheStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// On-disk registration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Unique registration ID
    pub id: Uuid,

    /// Version currently handling requests
    pub active: Option<String>,

    /// Installed version waiting for older pages to close
    pub waiting: Option<String>,

    /// Every version seen, oldest first
    pub versions: Vec<Lifecycle>,

    pub updated_at: DateTime<Utc>,
}

impl RegistrationRecord {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            active: None,
            waiting: None,
            versions: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Lifecycle of a known version
    pub fn lifecycle(&self, version: &str) -> Option<&Lifecycle> {
        self.versions.iter().find(|lc| lc.version == version)
    }

    fn upsert(&mut self, lifecycle: Lifecycle) {
        match self
            .versions
            .iter_mut()
            .find(|lc| lc.version == lifecycle.version)
        {
            Some(existing) => *existing = lifecycle,
            None => self.versions.push(lifecycle),
        }
        self.updated_at = Utc::now();
    }

    fn retire(&mut self, version: &str) {
        self.upsert(Lifecycle::restore(version, LifecycleState::Redundant));
    }
}

/// What registering a version led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registered {
    Activated {
        version: String,
        precached: usize,
        deleted: Vec<String>,
    },
    Waiting {
        version: String,
        precached: usize,
    },
    AlreadyActive {
        version: String,
    },
}

/// The host's registration, bound to a store and a network
pub struct Registration {
    path: PathBuf,
    record: RegistrationRecord,
    config: Config,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl Registration {
    /// Load the record at `path`, starting empty if it does not exist
    pub async fn load(
        path: impl Into<PathBuf>,
        config: &Config,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> ShelterResult<Self> {
        let path = path.into();
        let record = if path.exists() {
            let content = fs::read_to_string(&path).await.map_err(|e| {
                ShelterError::io(format!("reading registration {}", path.display()), e)
            })?;
            serde_json::from_str(&content)?
        } else {
            debug!("No registration at {}, starting fresh", path.display());
            RegistrationRecord::new()
        };

        Ok(Self {
            path,
            record,
            config: config.clone(),
            store,
            fetcher,
        })
    }

    pub async fn save(&self) -> ShelterResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShelterError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(&self.record)?;
        fs::write(&self.path, content).await.map_err(|e| {
            ShelterError::io(format!("writing registration {}", self.path.display()), e)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &RegistrationRecord {
        &self.record
    }

    pub fn active_version(&self) -> Option<&str> {
        self.record.active.as_deref()
    }

    pub fn waiting_version(&self) -> Option<&str> {
        self.record.waiting.as_deref()
    }

    fn build(&self, version: &str, lifecycle: Lifecycle) -> AssetCacheController {
        AssetCacheController::with_lifecycle(
            ControllerSettings::from_config(&self.config, version),
            lifecycle,
            self.store.clone(),
            self.fetcher.clone(),
        )
    }

    /// Controller for the active version
    pub fn controller(&self) -> ShelterResult<AssetCacheController> {
        let version = self
            .record
            .active
            .as_deref()
            .ok_or(ShelterError::NoActiveVersion)?;
        let lifecycle = self
            .record
            .lifecycle(version)
            .cloned()
            .unwrap_or_else(|| Lifecycle::restore(version, LifecycleState::Active));
        Ok(self.build(version, lifecycle))
    }

    pub async fn register(&mut self, version: &str) -> ShelterResult<Registered> {
        self.register_with_progress(version, &|_, _| {}).await
    }

    /// Install `version` and activate it when nothing blocks it
    ///
    /// A failed install leaves the active version untouched.
    pub async fn register_with_progress(
        &mut self,
        version: &str,
        progress: &(dyn Fn(&str, bool) + Send + Sync),
    ) -> ShelterResult<Registered> {
        if self.record.active.as_deref() == Some(version) {
            return self.reinstall_active(version, progress).await;
        }

        let mut controller = self.build(version, Lifecycle::new(version));
        let installed = controller.install_with_progress(progress).await;
        self.record.upsert(controller.lifecycle().clone());
        let precached = match installed {
            Ok(count) => count,
            Err(e) => {
                // The failed install deleted this version's static partition
                if self.record.waiting.as_deref() == Some(version) {
                    info!("Waiting version {} discarded after failed install", version);
                    self.record.waiting = None;
                }
                self.save().await?;
                return Err(e);
            }
        };

        if let Some(previous) = self.record.waiting.take() {
            if previous != version {
                info!("Waiting version {} replaced by {}", previous, version);
                self.record.retire(&previous);
            }
        }

        let previous_holds_clients = self.record.active.is_some();
        let activation = controller.activate(previous_holds_clients).await?;
        let registered = self.settle(&controller, activation, precached);
        self.save().await?;
        Ok(registered)
    }

    /// Precache the active version again if its static partition is gone
    ///
    /// A failed attempt keeps the version active with whatever it still has.
    async fn reinstall_active(
        &mut self,
        version: &str,
        progress: &(dyn Fn(&str, bool) + Send + Sync),
    ) -> ShelterResult<Registered> {
        let mut controller = self.build(version, Lifecycle::new(version));
        if self.store.has(&controller.names().static_name()).await? {
            return Ok(Registered::AlreadyActive {
                version: version.to_string(),
            });
        }

        info!("Static partition of {} is missing, precaching again", version);
        let precached = controller.install_with_progress(progress).await?;
        let activation = controller.activate(false).await?;
        let registered = self.settle(&controller, activation, precached);
        self.save().await?;
        Ok(registered)
    }

    /// Activate the waiting version
    pub async fn activate_waiting(
        &mut self,
        previous_holds_clients: bool,
    ) -> ShelterResult<Registered> {
        let mut controller = self.waiting_controller()?;
        let activation = controller.activate(previous_holds_clients).await?;
        let registered = self.settle(&controller, activation, 0);
        self.save().await?;
        Ok(registered)
    }

    /// Activate the waiting version regardless of older pages
    pub async fn skip_waiting(&mut self) -> ShelterResult<Registered> {
        let mut controller = self.waiting_controller()?;
        let activation = controller.skip_waiting().await?;
        let registered = self.settle(&controller, activation, 0);
        self.save().await?;
        Ok(registered)
    }

    /// Register the configured version if it is not the active one
    pub async fn check_for_update(&mut self) -> ShelterResult<Option<Registered>> {
        let configured = self.config.cache.version.clone();
        if self.record.active.as_deref() == Some(configured.as_str())
            || self.record.waiting.as_deref() == Some(configured.as_str())
        {
            debug!("{} is already registered", configured);
            return Ok(None);
        }

        info!("Update available: {}", configured);
        self.register(&configured).await.map(Some)
    }

    fn waiting_controller(&self) -> ShelterResult<AssetCacheController> {
        let version = self
            .record
            .waiting
            .as_deref()
            .ok_or(ShelterError::NoWaitingVersion)?;
        let lifecycle = self
            .record
            .lifecycle(version)
            .cloned()
            .unwrap_or_else(|| Lifecycle::restore(version, LifecycleState::Waiting));
        Ok(self.build(version, lifecycle))
    }

    fn settle(
        &mut self,
        controller: &AssetCacheController,
        activation: Activation,
        precached: usize,
    ) -> Registered {
        let version = controller.version().to_string();
        self.record.upsert(controller.lifecycle().clone());

        match activation {
            Activation::Activated { deleted } => {
                if let Some(previous) = self.record.active.replace(version.clone()) {
                    if previous != version {
                        info!("{} superseded by {}", previous, version);
                        self.record.retire(&previous);
                    }
                }
                if self.record.waiting.as_deref() == Some(version.as_str()) {
                    self.record.waiting = None;
                }
                Registered::Activated {
                    version,
                    precached,
                    deleted,
                }
            }
            Activation::Waiting => {
                self.record.waiting = Some(version.clone());
                Registered::Waiting { version, precached }
            }
            Activation::AlreadyActive => Registered::AlreadyActive { version },
        }
    }
}
