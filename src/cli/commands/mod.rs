//! CLI command implementations

pub mod activate;
pub mod config;
pub mod fetch;
pub mod install;
pub mod notify;
pub mod partitions;
pub mod status;

pub use activate::execute as activate;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use notify::{click, message, push};
pub use partitions::execute as partitions;
pub use status::execute as status;

use crate::config::{Config, ConfigManager};
use crate::error::ShelterResult;
use crate::fetch::create_fetcher;
use crate::store::{CacheStore, DiskStore};
use crate::worker::Registration;
use std::sync::Arc;

/// The on-disk store under the state directory
pub(crate) fn open_store() -> Arc<dyn CacheStore> {
    Arc::new(DiskStore::new(ConfigManager::caches_dir()))
}

/// Load the persisted registration bound to the disk store and the origin
pub(crate) async fn open_registration(config: &Config, offline: bool) -> ShelterResult<Registration> {
    Registration::load(
        ConfigManager::registration_path(),
        config,
        open_store(),
        create_fetcher(&config.origin, offline),
    )
    .await
}
