//! Cache partition storage
//!
//! A store holds named partitions, each a key-value map from
//! [`RequestKey`] to [`StoredResponse`]. Entries never expire; they live
//! until overwritten under the same key or until their partition is deleted.
//!
//! | Backend | Persistence | Use |
//! |---------|-------------|-----|
//! | [`MemoryStore`] | process lifetime | tests, ephemeral hosts |
//! | [`DiskStore`] | directory tree | the CLI host |

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::ShelterResult;
use crate::http::{RequestKey, StoredResponse};
use async_trait::async_trait;

/// Named-partition response cache
///
/// Per-key reads and writes are atomic; concurrent writes to the same key
/// are last-write-wins. Nothing spans more than one key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a partition, creating it empty if missing
    async fn open(&self, partition: &str) -> ShelterResult<()>;

    /// List partition names in creation order
    async fn keys(&self) -> ShelterResult<Vec<String>>;

    /// Delete a partition, returning whether it existed
    async fn delete(&self, partition: &str) -> ShelterResult<bool>;

    /// Look up one entry in one partition
    async fn get(&self, partition: &str, key: &RequestKey)
        -> ShelterResult<Option<StoredResponse>>;

    /// Write an entry, creating the partition if needed
    async fn put(
        &self,
        partition: &str,
        key: &RequestKey,
        response: StoredResponse,
    ) -> ShelterResult<()>;

    /// All entries of a partition, ordered by key
    async fn entries(&self, partition: &str) -> ShelterResult<Vec<(RequestKey, StoredResponse)>>;

    /// Check whether a partition exists
    async fn has(&self, partition: &str) -> ShelterResult<bool> {
        Ok(self.keys().await?.iter().any(|name| name == partition))
    }

    /// Search every partition in creation order and return the first hit
    async fn match_any(&self, key: &RequestKey) -> ShelterResult<Option<StoredResponse>> {
        for partition in self.keys().await? {
            if let Some(hit) = self.get(&partition, key).await? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
