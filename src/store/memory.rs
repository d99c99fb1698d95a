//! In-memory partition store

use super::CacheStore;
use crate::error::ShelterResult;
use crate::http::{RequestKey, StoredResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Partition = BTreeMap<RequestKey, StoredResponse>;

/// Partitions held in memory, in creation order
#[derive(Clone, Default)]
pub struct MemoryStore {
    partitions: Arc<RwLock<Vec<(String, Partition)>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, partition: &str) -> ShelterResult<()> {
        let mut partitions = self.partitions.write().await;
        if !partitions.iter().any(|(name, _)| name == partition) {
            partitions.push((partition.to_string(), Partition::new()));
        }
        Ok(())
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn delete(&self, partition: &str) -> ShelterResult<bool> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|(name, _)| name != partition);
        Ok(partitions.len() != before)
    }

    async fn get(
        &self,
        partition: &str,
        key: &RequestKey,
    ) -> ShelterResult<Option<StoredResponse>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|(name, _)| name == partition)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn put(
        &self,
        partition: &str,
        key: &RequestKey,
        response: StoredResponse,
    ) -> ShelterResult<()> {
        let mut partitions = self.partitions.write().await;
        match partitions.iter_mut().find(|(name, _)| name == partition) {
            Some((_, entries)) => {
                entries.insert(key.clone(), response);
            }
            None => {
                let mut entries = Partition::new();
                entries.insert(key.clone(), response);
                partitions.push((partition.to_string(), entries));
            }
        }
        Ok(())
    }

    async fn entries(&self, partition: &str) -> ShelterResult<Vec<(RequestKey, StoredResponse)>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|(name, _)| name == partition)
            .map(|(_, entries)| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
