//! Directory-backed partition store
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<hex(partition name)>/partition.json
//! <root>/<hex(partition name)>/entries/<sha256(method url)>.json
//! ```
//!
//! Entry writes go through a temporary file and a rename, so a reader sees
//! either the previous entry or the new one.

use super::CacheStore;
use crate::error::{ShelterError, ShelterResult};
use crate::http::{RequestKey, StoredResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const PARTITION_META: &str = "partition.json";
const ENTRIES_DIR: &str = "entries";

#[derive(Debug, Serialize, Deserialize)]
struct PartitionMeta {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    key: RequestKey,
    response: StoredResponse,
}

/// Partitions persisted as directories of JSON entry files
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `root` (created on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(hex::encode(partition.as_bytes()))
    }

    fn entry_path(&self, partition: &str, key: &RequestKey) -> PathBuf {
        self.partition_dir(partition)
            .join(ENTRIES_DIR)
            .join(format!("{}.json", key.digest()))
    }

    async fn read_meta(dir: &Path) -> Option<PartitionMeta> {
        let content = fs::read_to_string(dir.join(PARTITION_META)).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Ignoring partition with unreadable metadata {}: {}", dir.display(), e);
                None
            }
        }
    }

    async fn read_entry(path: &Path) -> ShelterResult<Option<EntryFile>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShelterError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ShelterError::CacheEntryCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Write `content` to `path` via a sibling temp file and rename
    async fn write_atomic(path: &Path, content: &[u8]) -> ShelterResult<()> {
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        fs::write(&tmp, content)
            .await
            .map_err(|e| ShelterError::io(format!("writing {}", tmp.display()), e))?;

        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ShelterError::io(format!("renaming into {}", path.display()), e));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn open(&self, partition: &str) -> ShelterResult<()> {
        let dir = self.partition_dir(partition);
        if dir.join(PARTITION_META).exists() {
            return Ok(());
        }

        fs::create_dir_all(dir.join(ENTRIES_DIR))
            .await
            .map_err(|e| ShelterError::io(format!("creating partition {}", partition), e))?;

        let meta = PartitionMeta {
            name: partition.to_string(),
            created_at: Utc::now(),
        };
        Self::write_atomic(
            &dir.join(PARTITION_META),
            serde_json::to_string_pretty(&meta)?.as_bytes(),
        )
        .await?;

        debug!("Opened partition {} at {}", partition, dir.display());
        Ok(())
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut metas = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShelterError::io("reading cache root", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShelterError::io("reading cache root entry", e))?
        {
            let path = entry.path();
            if path.is_dir() {
                if let Some(meta) = Self::read_meta(&path).await {
                    metas.push(meta);
                }
            }
        }

        metas.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(metas.into_iter().map(|m| m.name).collect())
    }

    async fn has(&self, partition: &str) -> ShelterResult<bool> {
        Ok(self.partition_dir(partition).join(PARTITION_META).exists())
    }

    async fn delete(&self, partition: &str) -> ShelterResult<bool> {
        let dir = self.partition_dir(partition);
        if !dir.exists() {
            return Ok(false);
        }

        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| ShelterError::io(format!("deleting partition {}", partition), e))?;
        Ok(true)
    }

    async fn get(
        &self,
        partition: &str,
        key: &RequestKey,
    ) -> ShelterResult<Option<StoredResponse>> {
        let path = self.entry_path(partition, key);
        Ok(Self::read_entry(&path)
            .await?
            .filter(|entry| &entry.key == key)
            .map(|entry| entry.response))
    }

    async fn put(
        &self,
        partition: &str,
        key: &RequestKey,
        response: StoredResponse,
    ) -> ShelterResult<()> {
        self.open(partition).await?;

        let entry = EntryFile {
            key: key.clone(),
            response,
        };
        let content = serde_json::to_vec(&entry)?;
        Self::write_atomic(&self.entry_path(partition, key), &content).await?;

        debug!("Stored {} in {}", key, partition);
        Ok(())
    }

    async fn entries(&self, partition: &str) -> ShelterResult<Vec<(RequestKey, StoredResponse)>> {
        let dir = self.partition_dir(partition).join(ENTRIES_DIR);
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut found = vec![];
        let mut listing = fs::read_dir(&dir)
            .await
            .map_err(|e| ShelterError::io(format!("listing partition {}", partition), e))?;

        while let Some(entry) = listing
            .next_entry()
            .await
            .map_err(|e| ShelterError::io("reading partition entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(file) = Self::read_entry(&path).await? {
                    found.push((file.key, file.response));
                }
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }
}
