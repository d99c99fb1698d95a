//! Test doubles for the controller: a scripted network and a probing store

use crate::error::{ShelterError, ShelterResult};
use crate::fetch::{FetchError, Fetcher};
use crate::http::{Request, RequestKey, Response, StoredResponse};
use crate::store::{CacheStore, MemoryStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Network that answers from a fixed table and can be switched off
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Offline);
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(&request.url) {
            Some((status, body)) => Ok(Response::new(*status, body.clone())),
            None => Ok(Response::new(404, "not found")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Memory store that counts reads and writes and can refuse writes
#[derive(Default)]
pub struct ProbeStore {
    pub inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        let store = Self::new();
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for ProbeStore {
    async fn open(&self, partition: &str) -> ShelterResult<()> {
        self.inner.open(partition).await
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, partition: &str) -> ShelterResult<bool> {
        self.inner.delete(partition).await
    }

    async fn get(
        &self,
        partition: &str,
        key: &RequestKey,
    ) -> ShelterResult<Option<StoredResponse>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(partition, key).await
    }

    async fn put(
        &self,
        partition: &str,
        key: &RequestKey,
        response: StoredResponse,
    ) -> ShelterResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ShelterError::io(
                "writing cache entry",
                std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
            ));
        }
        self.inner.put(partition, key, response).await
    }

    async fn entries(&self, partition: &str) -> ShelterResult<Vec<(RequestKey, StoredResponse)>> {
        self.inner.entries(partition).await
    }
}
