//! The asset-caching controller
//!
//! [`AssetCacheController`] executes the effects that [`Router`] decides on:
//! precaching the manifest, collecting stale partitions and answering
//! intercepted requests from the store or the network.

use super::lifecycle::{Lifecycle, LifecycleState};
use super::partitions::{CacheNames, PartitionKind};
use super::policy::{Effect, LifecycleEvent, Router, Strategy};
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::fetch::Fetcher;
use crate::http::{Request, RequestKey, Response, StoredResponse};
use crate::notify::{ClickResponse, Notification, NotificationHandler};
use crate::store::CacheStore;
use futures_util::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a controller version needs to know about itself
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub names: CacheNames,
    pub manifest: Vec<String>,
    pub offline_url: String,
    pub skip_waiting: bool,
    pub notifications: NotificationHandler,
}

impl ControllerSettings {
    /// Settings for `version` using the rest of the configuration
    pub fn from_config(config: &Config, version: &str) -> Self {
        Self {
            names: CacheNames::new(&config.cache.prefix, version),
            manifest: config.cache.manifest.clone(),
            offline_url: config.cache.offline_url.clone(),
            skip_waiting: config.cache.skip_waiting,
            notifications: NotificationHandler::new(config.notifications.clone()),
        }
    }
}

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// The offline document, served for a failed navigation
    OfflineFallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::OfflineFallback => "offline fallback",
        };
        f.write_str(s)
    }
}

/// A response together with its origin
#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// Result of intercepting one request
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the host sends it to the network itself
    Passthrough,
    Served(Served),
}

/// Result of an activation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Became active; lists the partitions that were deleted
    Activated { deleted: Vec<String> },
    /// An older version still holds pages
    Waiting,
    AlreadyActive,
}

/// Result of dispatching one lifecycle event
#[derive(Debug)]
pub enum DispatchOutcome {
    Installed { precached: usize },
    Activation(Activation),
    Fetch(FetchOutcome),
    Notification(Notification),
    NotificationClosed(ClickResponse),
    /// The host should re-check for a newer version
    UpdateRequested,
    Ignored,
}

/// Caching controller for one version
pub struct AssetCacheController {
    settings: ControllerSettings,
    router: Router,
    lifecycle: Lifecycle,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl AssetCacheController {
    /// A fresh version that has not installed yet
    pub fn new(
        settings: ControllerSettings,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let lifecycle = Lifecycle::new(&settings.names.version);
        Self::with_lifecycle(settings, lifecycle, store, fetcher)
    }

    /// Resume a version whose lifecycle was persisted earlier
    pub fn with_lifecycle(
        settings: ControllerSettings,
        lifecycle: Lifecycle,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let router = Router::new(
            settings.names.clone(),
            settings.manifest.clone(),
            settings.offline_url.clone(),
            settings.notifications.clone(),
        );
        Self {
            settings,
            router,
            lifecycle,
            store,
            fetcher,
        }
    }

    pub fn version(&self) -> &str {
        &self.settings.names.version
    }

    pub fn names(&self) -> &CacheNames {
        &self.settings.names
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Retire this version after a newer one activated
    pub fn supersede(&mut self) -> ShelterResult<()> {
        self.lifecycle.supersede()
    }

    pub async fn install(&mut self) -> ShelterResult<usize> {
        self.install_with_progress(&|_, _| {}).await
    }

    /// Precache the whole manifest into the static partition
    ///
    /// Either every URL is stored or none is. `progress` is called once per
    /// URL with whether its fetch succeeded.
    pub async fn install_with_progress(
        &mut self,
        progress: &(dyn Fn(&str, bool) + Send + Sync),
    ) -> ShelterResult<usize> {
        self.lifecycle.require("install", LifecycleState::Installing)?;

        let (partition, urls) = match self.router.route(&LifecycleEvent::Install) {
            Effect::Precache { partition, urls } => (partition, urls),
            other => {
                return Err(ShelterError::Internal(format!(
                    "install routed to {:?}",
                    other
                )))
            }
        };

        info!("Installing {}: precaching {} URLs", self.version(), urls.len());
        match self.precache(&partition, &urls, progress).await {
            Ok(count) => {
                self.lifecycle.install_succeeded()?;
                info!("Installed {} ({} entries in {})", self.version(), count, partition);
                Ok(count)
            }
            Err(e) => {
                warn!("Install of {} failed: {}", self.version(), e);
                if let Err(cleanup) = self.store.delete(&partition).await {
                    warn!("Failed to remove partial partition {}: {}", partition, cleanup);
                }
                self.lifecycle.install_failed()?;
                Err(e)
            }
        }
    }

    async fn precache(
        &self,
        partition: &str,
        urls: &[String],
        progress: &(dyn Fn(&str, bool) + Send + Sync),
    ) -> ShelterResult<usize> {
        self.store.open(partition).await?;

        let requests: Vec<Request> = urls.iter().map(Request::get).collect();
        let results = join_all(requests.iter().map(|r| self.fetcher.fetch(r))).await;

        let mut fetched: Vec<(RequestKey, StoredResponse)> = Vec::with_capacity(urls.len());
        for (request, result) in requests.iter().zip(results) {
            let failure = match result {
                Ok(response) if response.is_ok() => {
                    progress(&request.url, true);
                    fetched.push((request.key(), response.into_stored()));
                    continue;
                }
                Ok(response) => format!("status {}", response.status),
                Err(e) => e.to_string(),
            };

            progress(&request.url, false);
            return Err(ShelterError::InstallAssetFetch {
                version: self.version().to_string(),
                url: request.url.clone(),
                reason: failure,
            });
        }

        let count = fetched.len();
        for (key, response) in fetched {
            self.store.put(partition, &key, response).await?;
        }
        Ok(count)
    }

    /// Activate a waiting version
    ///
    /// `previous_holds_clients` tells whether an older version still controls
    /// open pages; configured skip-waiting overrides it.
    pub async fn activate(&mut self, previous_holds_clients: bool) -> ShelterResult<Activation> {
        if self.lifecycle.routes_requests() {
            return Ok(Activation::AlreadyActive);
        }

        if !self
            .lifecycle
            .activate(previous_holds_clients, self.settings.skip_waiting)?
        {
            info!("{} is waiting for older pages to close", self.version());
            return Ok(Activation::Waiting);
        }

        self.on_activated().await
    }

    /// Activate immediately, ignoring pages held by older versions
    pub async fn skip_waiting(&mut self) -> ShelterResult<Activation> {
        if self.lifecycle.routes_requests() {
            return Ok(Activation::AlreadyActive);
        }
        self.lifecycle.skip_waiting()?;
        self.on_activated().await
    }

    async fn on_activated(&mut self) -> ShelterResult<Activation> {
        info!("Activated {}", self.version());
        let deleted = self.collect_garbage().await?;
        self.store.open(&self.settings.names.dynamic_name()).await?;
        Ok(Activation::Activated { deleted })
    }

    /// Delete every partition that does not belong to this version
    pub async fn collect_garbage(&self) -> ShelterResult<Vec<String>> {
        let keep = match self.router.route(&LifecycleEvent::Activate) {
            Effect::CollectGarbage { keep } => keep,
            other => {
                return Err(ShelterError::Internal(format!(
                    "activate routed to {:?}",
                    other
                )))
            }
        };

        let names = self.store.keys().await?;
        let mut deleted = Vec::new();
        for name in keep.stale(&names) {
            if self.store.delete(name).await? {
                info!("Deleted stale cache partition {}", name);
                deleted.push(name.to_string());
            }
        }
        Ok(deleted)
    }

    /// Answer one intercepted request
    pub async fn handle_fetch(&self, request: &Request) -> ShelterResult<FetchOutcome> {
        self.lifecycle.ensure_active()?;

        match self.router.route_fetch(request) {
            Effect::Respond { strategy } => {
                let served = self.respond(request, &strategy).await?;
                debug!(
                    "{} {} served from {} ({})",
                    request.method, request.url, served.source, served.response.status
                );
                Ok(FetchOutcome::Served(served))
            }
            _ => Ok(FetchOutcome::Passthrough),
        }
    }

    async fn respond(&self, request: &Request, strategy: &Strategy) -> ShelterResult<Served> {
        let key = request.key();

        match strategy {
            Strategy::NetworkWithCacheFallback { store, offline_url } => {
                if let Some(hit) = self.lookup(&key).await {
                    return Ok(served(hit, ResponseSource::Cache));
                }

                match self.fetcher.fetch(request).await {
                    Ok(response) => {
                        let response = self.store_copy(*store, &key, response).await;
                        Ok(Served {
                            response,
                            source: ResponseSource::Network,
                        })
                    }
                    Err(e) => {
                        debug!("Navigation to {} failed: {}", request.url, e);
                        match self.lookup(&RequestKey::get(offline_url.as_str())).await {
                            Some(offline) => Ok(served(offline, ResponseSource::OfflineFallback)),
                            None => Err(ShelterError::OfflineNavigation {
                                url: request.url.clone(),
                                offline_url: offline_url.clone(),
                            }),
                        }
                    }
                }
            }

            Strategy::CacheFirst { store } => {
                if let Some(hit) = self.lookup(&key).await {
                    return Ok(served(hit, ResponseSource::Cache));
                }

                let response = self.fetcher.fetch(request).await.map_err(|source| {
                    ShelterError::RuntimeFetch {
                        url: request.url.clone(),
                        source,
                    }
                })?;
                let response = self.store_copy(*store, &key, response).await;
                Ok(Served {
                    response,
                    source: ResponseSource::Network,
                })
            }

            Strategy::NetworkFirst { store, require_ok } => {
                match self.fetcher.fetch(request).await {
                    Ok(response) => {
                        let response = if !*require_ok || response.is_ok() {
                            self.store_copy(*store, &key, response).await
                        } else {
                            debug!("Not caching {} (status {})", request.url, response.status);
                            response
                        };
                        Ok(Served {
                            response,
                            source: ResponseSource::Network,
                        })
                    }
                    Err(source) => match self.lookup(&key).await {
                        Some(hit) => Ok(served(hit, ResponseSource::Cache)),
                        None => Err(ShelterError::RuntimeFetch {
                            url: request.url.clone(),
                            source,
                        }),
                    },
                }
            }
        }
    }

    /// Search every partition; a store error counts as a miss
    async fn lookup(&self, key: &RequestKey) -> Option<StoredResponse> {
        match self.store.match_any(key).await {
            Ok(Some(hit)) => {
                debug!("Cache hit for {}", key);
                Some(hit)
            }
            Ok(None) => {
                debug!("Cache miss for {}", key);
                None
            }
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", key, e);
                None
            }
        }
    }

    /// Store a copy of `response` and return the other copy
    ///
    /// The write finishes before the response is handed back, so the next
    /// request for `key` already sees it.
    async fn store_copy(&self, kind: PartitionKind, key: &RequestKey, response: Response) -> Response {
        let (response, copy) = response.duplicate();
        let partition = self.settings.names.name(kind);

        if let Err(e) = self.store.put(&partition, key, copy.into_stored()).await {
            warn!(
                "{}",
                ShelterError::cache_write(&partition, key.to_string(), e.to_string())
            );
        }
        response
    }

    /// Route an event and carry out its effect
    pub async fn dispatch(&mut self, event: LifecycleEvent) -> ShelterResult<DispatchOutcome> {
        match event {
            LifecycleEvent::Install => {
                let precached = self.install().await?;
                Ok(DispatchOutcome::Installed { precached })
            }
            LifecycleEvent::Activate => {
                let activation = self.activate(false).await?;
                Ok(DispatchOutcome::Activation(activation))
            }
            LifecycleEvent::Fetch(request) => {
                let outcome = self.handle_fetch(&request).await?;
                Ok(DispatchOutcome::Fetch(outcome))
            }
            event => match self.router.route(&event) {
                Effect::ShowNotification(notification) => {
                    Ok(DispatchOutcome::Notification(notification))
                }
                Effect::CloseNotification(click) => Ok(DispatchOutcome::NotificationClosed(click)),
                Effect::SkipWaiting => {
                    let activation = self.skip_waiting().await?;
                    Ok(DispatchOutcome::Activation(activation))
                }
                Effect::CheckForUpdate => Ok(DispatchOutcome::UpdateRequested),
                _ => Ok(DispatchOutcome::Ignored),
            },
        }
    }
}

fn served(stored: StoredResponse, source: ResponseSource) -> Served {
    Served {
        response: stored.to_response(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::NotificationConfig;
    use crate::http::{Body, Destination, Method};
    use crate::store::MemoryStore;
    use crate::worker::policy::ControlMessage;
    use crate::worker::testing::{ProbeStore, ScriptedFetcher};

    const MANIFEST: [&str; 7] = [
        "/",
        "/index.html",
        "/static/js/bundle.js",
        "/static/css/main.css",
        "/manifest.json",
        "/favicon.ico",
        "/offline.html",
    ];

    fn settings(version: &str) -> ControllerSettings {
        ControllerSettings {
            names: CacheNames::new("portfolio", version),
            manifest: MANIFEST.iter().map(|s| s.to_string()).collect(),
            offline_url: "/offline.html".to_string(),
            skip_waiting: false,
            notifications: NotificationHandler::new(NotificationConfig::default()),
        }
    }

    fn site() -> ScriptedFetcher {
        let fetcher = ScriptedFetcher::new();
        for url in MANIFEST {
            fetcher.route(url, 200, &format!("content of {url}"));
        }
        fetcher.route("/img/a.png", 200, "png bytes");
        fetcher.route("/api/projects", 200, "[]");
        fetcher
    }

    fn body_of(outcome: FetchOutcome) -> (ResponseSource, u16, Vec<u8>) {
        match outcome {
            FetchOutcome::Served(Served { response, source }) => {
                (source, response.status, response.body.into_bytes())
            }
            FetchOutcome::Passthrough => panic!("expected a served response"),
        }
    }

    async fn active(
        version: &str,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> AssetCacheController {
        let mut controller = AssetCacheController::new(settings(version), store, fetcher);
        controller.install().await.unwrap();
        controller.activate(false).await.unwrap();
        controller
    }

    #[tokio::test]
    async fn install_precaches_whole_manifest() {
        let store = Arc::new(MemoryStore::new());
        let mut controller =
            AssetCacheController::new(settings("v2.0"), store.clone(), Arc::new(site()));

        assert_eq!(controller.install().await.unwrap(), MANIFEST.len());
        assert_eq!(controller.state(), LifecycleState::Waiting);

        for url in MANIFEST {
            let hit = store
                .get("portfolio-static-v2.0", &RequestKey::get(url))
                .await
                .unwrap();
            assert!(hit.is_some(), "{url} missing from static partition");
        }
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let fetcher = site();
        fetcher.route("/manifest.json", 404, "missing");
        let store = Arc::new(MemoryStore::new());
        let mut controller =
            AssetCacheController::new(settings("v2.0"), store.clone(), Arc::new(fetcher));

        let err = controller.install().await.unwrap_err();
        match err {
            ShelterError::InstallAssetFetch { url, reason, .. } => {
                assert_eq!(url, "/manifest.json");
                assert_eq!(reason, "status 404");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(controller.state(), LifecycleState::InstallFailed);
        assert!(store.keys().await.unwrap().is_empty());

        assert!(controller.activate(false).await.is_err());
    }

    #[tokio::test]
    async fn install_fails_offline() {
        let fetcher = site();
        fetcher.set_offline(true);
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(fetcher));

        assert!(matches!(
            controller.install().await,
            Err(ShelterError::InstallAssetFetch { .. })
        ));
    }

    #[tokio::test]
    async fn install_reports_progress() {
        let seen = std::sync::Mutex::new(Vec::new());
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(site()));

        controller
            .install_with_progress(&|url, ok| seen.lock().unwrap().push((url.to_string(), ok)))
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), MANIFEST.len());
        assert!(seen.iter().all(|(_, ok)| *ok));
    }

    #[tokio::test]
    async fn install_twice_is_rejected() {
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(site()));
        controller.install().await.unwrap();
        assert!(matches!(
            controller.install().await,
            Err(ShelterError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn activation_keeps_only_current_partitions() {
        let store = Arc::new(MemoryStore::new());
        for stale in ["portfolio-static-v1.0", "portfolio-dynamic-v1.0", "unrelated"] {
            store.open(stale).await.unwrap();
        }

        let mut controller =
            AssetCacheController::new(settings("v2.0"), store.clone(), Arc::new(site()));
        controller.install().await.unwrap();

        match controller.activate(false).await.unwrap() {
            Activation::Activated { mut deleted } => {
                deleted.sort();
                assert_eq!(
                    deleted,
                    vec!["portfolio-dynamic-v1.0", "portfolio-static-v1.0", "unrelated"]
                );
            }
            other => panic!("unexpected activation {other:?}"),
        }

        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["portfolio-dynamic-v2.0", "portfolio-static-v2.0"]);

        assert_eq!(controller.activate(false).await.unwrap(), Activation::AlreadyActive);
    }

    #[tokio::test]
    async fn activation_waits_for_older_pages() {
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(site()));
        controller.install().await.unwrap();

        assert_eq!(controller.activate(true).await.unwrap(), Activation::Waiting);
        assert_eq!(controller.state(), LifecycleState::Waiting);

        let outcome = controller
            .dispatch(LifecycleEvent::Message(ControlMessage::SkipWaiting))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Activation(Activation::Activated { .. })
        ));
        assert_eq!(controller.state(), LifecycleState::Active);
    }

    #[tokio::test]
    async fn configured_skip_waiting_activates_immediately() {
        let mut settings = settings("v2.0");
        settings.skip_waiting = true;
        let mut controller =
            AssetCacheController::new(settings, Arc::new(MemoryStore::new()), Arc::new(site()));
        controller.install().await.unwrap();

        assert!(matches!(
            controller.activate(true).await.unwrap(),
            Activation::Activated { .. }
        ));
    }

    #[tokio::test]
    async fn requests_rejected_until_active() {
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(site()));
        controller.install().await.unwrap();

        assert!(matches!(
            controller.handle_fetch(&Request::get("/")).await,
            Err(ShelterError::ControllerNotActive { .. })
        ));
    }

    #[tokio::test]
    async fn image_cache_first_is_idempotent() {
        let fetcher = Arc::new(site());
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher.clone()).await;
        let before = fetcher.calls();

        let (source, _, first) = body_of(
            controller
                .handle_fetch(&Request::get("/img/a.png"))
                .await
                .unwrap(),
        );
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(fetcher.calls(), before + 1);

        let (source, _, second) = body_of(
            controller
                .handle_fetch(&Request::get("/img/a.png"))
                .await
                .unwrap(),
        );
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), before + 1);

        let stored = store
            .get("portfolio-dynamic-v2.0", &RequestKey::get("/img/a.png"))
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn stored_copy_matches_returned_body() {
        let fetcher = Arc::new(site());
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher).await;

        let (_, _, returned) = body_of(
            controller
                .handle_fetch(&Request::get("/api/projects"))
                .await
                .unwrap(),
        );
        let stored = store
            .get("portfolio-dynamic-v2.0", &RequestKey::get("/api/projects"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(returned, b"[]".to_vec());
        assert_eq!(stored.body, returned);
    }

    #[tokio::test]
    async fn scripts_and_styles_go_to_static() {
        let fetcher = Arc::new(site());
        fetcher.route("/static/js/chunk.js", 200, "chunk");
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher).await;

        controller
            .handle_fetch(&Request::get("/static/js/chunk.js"))
            .await
            .unwrap();

        let key = RequestKey::get("/static/js/chunk.js");
        assert!(store.get("portfolio-static-v2.0", &key).await.unwrap().is_some());
        assert!(store.get("portfolio-dynamic-v2.0", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn navigation_prefers_cache() {
        let fetcher = Arc::new(site());
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher.clone()).await;
        fetcher.set_offline(true);

        let (source, _, body) = body_of(controller.handle_fetch(&Request::get("/")).await.unwrap());
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(body, b"content of /".to_vec());
    }

    #[tokio::test]
    async fn navigation_falls_back_to_precached_offline_document() {
        // Manifest without the root or the offline document
        let mut settings = settings("v2.0");
        settings.manifest = vec!["/static/js/bundle.js".to_string()];

        let fetcher = Arc::new(site());
        let store = Arc::new(MemoryStore::new());
        let mut controller = AssetCacheController::new(settings, store.clone(), fetcher.clone());
        assert_eq!(controller.install().await.unwrap(), 2);
        controller.activate(false).await.unwrap();

        assert!(store
            .get("portfolio-static-v2.0", &RequestKey::get("/offline.html"))
            .await
            .unwrap()
            .is_some());
        assert!(store.entries("portfolio-dynamic-v2.0").await.unwrap().is_empty());
        fetcher.set_offline(true);

        let (source, status, body) =
            body_of(controller.handle_fetch(&Request::get("/")).await.unwrap());
        assert_eq!(source, ResponseSource::OfflineFallback);
        assert_eq!(status, 200);
        assert_eq!(body, b"content of /offline.html".to_vec());
        assert!(store.entries("portfolio-dynamic-v2.0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn navigation_without_offline_document_fails() {
        let fetcher = Arc::new(site());
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher.clone()).await;
        store.delete("portfolio-static-v2.0").await.unwrap();
        fetcher.set_offline(true);

        assert!(matches!(
            controller.handle_fetch(&Request::get("/index.html")).await,
            Err(ShelterError::OfflineNavigation { .. })
        ));
    }

    #[tokio::test]
    async fn navigation_miss_is_stored_in_dynamic() {
        let fetcher = Arc::new(site());
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher).await;
        store.delete("portfolio-static-v2.0").await.unwrap();

        let (source, _, _) = body_of(controller.handle_fetch(&Request::get("/")).await.unwrap());
        assert_eq!(source, ResponseSource::Network);
        assert!(store
            .get("portfolio-dynamic-v2.0", &RequestKey::get("/"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn network_first_stores_only_ok() {
        let fetcher = Arc::new(site());
        fetcher.route("/api/broken", 500, "boom");
        let store = Arc::new(MemoryStore::new());
        let controller = active("v2.0", store.clone(), fetcher.clone()).await;

        let (source, status, _) = body_of(
            controller
                .handle_fetch(&Request::get("/api/broken"))
                .await
                .unwrap(),
        );
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(status, 500);
        assert!(store
            .get("portfolio-dynamic-v2.0", &RequestKey::get("/api/broken"))
            .await
            .unwrap()
            .is_none());

        // Cached 200 is served once the network is gone
        controller
            .handle_fetch(&Request::get("/api/projects"))
            .await
            .unwrap();
        fetcher.set_offline(true);
        let (source, _, body) = body_of(
            controller
                .handle_fetch(&Request::get("/api/projects"))
                .await
                .unwrap(),
        );
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(body, b"[]".to_vec());

        assert!(matches!(
            controller.handle_fetch(&Request::get("/api/uncached")).await,
            Err(ShelterError::RuntimeFetch { .. })
        ));
    }

    #[tokio::test]
    async fn image_miss_offline_is_runtime_fetch_error() {
        let fetcher = Arc::new(site());
        let controller = active("v2.0", Arc::new(MemoryStore::new()), fetcher.clone()).await;
        fetcher.set_offline(true);

        let err = controller
            .handle_fetch(&Request::get("/img/b.png"))
            .await
            .unwrap_err();
        assert!(err.is_network_error());
    }

    #[tokio::test]
    async fn non_get_passes_through_without_store_access() {
        let fetcher = Arc::new(site());
        let store = Arc::new(ProbeStore::new());
        let controller = active("v2.0", store.clone(), fetcher.clone()).await;
        let (reads, writes, calls) = (store.reads(), store.writes(), fetcher.calls());

        for method in [Method::Post, Method::Put, Method::Delete] {
            let request = Request::new(method, "/index.html", Destination::Document);
            assert!(matches!(
                controller.handle_fetch(&request).await.unwrap(),
                FetchOutcome::Passthrough
            ));
        }

        assert_eq!(store.reads(), reads);
        assert_eq!(store.writes(), writes);
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn cache_write_failure_still_serves_response() {
        let fetcher = Arc::new(site());
        let store = Arc::new(ProbeStore::new());
        let controller = active("v2.0", store.clone(), fetcher).await;

        let failing = AssetCacheController::with_lifecycle(
            settings("v2.0"),
            controller.lifecycle().clone(),
            Arc::new(ProbeStore::failing_writes()),
            Arc::new(site()),
        );

        let (source, status, body) = body_of(
            failing
                .handle_fetch(&Request::get("/img/a.png"))
                .await
                .unwrap(),
        );
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(status, 200);
        assert_eq!(body, b"png bytes".to_vec());
    }

    #[tokio::test]
    async fn version_upgrade_scenario() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(site());

        let mut old = active("v1.0", store.clone(), fetcher.clone()).await;
        old.handle_fetch(&Request::get("/img/a.png")).await.unwrap();

        let mut new = AssetCacheController::new(settings("v2.0"), store.clone(), fetcher.clone());
        new.install().await.unwrap();
        assert_eq!(new.activate(true).await.unwrap(), Activation::Waiting);

        let activation = new.skip_waiting().await.unwrap();
        old.supersede().unwrap();
        assert_eq!(old.state(), LifecycleState::Redundant);
        match activation {
            Activation::Activated { mut deleted } => {
                deleted.sort();
                assert_eq!(deleted, vec!["portfolio-dynamic-v1.0", "portfolio-static-v1.0"]);
            }
            other => panic!("unexpected activation {other:?}"),
        }

        let before = fetcher.calls();
        let (source, _, _) =
            body_of(new.handle_fetch(&Request::get("/img/a.png")).await.unwrap());
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(fetcher.calls(), before + 1);

        let (source, _, _) =
            body_of(new.handle_fetch(&Request::get("/img/a.png")).await.unwrap());
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(fetcher.calls(), before + 1);
    }

    #[tokio::test]
    async fn dispatch_notification_events() {
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(site()));

        match controller
            .dispatch(LifecycleEvent::Push(Some("new talk".to_string())))
            .await
            .unwrap()
        {
            DispatchOutcome::Notification(n) => assert_eq!(n.body, "new talk"),
            other => panic!("unexpected outcome {other:?}"),
        }

        match controller
            .dispatch(LifecycleEvent::NotificationClick { action: None })
            .await
            .unwrap()
        {
            DispatchOutcome::NotificationClosed(click) => assert!(click.open_window.is_none()),
            other => panic!("unexpected outcome {other:?}"),
        }

        assert!(matches!(
            controller
                .dispatch(LifecycleEvent::Message(ControlMessage::CheckForUpdate))
                .await
                .unwrap(),
            DispatchOutcome::UpdateRequested
        ));
        assert!(matches!(
            controller
                .dispatch(LifecycleEvent::Sync {
                    tag: "background-sync".to_string()
                })
                .await
                .unwrap(),
            DispatchOutcome::Ignored
        ));
    }

    #[tokio::test]
    async fn dispatch_install_and_fetch() {
        let mut controller =
            AssetCacheController::new(settings("v2.0"), Arc::new(MemoryStore::new()), Arc::new(site()));

        assert!(matches!(
            controller.dispatch(LifecycleEvent::Install).await.unwrap(),
            DispatchOutcome::Installed { precached: 7 }
        ));
        assert!(matches!(
            controller.dispatch(LifecycleEvent::Activate).await.unwrap(),
            DispatchOutcome::Activation(Activation::Activated { .. })
        ));

        match controller
            .dispatch(LifecycleEvent::Fetch(Request::get("/favicon.ico")))
            .await
            .unwrap()
        {
            DispatchOutcome::Fetch(FetchOutcome::Served(served)) => {
                assert_eq!(served.source, ResponseSource::Cache);
                assert_eq!(served.response.body, Body::from("content of /favicon.ico"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
