//! Request classification and event routing
//!
//! Everything here is pure: [`Router::route`] turns a [`LifecycleEvent`] into
//! an [`Effect`] describing what the host should do, without touching a store
//! or the network. The controller executes effects.

use super::partitions::{CacheNames, PartitionKind};
use crate::http::{Destination, Method, Request};
use crate::notify::{ClickResponse, Notification, NotificationHandler};
use tracing::debug;

/// How an intercepted request is handled, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Non-GET: not intercepted
    Passthrough,
    /// The site root or main document
    Navigation,
    Image,
    /// Scripts and stylesheets
    Asset,
    Other,
}

/// Classify a request; the first matching rule wins
pub fn classify(request: &Request) -> RequestClass {
    if request.method != Method::Get {
        return RequestClass::Passthrough;
    }

    if matches!(request.path().as_str(), "/" | "/index.html") {
        return RequestClass::Navigation;
    }

    match request.destination {
        Destination::Image => RequestClass::Image,
        Destination::Script | Destination::Style => RequestClass::Asset,
        _ => RequestClass::Other,
    }
}

/// Caching strategy for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Cache hit first, else network (stored), else the offline document
    NetworkWithCacheFallback {
        store: PartitionKind,
        offline_url: String,
    },
    /// Cache hit, else network (stored); no fallback
    CacheFirst { store: PartitionKind },
    /// Network (stored when `require_ok` is met), else any cached entry
    NetworkFirst {
        store: PartitionKind,
        require_ok: bool,
    },
}

impl Strategy {
    /// The strategy for a request class, `None` for passthrough
    pub fn for_class(class: RequestClass, offline_url: &str) -> Option<Self> {
        match class {
            RequestClass::Passthrough => None,
            RequestClass::Navigation => Some(Self::NetworkWithCacheFallback {
                store: PartitionKind::Dynamic,
                offline_url: offline_url.to_string(),
            }),
            RequestClass::Image => Some(Self::CacheFirst {
                store: PartitionKind::Dynamic,
            }),
            RequestClass::Asset => Some(Self::CacheFirst {
                store: PartitionKind::Static,
            }),
            RequestClass::Other => Some(Self::NetworkFirst {
                store: PartitionKind::Dynamic,
                require_ok: true,
            }),
        }
    }

    /// Partition that successful network responses are written to
    pub fn store(&self) -> PartitionKind {
        match self {
            Self::NetworkWithCacheFallback { store, .. }
            | Self::CacheFirst { store }
            | Self::NetworkFirst { store, .. } => *store,
        }
    }
}

/// The manifest plus the offline document, which must always be precached
pub fn precache_set(manifest: &[String], offline_url: &str) -> Vec<String> {
    let mut urls = manifest.to_vec();
    if !offline_url.is_empty() && !urls.iter().any(|url| url == offline_url) {
        debug!("Offline document {} not in manifest, precaching it", offline_url);
        urls.push(offline_url.to_string());
    }
    urls
}

/// Structured message posted by a page
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Take over without waiting for older pages to close
    SkipWaiting,
    /// Re-check whether a newer version should install
    CheckForUpdate,
    /// Anything else; logged and ignored
    Other(serde_json::Value),
}

impl ControlMessage {
    /// Interpret a posted message by its `type` field
    pub fn from_json(value: serde_json::Value) -> Self {
        match value.get("type").and_then(|t| t.as_str()) {
            Some("SKIP_WAITING") => Self::SkipWaiting,
            Some("CHECK_FOR_UPDATE") => Self::CheckForUpdate,
            _ => Self::Other(value),
        }
    }
}

/// Everything the host can deliver to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(Option<String>),
    NotificationClick { action: Option<String> },
    Sync { tag: String },
    Message(ControlMessage),
}

/// Side effect requested by routing an event
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch every URL and store them all, or nothing
    Precache { partition: String, urls: Vec<String> },
    /// Delete every partition that is not one of `keep`'s
    CollectGarbage { keep: CacheNames },
    /// Let the request go to the network untouched
    Passthrough,
    /// Answer the request with this strategy
    Respond { strategy: Strategy },
    ShowNotification(Notification),
    CloseNotification(ClickResponse),
    SkipWaiting,
    CheckForUpdate,
    Ignore,
}

/// Pure event router for one controller version
#[derive(Debug, Clone)]
pub struct Router {
    names: CacheNames,
    manifest: Vec<String>,
    offline_url: String,
    notifications: NotificationHandler,
}

impl Router {
    pub fn new(
        names: CacheNames,
        manifest: Vec<String>,
        offline_url: impl Into<String>,
        notifications: NotificationHandler,
    ) -> Self {
        Self {
            names,
            manifest,
            offline_url: offline_url.into(),
            notifications,
        }
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    /// Map an event to the effect the host should carry out
    pub fn route(&self, event: &LifecycleEvent) -> Effect {
        match event {
            LifecycleEvent::Install => Effect::Precache {
                partition: self.names.static_name(),
                urls: self.precache_urls(),
            },
            LifecycleEvent::Activate => Effect::CollectGarbage {
                keep: self.names.clone(),
            },
            LifecycleEvent::Fetch(request) => self.route_fetch(request),
            LifecycleEvent::Push(payload) => {
                Effect::ShowNotification(self.notifications.on_push(payload.as_deref()))
            }
            LifecycleEvent::NotificationClick { action } => {
                Effect::CloseNotification(self.notifications.on_click(action.as_deref()))
            }
            LifecycleEvent::Sync { tag } => {
                self.notifications.on_sync(tag);
                Effect::Ignore
            }
            LifecycleEvent::Message(ControlMessage::SkipWaiting) => Effect::SkipWaiting,
            LifecycleEvent::Message(ControlMessage::CheckForUpdate) => Effect::CheckForUpdate,
            LifecycleEvent::Message(ControlMessage::Other(value)) => {
                debug!("Ignoring message: {}", value);
                Effect::Ignore
            }
        }
    }

    pub fn precache_urls(&self) -> Vec<String> {
        precache_set(&self.manifest, &self.offline_url)
    }

    /// Routing for a single intercepted request
    pub fn route_fetch(&self, request: &Request) -> Effect {
        let class = classify(request);
        debug!("{} {} classified as {:?}", request.method, request.url, class);

        match Strategy::for_class(class, &self.offline_url) {
            Some(strategy) => Effect::Respond { strategy },
            None => Effect::Passthrough,
        }
    }
}
