//! Network fetch primitive
//!
//! A fetch resolves to a [`Response`] of any status; only transport-level
//! failures (offline, unreachable host, broken body) are errors. This matches
//! the platform contract the controller is written against.

mod dir;
mod factory;
mod http;

pub use dir::DirFetcher;
pub use factory::create_fetcher;
pub use http::HttpFetcher;

use crate::http::{Request, Response};
use async_trait::async_trait;
use thiserror::Error;

/// Transport-level fetch failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network is offline")]
    Offline,

    #[error("{url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("reading body of {url} failed: {reason}")]
    Body { url: String, reason: String },

    #[error("unsupported request to {url}: {reason}")]
    Unsupported { url: String, reason: String },
}

/// Abstract network interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;

    /// Human-readable backend name for display
    fn name(&self) -> &'static str;
}

/// A network that is always down
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, _request: &Request) -> Result<Response, FetchError> {
        Err(FetchError::Offline)
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

/// Guess a content type from a path's extension
pub(crate) fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        _ => "application/octet-stream",
    }
}
