//! Fetcher that serves a local build directory

use super::{content_type_for, FetchError, Fetcher};
use crate::http::{Method, Request, Response};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Serves files from a compiled site directory
///
/// `/` and any path ending in `/` map to `index.html`. Missing files and
/// paths escaping the root answer 404, like a static file server would.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL path onto a file below the root
    fn file_for(&self, path: &str) -> Option<PathBuf> {
        let mut relative = path.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str("index.html");
        }

        let relative = Path::new(&relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        if !matches!(request.method, Method::Get | Method::Head) {
            return Ok(Response::new(405, "method not allowed"));
        }

        let path = request.path();
        let Some(file) = self.file_for(&path) else {
            return Ok(Response::new(404, "not found"));
        };

        debug!("Serving {} from {}", path, file.display());
        match fs::read(&file).await {
            Ok(bytes) => {
                let len = bytes.len();
                let body = if request.method == Method::Head {
                    Vec::new()
                } else {
                    bytes
                };
                Ok(Response::ok(body)
                    .with_header("content-type", content_type_for(&file.to_string_lossy()))
                    .with_header("content-length", len.to_string()))
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory
                ) =>
            {
                Ok(Response::new(404, "not found"))
            }
            Err(e) => Err(FetchError::Body {
                url: request.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
