//! HTTP fetcher over `ureq`

use super::{FetchError, Fetcher};
use crate::http::{Headers, Method, Request, Response};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Fetches over HTTP(S) against a base origin
///
/// `ureq` is blocking, so each fetch runs on tokio's blocking pool. No
/// timeout is configured: a hung origin hangs the request.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpFetcher {
    /// Create a fetcher resolving relative URLs against `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into(),
        }
    }

    /// Resolve a request URL against the base origin
    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        let unsupported = |e: url::ParseError| FetchError::Unsupported {
            url: url.to_string(),
            reason: e.to_string(),
        };

        match Url::parse(url) {
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&self.base_url).and_then(|base| base.join(url)).map_err(unsupported)
            }
            other => other.map_err(unsupported),
        }
    }

    fn perform(agent: &ureq::Agent, method: &Method, url: &str, headers: &Headers) -> Result<Response, FetchError> {
        let http_method = ureq::http::Method::from_bytes(method.as_str().as_bytes()).map_err(|e| {
            FetchError::Unsupported {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut builder = ureq::http::Request::builder().method(http_method).uri(url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let request = builder.body(()).map_err(|e| FetchError::Unsupported {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = agent.run(request).map_err(|e| FetchError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let (parts, mut body) = response.into_parts();
        let bytes = body.read_to_vec().map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Ok(Response {
            status: parts.status.as_u16(),
            headers,
            body: bytes.into(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = self.resolve(&request.url)?.to_string();
        let agent = self.agent.clone();
        let method = request.method.clone();
        let headers = request.headers.clone();

        debug!("HTTP {} {}", method, url);
        let task_url = url.clone();
        tokio::task::spawn_blocking(move || Self::perform(&agent, &method, &task_url, &headers))
            .await
            .map_err(|e| FetchError::Unreachable {
                url,
                reason: format!("fetch task failed: {}", e),
            })?
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
