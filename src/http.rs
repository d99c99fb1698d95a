//! Request and response model seen by the cache controller
//!
//! Response bodies are single-read: [`Body`] is not `Clone`, and the only way
//! to keep a response while also handing it to a caller is
//! [`Response::duplicate`], which yields two independently owned copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// HTTP request method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(m) => m,
        }
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            _ => Self::Other(upper),
        })
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of resource the page asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    /// Fetch/XHR calls and anything the page did not tag
    #[default]
    Empty,
}

impl Destination {
    /// Guess the destination from a path's file extension
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("html" | "htm") => Self::Document,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "avif") => Self::Image,
            Some("js" | "mjs") => Self::Script,
            Some("css") => Self::Style,
            Some("woff" | "woff2" | "ttf" | "otf") => Self::Font,
            Some("webmanifest") => Self::Manifest,
            _ if path.is_empty() || path.ends_with('/') => Self::Document,
            _ => Self::Empty,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Script => "script",
            Self::Style => "style",
            Self::Font => "font",
            Self::Manifest => "manifest",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Header map with case-insensitive (lowercased) names
pub type Headers = BTreeMap<String, String>;

/// One intercepted fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL or origin-relative path
    pub url: String,
    pub destination: Destination,
    pub headers: Headers,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>, destination: Destination) -> Self {
        Self {
            method,
            url: url.into(),
            destination,
            headers: Headers::new(),
        }
    }

    /// GET request with the destination inferred from the path
    pub fn get(url: impl Into<String>) -> Self {
        let url = url.into();
        let destination = Destination::from_path(&url_path(&url));
        Self::new(Method::Get, url, destination)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Normalized URL path without scheme, authority, query or fragment
    pub fn path(&self) -> String {
        url_path(&self.url)
    }

    /// The cache identity of this request
    pub fn key(&self) -> RequestKey {
        RequestKey {
            method: self.method.clone(),
            url: self.url.clone(),
        }
    }
}

/// Origin that relative references are resolved against when only the path matters
const PATH_BASE: &str = "http://localhost/";

/// Parse an absolute URL, or resolve a relative reference against a placeholder origin
pub fn parse_url(url: &str) -> Result<Url, url::ParseError> {
    match Url::parse(url) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(PATH_BASE)?.join(url),
        other => other,
    }
}

/// Normalized path of an absolute URL or a relative reference
///
/// Dot segments (including `%2E` forms) are resolved and the query and
/// fragment dropped. An unparseable URL yields its raw text.
pub fn url_path(url: &str) -> String {
    match parse_url(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// Cache key: request method plus URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
}

impl PartialOrd for Method {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Method {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl RequestKey {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
        }
    }

    /// Stable SHA256 hex digest, used as the on-disk entry name
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Single-read response body
#[derive(Debug, PartialEq, Eq)]
pub struct Body(Vec<u8>);

impl Body {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the body
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

/// A response obtained from the network or read out of a partition
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Split into two independently consumable copies.
    ///
    /// Must be called before either copy is read when the response is both
    /// returned to the page and written to a partition.
    pub fn duplicate(self) -> (Response, Response) {
        let copy = Response {
            status: self.status,
            headers: self.headers.clone(),
            body: Body(self.body.0.clone()),
        };
        (self, copy)
    }

    /// Consume the response into a storable snapshot
    pub fn into_stored(self) -> StoredResponse {
        StoredResponse {
            status: self.status,
            headers: self.headers,
            body: self.body.into_bytes(),
            stored_at: Utc::now(),
        }
    }
}

/// Snapshot of a response held by a cache partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: Headers,
    #[serde(with = "hex_body")]
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
    /// Materialize a fresh readable response from the snapshot
    pub fn to_response(&self) -> Response {
        Response {
            status: self.status,
            headers: self.headers.clone(),
            body: Body(self.body.clone()),
        }
    }
}

mod hex_body {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
