//! HTTP fetch seam and reqwest production client.
//!
//! The interceptor never talks to the network directly; it fetches through
//! the [`Network`] trait so tests can substitute scripted transports. The
//! production [`FetchClient`] returns a full response snapshot for any HTTP
//! status, since strategies need non-200 responses intact, and errors only
//! on transport-level failure or timeout.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use driftcache_core::cache::{CacheKey, ResponseSnapshot};
use reqwest::Client;
use url::Url;

/// Transport-level fetch failures. HTTP error statuses are not errors here;
/// they come back as snapshots.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    #[error("NETWORK_UNREACHABLE: {0}")]
    Transport(String),

    #[error("FETCH_TIMEOUT: {0}")]
    Timeout(String),

    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),
}

/// An outgoing request as seen by the interception layer: method, URL, and
/// headers, matching the fetch event payload.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        let method: String = method.into();
        Self { method: method.to_uppercase(), url, headers: BTreeMap::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Add a header; names are normalized to lowercase.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn accept(&self) -> Option<&str> {
        self.headers.get("accept").map(String::as_str)
    }

    /// Whether the caller's declared media-type preference is HTML.
    pub fn wants_html(&self) -> bool {
        self.accept().is_some_and(|a| a.contains("text/html"))
    }

    /// Whether the caller's declared media-type preference is JSON.
    pub fn wants_json(&self) -> bool {
        self.accept().is_some_and(|a| a.contains("application/json"))
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.method, self.url.as_str())
    }
}

/// Asynchronous network seam.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, NetworkError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "driftcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "driftcache/0.1".to_string(),
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

/// Production [`Network`] implementation over reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| NetworkError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, NetworkError> {
        let start = Instant::now();

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(format!("method {}: {e}", request.method)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout(e.to_string())
            } else {
                NetworkError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Transport(format!("failed to read response: {e}")))?
            .to_vec();

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseSnapshot::new(status, headers, body))
    }
}
