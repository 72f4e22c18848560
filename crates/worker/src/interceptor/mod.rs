//! Fetch interception: one total handler, four strategies.
//!
//! [`RequestInterceptor::handle`] always produces a response. Static assets
//! are cache-first with no write-back (install owns that partition's
//! contents); images are cache-first with bounded write-back; API calls are
//! network-first with cached fallback; navigations fall through request →
//! network → app shell → offline page. Storage failures along the way are
//! logged and treated as cache misses, never surfaced.

pub mod classify;

use std::sync::Arc;

use driftcache_core::cache::{CacheEntry, CacheKey, CachePartition, ResponseSnapshot};
use driftcache_client::{Network, Request};
use url::Url;

pub use classify::{Classifier, RequestClass};

/// Local paths the navigation fallback chain serves from the static
/// partition.
#[derive(Debug, Clone)]
pub struct ShellPaths {
    pub app_shell: String,
    pub offline_page: String,
}

/// Routes every intercepted request through the strategy for its class.
pub struct RequestInterceptor {
    network: Arc<dyn Network>,
    statics: CachePartition,
    images: CachePartition,
    api: CachePartition,
    classifier: Classifier,
    origin: Url,
    shell: ShellPaths,
}

impl RequestInterceptor {
    pub fn new(
        network: Arc<dyn Network>, statics: CachePartition, images: CachePartition, api: CachePartition,
        classifier: Classifier, origin: Url, shell: ShellPaths,
    ) -> Self {
        Self { network, statics, images, api, classifier, origin, shell }
    }

    /// Handle one request. Total: every path ends in a response, worst case
    /// a synthesized offline 503.
    pub async fn handle(&self, request: &Request) -> ResponseSnapshot {
        match self.classifier.classify(request) {
            RequestClass::Navigation => self.navigation(request).await,
            RequestClass::Image => self.cache_first_bounded(request).await,
            RequestClass::RemoteApi => self.network_first(request).await,
            RequestClass::Static => self.cache_first(request).await,
        }
    }

    /// Static assets: serve from cache, go to the network on a miss, never
    /// write back. The static partition only changes at install.
    async fn cache_first(&self, request: &Request) -> ResponseSnapshot {
        if let Some(entry) = self.lookup(&self.statics, &request.cache_key()).await {
            return entry.response;
        }
        match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "static fetch failed with no cached copy");
                offline_text()
            }
        }
    }

    /// Images: serve from cache; on a miss fetch and write back successful
    /// responses, letting the partition bounds evict. Offline with no copy
    /// gets a text placeholder.
    async fn cache_first_bounded(&self, request: &Request) -> ResponseSnapshot {
        let key = request.cache_key();
        if let Some(entry) = self.lookup(&self.images, &key).await {
            return entry.response;
        }
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_back(&self.images, key, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "image unavailable offline");
                ResponseSnapshot::text(503, "Image not available offline")
            }
        }
    }

    /// API calls: try the network, refresh the cache on a successful GET,
    /// fall back to the cached copy, and synthesize an offline error shaped
    /// for the caller's declared preference as a last resort.
    async fn network_first(&self, request: &Request) -> ResponseSnapshot {
        let key = request.cache_key();
        match self.network.fetch(request).await {
            Ok(response) => {
                if request.is_get() && response.is_success() {
                    self.write_back(&self.api, key, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "API fetch failed, falling back to cache");
                if let Some(entry) = self.lookup(&self.api, &key).await {
                    return entry.response;
                }
                if request.wants_json() {
                    ResponseSnapshot::json(503, &serde_json::json!({"error": true, "message": "offline"}))
                } else {
                    offline_text()
                }
            }
        }
    }

    /// Navigations: cached copy of the exact page → network → app shell →
    /// offline page → synthesized 503.
    async fn navigation(&self, request: &Request) -> ResponseSnapshot {
        if let Some(entry) = self.lookup(&self.statics, &request.cache_key()).await {
            return entry.response;
        }
        match self.network.fetch(request).await {
            Ok(response) => return response,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation fetch failed, serving shell");
            }
        }
        if let Some(response) = self.shell_lookup(&self.shell.app_shell).await {
            return response;
        }
        if let Some(response) = self.shell_lookup(&self.shell.offline_page).await {
            return response;
        }
        offline_text()
    }

    async fn shell_lookup(&self, path: &str) -> Option<ResponseSnapshot> {
        let url = match self.origin.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(path, error = %e, "bad shell path");
                return None;
            }
        };
        self.lookup(&self.statics, &CacheKey::get(url.as_str()))
            .await
            .map(|entry| entry.response)
    }

    /// Lookup that degrades storage failure to a miss.
    async fn lookup(&self, partition: &CachePartition, key: &CacheKey) -> Option<CacheEntry> {
        match partition.lookup(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(partition = partition.name(), url = %key.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Write-back that degrades storage failure to a log line.
    async fn write_back(&self, partition: &CachePartition, key: CacheKey, response: &ResponseSnapshot) {
        if let Err(e) = partition.put(CacheEntry::new(key, response.clone())).await {
            tracing::warn!(partition = partition.name(), error = %e, "cache write failed");
        }
    }
}

fn offline_text() -> ResponseSnapshot {
    ResponseSnapshot::text(503, "Content not available offline")
}
