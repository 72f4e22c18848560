//! Scripted network and push-API fakes shared by worker tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driftcache_client::{Network, NetworkError, PushApiError, Request, SubscriptionApi, SubscriptionKeys};
use driftcache_core::Error;
use driftcache_core::cache::{CacheEntry, CacheKey, MemoryPartitionBackend, PartitionBackend, ResponseSnapshot};
use tokio::sync::Mutex;

/// Network fake: responds per-URL, otherwise 200 with a synthetic body, and
/// can be switched to total failure.
#[derive(Debug, Default)]
pub(crate) struct ScriptedNetwork {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn respond(&self, url: &str, response: ResponseSnapshot) {
        self.responses.lock().await.insert(url.to_string(), response);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NetworkError::Transport("connection refused".to_string()));
        }

        let responses = self.responses.lock().await;
        Ok(responses
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| ResponseSnapshot::text(200, &format!("body for {}", request.url))))
    }
}

/// Partition backend whose reads and writes can be switched to fail,
/// delegating to an in-memory backend otherwise.
#[derive(Debug, Default)]
pub(crate) struct FailingPartitionBackend {
    inner: MemoryPartitionBackend,
    fail_lookups: AtomicBool,
    fail_puts: AtomicBool,
}

impl FailingPartitionBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_lookups(&self, failing: bool) {
        self.fail_lookups.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn fail_puts(&self, failing: bool) {
        self.fail_puts.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PartitionBackend for FailingPartitionBackend {
    async fn create(&self, name: &str) -> Result<(), Error> {
        self.inner.create(name).await
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        self.inner.list().await
    }

    async fn remove(&self, name: &str) -> Result<(), Error> {
        self.inner.remove(name).await
    }

    async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<CacheEntry>, Error> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Corrupt("scripted read failure".to_string()));
        }
        self.inner.lookup(name, key).await
    }

    async fn put(&self, name: &str, entry: CacheEntry) -> Result<(), Error> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::Corrupt("scripted write failure".to_string()));
        }
        self.inner.put(name, entry).await
    }

    async fn evict_oldest(&self, name: &str, keep: usize) -> Result<u64, Error> {
        self.inner.evict_oldest(name, keep).await
    }

    async fn purge_older_than(&self, name: &str, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        self.inner.purge_older_than(name, cutoff).await
    }

    async fn len(&self, name: &str) -> Result<usize, Error> {
        self.inner.len(name).await
    }

    async fn keys(&self, name: &str) -> Result<Vec<CacheKey>, Error> {
        self.inner.keys(name).await
    }
}

/// Push-API fake recording every call, optionally failing.
#[derive(Debug, Default)]
pub(crate) struct RecordingPushApi {
    subscribed: Mutex<Vec<(String, SubscriptionKeys)>>,
    unsubscribed: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingPushApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) async fn subscribed_endpoints(&self) -> Vec<String> {
        self.subscribed
            .lock()
            .await
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub(crate) async fn unsubscribed_endpoints(&self) -> Vec<String> {
        self.unsubscribed.lock().await.clone()
    }
}

#[async_trait]
impl SubscriptionApi for RecordingPushApi {
    async fn subscribe(&self, owner_token: &str, endpoint: &str, keys: &SubscriptionKeys) -> Result<(), PushApiError> {
        if owner_token.is_empty() {
            return Err(PushApiError::MissingToken);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PushApiError::Transport("connection refused".to_string()));
        }
        self.subscribed
            .lock()
            .await
            .push((endpoint.to_string(), keys.clone()));
        Ok(())
    }

    async fn unsubscribe(&self, owner_token: &str, endpoint: &str) -> Result<(), PushApiError> {
        if owner_token.is_empty() {
            return Err(PushApiError::MissingToken);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PushApiError::Transport("connection refused".to_string()));
        }
        self.unsubscribed.lock().await.push(endpoint.to_string());
        Ok(())
    }
}
