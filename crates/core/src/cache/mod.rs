//! Bounded, versioned cache partitions for response snapshots.
//!
//! A partition is a named collection of previously-observed network
//! responses, addressed by request identity (method + URL). Partitions are
//! process-wide and shared by concurrent handlers; a single put or evict is
//! atomic, racing writers resolve with last-write-wins, and eviction only
//! happens as a side effect of a write.
//!
//! Two backends implement the same [`PartitionBackend`] seam: a SQLite store
//! for production and an insertion-ordered in-memory store for tests.

pub mod backend;
pub mod hash;
pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use backend::PartitionBackend;
pub use memory::MemoryPartitionBackend;
pub use sqlite::SqlitePartitionBackend;

use crate::Error;

/// Request identity: method plus normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let method: String = method.into();
        Self { method: method.to_uppercase(), url: url.into() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Stable hex digest used as the storage key.
    pub fn digest(&self) -> String {
        hash::compute_entry_key(&self.method, &self.url)
    }
}

/// Immutable snapshot of an HTTP response: status, headers, body bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    /// Plain-text response with the given status.
    pub fn text(status: u16, body: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        Self { status, headers, body: body.as_bytes().to_vec() }
    }

    /// JSON response with the given status.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self { status, headers, body: serde_json::to_vec(value).unwrap_or_default() }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// A cached response snapshot together with its key and insertion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub response: ResponseSnapshot,
    pub inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, response: ResponseSnapshot) -> Self {
        Self { key, response, inserted_at: Utc::now() }
    }
}

/// Capacity and freshness bounds for a partition.
///
/// The bounds are independent and applied in sequence: a write enforces
/// `max_entries` by insertion-order eviction first, then purges rows past
/// `max_age`. Lookups re-check age, so a physically present stale row reads
/// as a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionBounds {
    pub max_entries: Option<usize>,
    pub max_age: Option<Duration>,
}

impl PartitionBounds {
    pub fn new(max_entries: Option<usize>, max_age: Option<Duration>) -> Self {
        Self { max_entries, max_age }
    }

    /// No capacity or freshness bound (the static partition).
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn capped(max_entries: usize) -> Self {
        Self { max_entries: Some(max_entries), max_age: None }
    }
}

/// Handle to one named partition, enforcing its bounds on every operation.
#[derive(Clone)]
pub struct CachePartition {
    backend: Arc<dyn PartitionBackend>,
    name: String,
    bounds: PartitionBounds,
}

impl CachePartition {
    /// Open (creating if absent) a named partition on the given backend.
    pub async fn open(
        backend: Arc<dyn PartitionBackend>, name: impl Into<String>, bounds: PartitionBounds,
    ) -> Result<Self, Error> {
        let name = name.into();
        backend.create(&name).await?;
        Ok(Self { backend, name, bounds })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an entry by key; entries past `max_age` are treated as absent
    /// even if still physically stored.
    pub async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, Error> {
        let entry = self.backend.lookup(&self.name, key).await?;
        Ok(entry.filter(|e| self.is_fresh(e)))
    }

    /// Insert or overwrite an entry, then enforce the partition bounds:
    /// oldest-inserted entries are evicted past the capacity cap, and stale
    /// rows are purged opportunistically.
    pub async fn put(&self, entry: CacheEntry) -> Result<(), Error> {
        self.backend.put(&self.name, entry).await?;

        if let Some(max) = self.bounds.max_entries {
            let evicted = self.backend.evict_oldest(&self.name, max).await?;
            if evicted > 0 {
                tracing::debug!(partition = %self.name, evicted, "evicted oldest entries past capacity");
            }
        }

        if let Some(max_age) = self.bounds.max_age {
            let purged = self.backend.purge_older_than(&self.name, Utc::now() - max_age).await?;
            if purged > 0 {
                tracing::debug!(partition = %self.name, purged, "purged stale entries");
            }
        }

        Ok(())
    }

    pub async fn len(&self) -> Result<usize, Error> {
        self.backend.len(&self.name).await
    }

    /// Keys in insertion order, oldest first.
    pub async fn keys(&self) -> Result<Vec<CacheKey>, Error> {
        self.backend.keys(&self.name).await
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.bounds.max_age {
            Some(max_age) => entry.inserted_at > Utc::now() - max_age,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> CacheEntry {
        CacheEntry::new(CacheKey::get(url), ResponseSnapshot::text(200, "body"))
    }

    async fn open(bounds: PartitionBounds) -> CachePartition {
        let backend = Arc::new(MemoryPartitionBackend::new());
        CachePartition::open(backend, "image-v1", bounds).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let partition = open(PartitionBounds::unbounded()).await;
        partition.put(entry("https://example.com/a.png")).await.unwrap();

        let hit = partition
            .lookup(&CacheKey::get("https://example.com/a.png"))
            .await
            .unwrap();
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().response.status, 200);
    }

    #[tokio::test]
    async fn test_latest_write_wins() {
        let partition = open(PartitionBounds::unbounded()).await;
        let key = CacheKey::get("https://example.com/a.png");
        partition
            .put(CacheEntry::new(key.clone(), ResponseSnapshot::text(200, "one")))
            .await
            .unwrap();
        partition
            .put(CacheEntry::new(key.clone(), ResponseSnapshot::text(200, "two")))
            .await
            .unwrap();

        assert_eq!(partition.len().await.unwrap(), 1);
        let hit = partition.lookup(&key).await.unwrap().unwrap();
        assert_eq!(hit.response.body, b"two");
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let partition = open(PartitionBounds::capped(2)).await;
        partition.put(entry("https://example.com/a.png")).await.unwrap();
        partition.put(entry("https://example.com/b.png")).await.unwrap();
        partition.put(entry("https://example.com/c.png")).await.unwrap();

        assert_eq!(partition.len().await.unwrap(), 2);
        let keys = partition.keys().await.unwrap();
        let urls: Vec<&str> = keys.iter().map(|k| k.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/b.png", "https://example.com/c.png"]);
        assert!(
            partition
                .lookup(&CacheKey::get("https://example.com/a.png"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_stale_entry_reads_as_miss() {
        let backend = Arc::new(MemoryPartitionBackend::new());
        let partition = CachePartition::open(
            backend.clone(),
            "api-v1",
            PartitionBounds::new(None, Some(Duration::from_secs(300))),
        )
        .await
        .unwrap();

        let key = CacheKey::get("https://api.example.com/v1/stories");
        let mut stale = CacheEntry::new(key.clone(), ResponseSnapshot::text(200, "old"));
        stale.inserted_at = Utc::now() - Duration::from_secs(600);
        backend.put("api-v1", stale).await.unwrap();

        assert!(partition.lookup(&key).await.unwrap().is_none());
        assert_eq!(partition.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_entries_purged_on_write() {
        let backend = Arc::new(MemoryPartitionBackend::new());
        let partition = CachePartition::open(
            backend.clone(),
            "api-v1",
            PartitionBounds::new(None, Some(Duration::from_secs(300))),
        )
        .await
        .unwrap();

        let mut stale = CacheEntry::new(
            CacheKey::get("https://api.example.com/v1/stories?page=1"),
            ResponseSnapshot::text(200, "old"),
        );
        stale.inserted_at = Utc::now() - Duration::from_secs(600);
        backend.put("api-v1", stale).await.unwrap();

        partition
            .put(entry("https://api.example.com/v1/stories?page=2"))
            .await
            .unwrap();

        assert_eq!(partition.len().await.unwrap(), 1);
    }

    #[test]
    fn test_cache_key_normalizes_method() {
        let key = CacheKey::new("get", "https://example.com/");
        assert_eq!(key.method, "GET");
        assert_eq!(key.digest(), CacheKey::get("https://example.com/").digest());
    }

    #[test]
    fn test_snapshot_helpers() {
        let text = ResponseSnapshot::text(503, "offline");
        assert_eq!(text.status, 503);
        assert_eq!(text.content_type(), Some("text/plain"));
        assert!(!text.is_success());

        let json = ResponseSnapshot::json(503, &serde_json::json!({"error": true}));
        assert_eq!(json.content_type(), Some("application/json"));
        let value: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
        assert_eq!(value["error"], true);
    }
}
