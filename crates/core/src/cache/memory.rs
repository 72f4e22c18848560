//! In-memory partition storage for tests.
//!
//! Keeps entries in insertion order per partition, mirroring the SQLite
//! backend's eviction ordering and latest-write-wins semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{CacheEntry, CacheKey, PartitionBackend};
use crate::Error;

/// Insertion-ordered in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryPartitionBackend {
    partitions: Mutex<BTreeMap<String, Vec<CacheEntry>>>,
}

impl MemoryPartitionBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionBackend for MemoryPartitionBackend {
    async fn create(&self, name: &str) -> Result<(), Error> {
        self.partitions
            .lock()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        Ok(self.partitions.lock().await.keys().cloned().collect())
    }

    async fn remove(&self, name: &str) -> Result<(), Error> {
        self.partitions.lock().await.remove(name);
        Ok(())
    }

    async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<CacheEntry>, Error> {
        let partitions = self.partitions.lock().await;
        let digest = key.digest();
        Ok(partitions
            .get(name)
            .and_then(|entries| entries.iter().find(|e| e.key.digest() == digest))
            .cloned())
    }

    async fn put(&self, name: &str, entry: CacheEntry) -> Result<(), Error> {
        let mut partitions = self.partitions.lock().await;
        let entries = partitions
            .get_mut(name)
            .ok_or_else(|| Error::PartitionMissing(name.to_string()))?;
        let digest = entry.key.digest();
        entries.retain(|e| e.key.digest() != digest);
        entries.push(entry);
        Ok(())
    }

    async fn evict_oldest(&self, name: &str, keep: usize) -> Result<u64, Error> {
        let mut partitions = self.partitions.lock().await;
        let Some(entries) = partitions.get_mut(name) else {
            return Ok(0);
        };
        let mut evicted = 0;
        while entries.len() > keep {
            entries.remove(0);
            evicted += 1;
        }
        Ok(evicted)
    }

    async fn purge_older_than(&self, name: &str, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let mut partitions = self.partitions.lock().await;
        let Some(entries) = partitions.get_mut(name) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|e| e.inserted_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn len(&self, name: &str) -> Result<usize, Error> {
        Ok(self
            .partitions
            .lock()
            .await
            .get(name)
            .map(Vec::len)
            .unwrap_or(0))
    }

    async fn keys(&self, name: &str) -> Result<Vec<CacheKey>, Error> {
        Ok(self
            .partitions
            .lock()
            .await
            .get(name)
            .map(|entries| entries.iter().map(|e| e.key.clone()).collect())
            .unwrap_or_default())
    }
}
