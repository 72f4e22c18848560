//! Storage seam for cache partitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CacheEntry, CacheKey};
use crate::Error;

/// Raw partition storage, shared by all partition handles.
///
/// Implementations must make each operation individually atomic; there is no
/// cross-operation transaction spanning multiple partitions.
#[async_trait]
pub trait PartitionBackend: Send + Sync {
    /// Create a partition if it doesn't exist. Idempotent.
    async fn create(&self, name: &str) -> Result<(), Error>;

    /// All known partition names, sorted.
    async fn list(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition and everything in it. Deleting an absent partition
    /// is a no-op.
    async fn remove(&self, name: &str) -> Result<(), Error>;

    async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<CacheEntry>, Error>;

    /// Insert or overwrite by key (latest write wins). An overwrite counts as
    /// a fresh insertion for eviction ordering.
    async fn put(&self, name: &str, entry: CacheEntry) -> Result<(), Error>;

    /// Delete oldest-inserted entries until at most `keep` remain. Returns
    /// the number deleted.
    async fn evict_oldest(&self, name: &str, keep: usize) -> Result<u64, Error>;

    /// Delete entries inserted before `cutoff`. Returns the number deleted.
    async fn purge_older_than(&self, name: &str, cutoff: DateTime<Utc>) -> Result<u64, Error>;

    async fn len(&self, name: &str) -> Result<usize, Error>;

    /// Keys in insertion order, oldest first.
    async fn keys(&self, name: &str) -> Result<Vec<CacheKey>, Error>;
}
