//! Durable content records.
//!
//! The content store is the application's final fallback when a list-style
//! read fails both network and cache: list responses are not individually
//! cacheable objects, so this is the only place per-item history survives
//! across sessions. Records are immutable once stored except by explicit
//! overwrite, keyed solely by id.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryContentStore;
pub use sqlite::{ContentDb, SqliteContentStore};

use crate::Error;

/// One story/bookmark record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub description: String,
    pub photo_url: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Keyed record persistence surviving process restarts.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<ContentRecord>, Error>;

    async fn get_all(&self) -> Result<Vec<ContentRecord>, Error>;

    /// Upsert a single record.
    async fn put(&self, record: ContentRecord) -> Result<(), Error>;

    /// Upsert a batch transactionally: either all records are applied or
    /// none are.
    async fn bulk_put(&self, records: Vec<ContentRecord>) -> Result<(), Error>;

    async fn delete(&self, id: &str) -> Result<(), Error>;

    async fn clear(&self) -> Result<(), Error>;
}
