//! In-memory content store for tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{ContentRecord, ContentStore};
use crate::Error;

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    records: Mutex<BTreeMap<String, ContentRecord>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get(&self, id: &str) -> Result<Option<ContentRecord>, Error> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<ContentRecord>, Error> {
        let records = self.records.lock().await;
        let mut all: Vec<ContentRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn put(&self, record: ContentRecord) -> Result<(), Error> {
        self.records.lock().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn bulk_put(&self, records: Vec<ContentRecord>) -> Result<(), Error> {
        let mut map = self.records.lock().await;
        for record in records {
            map.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        self.records.lock().await.remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.records.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            description: "a story".to_string(),
            photo_url: "https://photos.example.com/p.jpg".to_string(),
            lat: None,
            lon: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_roundtrip() {
        let store = MemoryContentStore::new();
        store.put(record("s1")).await.unwrap();
        assert!(store.get("s1").await.unwrap().is_some());

        store.delete("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_put_then_clear() {
        let store = MemoryContentStore::new();
        store.bulk_put(vec![record("a"), record("b")]).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 2);

        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
