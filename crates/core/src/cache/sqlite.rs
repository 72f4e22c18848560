//! SQLite-backed partition storage.
//!
//! One database file holds every partition: a `partitions` registry table
//! plus an `entries` table keyed by (partition, key digest). Opened with WAL
//! mode for concurrent access and migrated through the shared runner.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::{Connection, params};
use tokio_rusqlite::rusqlite;

use super::{CacheEntry, CacheKey, PartitionBackend, ResponseSnapshot};
use crate::{Error, migrations};

const MIGRATIONS: &[(&str, &str)] = &[("1", include_str!("../../migrations/001_partitions.sql"))];

/// SQLite partition backend.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Cloning shares the connection.
#[derive(Clone, Debug)]
pub struct SqlitePartitionBackend {
    conn: Connection,
}

impl SqlitePartitionBackend {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Storage(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Storage(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Storage)?;

        migrations::run(&conn, MIGRATIONS).await?;

        Ok(Self { conn })
    }
}

struct RawEntry {
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
    inserted_at: String,
}

impl RawEntry {
    fn decode(self) -> Result<CacheEntry, Error> {
        let headers: BTreeMap<String, String> = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::Corrupt(format!("entry headers: {e}")))?;
        let inserted_at = DateTime::parse_from_rfc3339(&self.inserted_at)
            .map_err(|e| Error::Corrupt(format!("entry timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(CacheEntry {
            key: CacheKey::new(self.method, self.url),
            response: ResponseSnapshot::new(self.status, headers, self.body),
            inserted_at,
        })
    }
}

#[async_trait]
impl PartitionBackend for SqlitePartitionBackend {
    async fn create(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO partitions (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![name, Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn remove(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<CacheEntry>, Error> {
        let name = name.to_string();
        let digest = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, headers_json, body, inserted_at
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![name, digest], |row| {
                    Ok(RawEntry {
                        method: row.get(0)?,
                        url: row.get(1)?,
                        status: row.get(2)?,
                        headers_json: row.get(3)?,
                        body: row.get(4)?,
                        inserted_at: row.get(5)?,
                    })
                });

                match result {
                    Ok(raw) => Ok(Some(raw.decode()?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, entry: CacheEntry) -> Result<(), Error> {
        let name = name.to_string();
        let digest = entry.key.digest();
        let headers_json = serde_json::to_string(&entry.response.headers)
            .map_err(|e| Error::Corrupt(format!("entry headers: {e}")))?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        partition, key_hash, method, url, status, headers_json, body, inserted_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        inserted_at = excluded.inserted_at",
                    params![
                        name,
                        digest,
                        entry.key.method,
                        entry.key.url,
                        entry.response.status,
                        headers_json,
                        entry.response.body,
                        entry.inserted_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn evict_oldest(&self, name: &str, keep: usize) -> Result<u64, Error> {
        let name = name.to_string();
        let keep = keep as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE partition = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                if count <= keep {
                    return Ok(0);
                }

                let to_delete = count - keep;
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND rowid IN (
                        SELECT rowid FROM entries WHERE partition = ?1
                        ORDER BY inserted_at ASC, rowid ASC LIMIT ?2
                    )",
                    params![name, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn purge_older_than(&self, name: &str, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let name = name.to_string();
        let cutoff = cutoff.to_rfc3339();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND inserted_at < ?2",
                    params![name, cutoff],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn len(&self, name: &str) -> Result<usize, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE partition = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, name: &str) -> Result<Vec<CacheKey>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url FROM entries WHERE partition = ?1
                     ORDER BY inserted_at ASC, rowid ASC",
                )?;
                let keys = stmt
                    .query_map(params![name], |row| {
                        Ok(CacheKey { method: row.get(0)?, url: row.get(1)? })
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
