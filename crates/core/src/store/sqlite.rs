//! SQLite-backed content store.
//!
//! One database holds two logically identical tables, `stories` and
//! `bookmarks`; [`ContentDb`] hands out a per-table [`SqliteContentStore`]
//! sharing the same background-thread connection.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::{Connection, params};
use tokio_rusqlite::rusqlite;

use super::{ContentRecord, ContentStore};
use crate::{Error, migrations};

const MIGRATIONS: &[(&str, &str)] = &[
    ("1", include_str!("../../migrations/001_stories.sql")),
    ("2", include_str!("../../migrations/002_bookmarks.sql")),
];

#[derive(Debug, Clone, Copy)]
enum ContentTable {
    Stories,
    Bookmarks,
}

impl ContentTable {
    fn as_str(&self) -> &'static str {
        match self {
            ContentTable::Stories => "stories",
            ContentTable::Bookmarks => "bookmarks",
        }
    }
}

/// Content database handle.
#[derive(Clone, Debug)]
pub struct ContentDb {
    conn: Connection,
}

impl ContentDb {
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

    /// Store handle over the `stories` table.
    pub fn stories(&self) -> SqliteContentStore {
        SqliteContentStore { conn: self.conn.clone(), table: ContentTable::Stories }
    }

    /// Store handle over the `bookmarks` table.
    pub fn bookmarks(&self) -> SqliteContentStore {
        SqliteContentStore { conn: self.conn.clone(), table: ContentTable::Bookmarks }
    }
}

/// [`ContentStore`] over one table of a [`ContentDb`].
#[derive(Clone, Debug)]
pub struct SqliteContentStore {
    conn: Connection,
    table: ContentTable,
}

struct RawRecord {
    id: String,
    description: String,
    photo_url: String,
    lat: Option<f64>,
    lon: Option<f64>,
    created_at: String,
}

impl RawRecord {
    fn decode(self) -> Result<ContentRecord, Error> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| Error::Corrupt(format!("record timestamp: {e}")))?
            .with_timezone(&Utc);
        Ok(ContentRecord {
            id: self.id,
            description: self.description,
            photo_url: self.photo_url,
            lat: self.lat,
            lon: self.lon,
            created_at,
        })
    }
}

fn map_raw(row: &rusqlite::Row<'_>) -> Result<RawRecord, rusqlite::Error> {
    Ok(RawRecord {
        id: row.get(0)?,
        description: row.get(1)?,
        photo_url: row.get(2)?,
        lat: row.get(3)?,
        lon: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn upsert_sql(table: ContentTable) -> String {
    format!(
        "INSERT INTO {table} (id, description, photo_url, lat, lon, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            description = excluded.description,
            photo_url = excluded.photo_url,
            lat = excluded.lat,
            lon = excluded.lon,
            created_at = excluded.created_at",
        table = table.as_str()
    )
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn get(&self, id: &str) -> Result<Option<ContentRecord>, Error> {
        let id = id.to_string();
        let sql = format!(
            "SELECT id, description, photo_url, lat, lon, created_at FROM {} WHERE id = ?1",
            self.table.as_str()
        );
        self.conn
            .call(move |conn| -> Result<Option<ContentRecord>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![id], map_raw) {
                    Ok(raw) => Ok(Some(raw.decode()?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn get_all(&self) -> Result<Vec<ContentRecord>, Error> {
        let sql = format!(
            "SELECT id, description, photo_url, lat, lon, created_at FROM {} ORDER BY created_at DESC",
            self.table.as_str()
        );
        self.conn
            .call(move |conn| -> Result<Vec<ContentRecord>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                let raws = stmt
                    .query_map([], map_raw)?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                raws.into_iter().map(RawRecord::decode).collect()
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, record: ContentRecord) -> Result<(), Error> {
        let sql = upsert_sql(self.table);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    &sql,
                    params![
                        record.id,
                        record.description,
                        record.photo_url,
                        record.lat,
                        record.lon,
                        record.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn bulk_put(&self, records: Vec<ContentRecord>) -> Result<(), Error> {
        let sql = upsert_sql(self.table);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(&sql)?;
                    for record in &records {
                        stmt.execute(params![
                            record.id,
                            record.description,
                            record.photo_url,
                            record.lat,
                            record.lon,
                            record.created_at.to_rfc3339(),
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let id = id.to_string();
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table.as_str());
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(&sql, params![id])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn clear(&self) -> Result<(), Error> {
        let sql = format!("DELETE FROM {}", self.table.as_str());
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(&sql, [])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
