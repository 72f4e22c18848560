//! Unified error types for driftcache-core.
//!
//! Storage failures are surfaced as structured values and abandoned rather
//! than retried; callers in the interception layer decide whether a failed
//! read degrades to a miss or crosses the component boundary.

use tokio_rusqlite::rusqlite;

/// Unified error type for the cache and content stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed (quota, corruption, closed connection).
    #[error("STORAGE_UNAVAILABLE: {0}")]
    Storage(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_UNAVAILABLE: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded back into its in-memory shape.
    #[error("STORAGE_CORRUPT: {0}")]
    Corrupt(String),

    /// Operation addressed a partition that was never created.
    #[error("PARTITION_MISSING: {0}")]
    PartitionMissing(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Storage(tokio_rusqlite::Error::Close(c)),
            _ => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Storage(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PartitionMissing("image-v1".to_string());
        assert!(err.to_string().contains("PARTITION_MISSING"));
        assert!(err.to_string().contains("image-v1"));
    }

    #[test]
    fn test_migration_error_display() {
        let err = Error::MigrationFailed("bad version".to_string());
        assert!(err.to_string().contains("migration failed"));
    }
}
