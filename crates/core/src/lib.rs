//! Core types and shared functionality for driftcache.
//!
//! This crate provides:
//! - Versioned, bounded cache partitions with SQLite and in-memory backends
//! - A durable, schema-versioned content store for feed records
//! - Layered configuration
//! - Unified error types

pub mod cache;
pub mod config;
pub mod error;
pub(crate) mod migrations;
pub mod store;
pub mod version;

pub use cache::{CacheEntry, CacheKey, CachePartition, PartitionBackend, PartitionBounds, ResponseSnapshot};
pub use config::AppConfig;
pub use error::Error;
pub use store::{ContentRecord, ContentStore};
pub use version::{PartitionKind, VersionTag};
