//! Install and activate transitions for versioned cache partitions.
//!
//! Install provisions the partitions for the current version tag and warms
//! the static partition with the precache manifest; activate sweeps every
//! partition owned by an older tag and claims all open clients. Both are
//! idempotent, so a crashed transition can simply be re-run.

use std::sync::Arc;

use driftcache_core::cache::{CacheEntry, CachePartition, PartitionBackend, PartitionBounds};
use driftcache_core::{PartitionKind, VersionTag};
use driftcache_client::{Network, Request};
use url::Url;

use crate::clients::ClientRegistry;
use crate::error::WorkerError;

/// What an install pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Names of the partitions provisioned for this version.
    pub partitions: Vec<String>,
    /// URLs written into the static partition.
    pub precached: Vec<String>,
}

/// What an activate pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Stale partitions that were removed.
    pub removed: Vec<String>,
    /// Stale partitions whose removal failed and was deferred.
    pub skipped: Vec<String>,
}

/// Drives the install and activate transitions.
pub struct LifecycleManager {
    backend: Arc<dyn PartitionBackend>,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientRegistry>,
    tag: VersionTag,
    origin: Url,
    precache: Vec<String>,
}

impl LifecycleManager {
    pub fn new(
        backend: Arc<dyn PartitionBackend>, network: Arc<dyn Network>, clients: Arc<dyn ClientRegistry>,
        tag: VersionTag, origin: Url, precache: Vec<String>,
    ) -> Self {
        Self { backend, network, clients, tag, origin, precache }
    }

    pub fn tag(&self) -> &VersionTag {
        &self.tag
    }

    /// Provision this version's partitions and warm the static partition
    /// with every precache URL. Any fetch or write failure abandons the
    /// install; re-running after a partial attempt overwrites cleanly.
    pub async fn on_install(&self) -> Result<InstallReport, WorkerError> {
        let mut partitions = Vec::with_capacity(PartitionKind::ALL.len());
        for kind in PartitionKind::ALL {
            let name = self.tag.partition_name(kind);
            self.backend.create(&name).await?;
            partitions.push(name);
        }

        let statics = CachePartition::open(
            self.backend.clone(),
            self.tag.partition_name(PartitionKind::Static),
            PartitionBounds::unbounded(),
        )
        .await?;

        let mut precached = Vec::with_capacity(self.precache.len());
        for path in &self.precache {
            let url = self
                .origin
                .join(path)
                .map_err(|e| WorkerError::Precache(format!("bad precache path {path}: {e}")))?;
            let request = Request::get(url.clone());

            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| WorkerError::Precache(format!("{url}: {e}")))?;
            if !response.is_success() {
                return Err(WorkerError::Precache(format!("{url}: status {}", response.status)));
            }

            statics.put(CacheEntry::new(request.cache_key(), response)).await?;
            precached.push(url.to_string());
        }

        tracing::info!(tag = %self.tag, precached = precached.len(), "install complete, taking over immediately");
        Ok(InstallReport { partitions, precached })
    }

    /// Remove every partition owned by an older version tag, then claim all
    /// open clients. A partition that fails to delete is logged and left for
    /// the next activation.
    pub async fn on_activate(&self) -> Result<ActivateReport, WorkerError> {
        let mut removed = Vec::new();
        let mut skipped = Vec::new();

        for name in self.backend.list().await? {
            if self.tag.owns(&name) {
                continue;
            }
            match self.backend.remove(&name).await {
                Ok(()) => {
                    tracing::info!(partition = %name, "removed stale partition");
                    removed.push(name);
                }
                Err(e) => {
                    tracing::warn!(partition = %name, error = %e, "failed to remove stale partition, deferring");
                    skipped.push(name);
                }
            }
        }

        self.clients.claim().await;
        Ok(ActivateReport { removed, skipped })
    }
}
