//! Worker assembly and event dispatch.
//!
//! [`Worker::new`] wires the lifecycle manager, interceptor, and push
//! channel from configuration plus injected backends, and [`Worker::dispatch`]
//! is the single entry point the host runtime drives: one call per delivered
//! event, one outcome per call. Tests reach the components directly through
//! the accessors.

use std::sync::Arc;

use driftcache_core::cache::{CachePartition, PartitionBackend, PartitionBounds, ResponseSnapshot};
use driftcache_core::store::ContentStore;
use driftcache_core::{AppConfig, PartitionKind, VersionTag};
use driftcache_client::{Network, Request, SubscriptionApi};
use url::Url;

use crate::clients::ClientRegistry;
use crate::error::WorkerError;
use crate::interceptor::{Classifier, RequestInterceptor, ShellPaths};
use crate::lifecycle::{ActivateReport, InstallReport, LifecycleManager};
use crate::push::gateway::PushGateway;
use crate::push::{ClickAction, Notification, PushChannel};

/// One event delivered by the host runtime.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(Vec<u8>),
    NotificationClick { url: String },
}

/// What dispatching one event produced.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Response(ResponseSnapshot),
    Notified(Notification),
    Clicked(ClickAction),
}

/// Injected platform and storage seams.
pub struct WorkerDeps {
    pub partitions: Arc<dyn PartitionBackend>,
    pub store: Arc<dyn ContentStore>,
    pub network: Arc<dyn Network>,
    pub gateway: Arc<dyn PushGateway>,
    pub clients: Arc<dyn ClientRegistry>,
    pub push_api: Arc<dyn SubscriptionApi>,
}

/// The assembled worker.
pub struct Worker {
    lifecycle: LifecycleManager,
    interceptor: RequestInterceptor,
    push: PushChannel,
    store: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").finish_non_exhaustive()
    }
}

impl Worker {
    /// Assemble a worker from configuration and injected seams, opening the
    /// current version's partitions up front. Fails only on malformed
    /// configuration.
    pub async fn new(config: &AppConfig, deps: WorkerDeps) -> Result<Self, WorkerError> {
        let origin = Url::parse(&config.app_origin)
            .map_err(|e| WorkerError::Config(format!("app_origin {}: {e}", config.app_origin)))?;
        let api_base = Url::parse(&config.api_base_url)
            .map_err(|e| WorkerError::Config(format!("api_base_url {}: {e}", config.api_base_url)))?;
        let tag = VersionTag::new(&config.version_tag);

        let statics = CachePartition::open(
            deps.partitions.clone(),
            tag.partition_name(PartitionKind::Static),
            PartitionBounds::unbounded(),
        )
        .await?;
        let images = CachePartition::open(
            deps.partitions.clone(),
            tag.partition_name(PartitionKind::Image),
            PartitionBounds::new(Some(config.image_max_entries), Some(config.image_max_age())),
        )
        .await?;
        let api = CachePartition::open(
            deps.partitions.clone(),
            tag.partition_name(PartitionKind::Api),
            PartitionBounds::new(Some(config.api_max_entries), Some(config.api_max_age())),
        )
        .await?;

        let lifecycle = LifecycleManager::new(
            deps.partitions,
            deps.network.clone(),
            deps.clients.clone(),
            tag,
            origin.clone(),
            config.precache.clone(),
        );

        let classifier = Classifier::new(api_base, config.photo_path_segments.clone())?;
        let interceptor = RequestInterceptor::new(
            deps.network,
            statics,
            images,
            api,
            classifier,
            origin,
            ShellPaths { app_shell: config.app_shell.clone(), offline_page: config.offline_page.clone() },
        );

        let push = PushChannel::new(deps.gateway, deps.push_api, deps.clients, config.vapid_public_key.clone());

        Ok(Self { lifecycle, interceptor, push, store: deps.store })
    }

    /// Dispatch one host event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => Ok(EventOutcome::Installed(self.lifecycle.on_install().await?)),
            WorkerEvent::Activate => Ok(EventOutcome::Activated(self.lifecycle.on_activate().await?)),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Response(self.interceptor.handle(&request).await)),
            WorkerEvent::Push(payload) => Ok(EventOutcome::Notified(self.push.on_push(&payload).await)),
            WorkerEvent::NotificationClick { url } => {
                Ok(EventOutcome::Clicked(self.push.on_notification_click(&url).await))
            }
        }
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn interceptor(&self) -> &RequestInterceptor {
        &self.interceptor
    }

    pub fn push(&self) -> &PushChannel {
        &self.push
    }

    /// Durable content store for application records; accessed by the app
    /// layer directly, never by the fetch strategies.
    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryClientRegistry;
    use crate::push::MemoryPushGateway;
    use crate::testutil::{RecordingPushApi, ScriptedNetwork};
    use driftcache_core::cache::MemoryPartitionBackend;
    use driftcache_core::store::MemoryContentStore;

    struct Fixture {
        network: Arc<ScriptedNetwork>,
        backend: Arc<MemoryPartitionBackend>,
        clients: Arc<MemoryClientRegistry>,
        worker: Worker,
    }

    async fn fixture(config: AppConfig) -> Fixture {
        let network = Arc::new(ScriptedNetwork::new());
        let backend = Arc::new(MemoryPartitionBackend::new());
        let clients = Arc::new(MemoryClientRegistry::new());
        let deps = WorkerDeps {
            partitions: backend.clone(),
            store: Arc::new(MemoryContentStore::new()),
            network: network.clone(),
            gateway: Arc::new(MemoryPushGateway::new()),
            clients: clients.clone(),
            push_api: Arc::new(RecordingPushApi::new()),
        };
        let worker = Worker::new(&config, deps).await.unwrap();
        Fixture { network, backend, clients, worker }
    }

    #[tokio::test]
    async fn test_new_rejects_bad_origin() {
        let config = AppConfig { app_origin: "not a url".into(), ..Default::default() };
        let deps = WorkerDeps {
            partitions: Arc::new(MemoryPartitionBackend::new()),
            store: Arc::new(MemoryContentStore::new()),
            network: Arc::new(ScriptedNetwork::new()),
            gateway: Arc::new(MemoryPushGateway::new()),
            clients: Arc::new(MemoryClientRegistry::new()),
            push_api: Arc::new(RecordingPushApi::new()),
        };
        let err = Worker::new(&config, deps).await.unwrap_err();
        assert!(err.to_string().contains("CONFIG_INVALID"));
    }

    #[tokio::test]
    async fn test_install_activate_fetch_cycle() {
        let f = fixture(AppConfig::default()).await;

        let installed = f.worker.dispatch(WorkerEvent::Install).await.unwrap();
        let EventOutcome::Installed(report) = installed else {
            panic!("expected install outcome");
        };
        assert_eq!(report.precached.len(), AppConfig::default().precache.len());

        f.backend.create("static-v0").await.unwrap();
        let activated = f.worker.dispatch(WorkerEvent::Activate).await.unwrap();
        let EventOutcome::Activated(report) = activated else {
            panic!("expected activate outcome");
        };
        assert_eq!(report.removed, vec!["static-v0"]);
        assert!(f.clients.claimed());

        // Precached shell asset now serves without the network.
        f.network.set_failing(true);
        let request = Request::get(Url::parse("http://localhost:8080/app.js").unwrap());
        let outcome = f.worker.dispatch(WorkerEvent::Fetch(request)).await.unwrap();
        let EventOutcome::Response(response) = outcome else {
            panic!("expected response outcome");
        };
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_push_event_shows_notification() {
        let f = fixture(AppConfig::default()).await;
        let outcome = f
            .worker
            .dispatch(WorkerEvent::Push(b"{\"title\": \"hi\"}".to_vec()))
            .await
            .unwrap();
        let EventOutcome::Notified(notification) = outcome else {
            panic!("expected notification outcome");
        };
        assert_eq!(notification.title, "hi");
    }

    #[tokio::test]
    async fn test_click_event_opens_window() {
        let f = fixture(AppConfig::default()).await;
        let outcome = f
            .worker
            .dispatch(WorkerEvent::NotificationClick { url: "/stories/1".into() })
            .await
            .unwrap();
        let EventOutcome::Clicked(action) = outcome else {
            panic!("expected click outcome");
        };
        assert_eq!(action, ClickAction::Opened("/stories/1".to_string()));
        assert_eq!(f.clients.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_content_store_accessor() {
        let f = fixture(AppConfig::default()).await;
        assert!(f.worker.content_store().get_all().await.unwrap().is_empty());
    }
}
