//! Platform seam for push permission, subscription, and notifications.
//!
//! The channel state machine lives above this trait; the gateway only
//! exposes what the host platform actually provides. Tests drive the
//! channel through [`MemoryPushGateway`], which scripts the permission
//! prompt and records shown notifications.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use driftcache_client::SubscriptionKeys;
use tokio::sync::Mutex;

use crate::error::PushError;
use crate::push::Notification;

/// Current notification permission, read without prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not yet decided; a prompt may be shown.
    Prompt,
}

/// How the user answered a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// Prompt closed without an answer; permission stays undecided.
    Dismissed,
}

/// One push subscription as the platform hands it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Host-platform push and notification operations.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Current permission, without prompting.
    async fn permission(&self) -> PermissionState;

    /// Show the permission prompt and wait for the user's answer.
    async fn request_permission(&self) -> PermissionOutcome;

    /// The existing subscription, if one is live.
    async fn subscription(&self) -> Option<Subscription>;

    /// Create a subscription against the push service.
    async fn subscribe(&self, server_key: &str) -> Result<Subscription, PushError>;

    /// Cancel the live subscription; false if none existed.
    async fn unsubscribe(&self) -> bool;

    /// Display a notification.
    async fn show_notification(&self, notification: &Notification);

    /// Close a displayed notification.
    async fn close_notification(&self);
}

/// Scriptable in-memory gateway for tests.
pub struct MemoryPushGateway {
    permission: Mutex<PermissionState>,
    prompt_outcome: Mutex<PermissionOutcome>,
    subscription: Mutex<Option<Subscription>>,
    next_endpoint: AtomicUsize,
    shown: Mutex<Vec<Notification>>,
    closed: AtomicUsize,
}

impl Default for MemoryPushGateway {
    fn default() -> Self {
        Self {
            permission: Mutex::new(PermissionState::Granted),
            prompt_outcome: Mutex::new(PermissionOutcome::Granted),
            subscription: Mutex::new(None),
            next_endpoint: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
        }
    }
}

impl MemoryPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_permission(&self, state: PermissionState) {
        *self.permission.lock().await = state;
    }

    /// Script the answer the next prompt produces.
    pub async fn set_prompt_outcome(&self, outcome: PermissionOutcome) {
        *self.prompt_outcome.lock().await = outcome;
    }

    pub async fn shown(&self) -> Vec<Notification> {
        self.shown.lock().await.clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushGateway for MemoryPushGateway {
    async fn permission(&self) -> PermissionState {
        *self.permission.lock().await
    }

    async fn request_permission(&self) -> PermissionOutcome {
        let outcome = *self.prompt_outcome.lock().await;
        match outcome {
            PermissionOutcome::Granted => *self.permission.lock().await = PermissionState::Granted,
            PermissionOutcome::Denied => *self.permission.lock().await = PermissionState::Denied,
            PermissionOutcome::Dismissed => {}
        }
        outcome
    }

    async fn subscription(&self) -> Option<Subscription> {
        self.subscription.lock().await.clone()
    }

    async fn subscribe(&self, server_key: &str) -> Result<Subscription, PushError> {
        if server_key.is_empty() {
            return Err(PushError::SubscribeFailed("empty server key".to_string()));
        }
        let n = self.next_endpoint.fetch_add(1, Ordering::SeqCst);
        let subscription = Subscription {
            endpoint: format!("https://push.example.com/endpoint/{n}"),
            keys: SubscriptionKeys { p256dh: format!("p256dh-{n}"), auth: format!("auth-{n}") },
        };
        *self.subscription.lock().await = Some(subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&self) -> bool {
        self.subscription.lock().await.take().is_some()
    }

    async fn show_notification(&self, notification: &Notification) {
        self.shown.lock().await.push(notification.clone());
    }

    async fn close_notification(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
