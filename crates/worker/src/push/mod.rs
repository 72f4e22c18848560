//! Push notification channel.
//!
//! Subscribe walks permission → platform subscription → server registration
//! and is idempotent; unsubscribe cancels locally first and reports server
//! failure without failing the operation. Incoming push payloads always
//! produce exactly one notification, falling back to defaults on malformed
//! payloads, and a notification click focuses an existing window or opens a
//! new one.

pub mod gateway;

use std::sync::Arc;

use driftcache_client::SubscriptionApi;
use serde::Deserialize;
use tokio::sync::Mutex;

pub use gateway::{MemoryPushGateway, PermissionOutcome, PermissionState, PushGateway, Subscription};

use crate::clients::ClientRegistry;
use crate::error::PushError;

const DEFAULT_TITLE: &str = "Story Feed";
const DEFAULT_BODY: &str = "A new story is waiting for you";
const DEFAULT_URL: &str = "/";

/// A notification as displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    /// Target URL opened or focused when the notification is clicked.
    pub url: String,
}

/// Wire shape of a push payload. Every field is optional; missing or
/// unparseable pieces fall back to defaults.
#[derive(Debug, Default, Deserialize)]
struct PushMessage {
    title: Option<String>,
    #[serde(default)]
    options: PushOptions,
}

#[derive(Debug, Default, Deserialize)]
struct PushOptions {
    body: Option<String>,
    icon: Option<String>,
    badge: Option<String>,
    #[serde(default)]
    data: PushData,
}

#[derive(Debug, Default, Deserialize)]
struct PushData {
    url: Option<String>,
}

/// Where the channel currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed,
    /// Permission was denied; terminal until out-of-band user action.
    Denied,
}

/// What a notification click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// An existing window showing the target was focused.
    Focused(String),
    /// A new window was opened at the target URL.
    Opened(String),
}

/// Result of an unsubscribe. Local cancellation and server notification are
/// reported separately; a server failure does not undo the local cancel.
#[derive(Debug, Clone)]
pub struct UnsubscribeOutcome {
    pub had_subscription: bool,
    pub server_notified: bool,
    pub server_error: Option<String>,
}

/// The push channel state machine.
pub struct PushChannel {
    gateway: Arc<dyn PushGateway>,
    api: Arc<dyn SubscriptionApi>,
    clients: Arc<dyn ClientRegistry>,
    server_key: Option<String>,
    state: Mutex<SubscriptionState>,
}

impl PushChannel {
    pub fn new(
        gateway: Arc<dyn PushGateway>, api: Arc<dyn SubscriptionApi>, clients: Arc<dyn ClientRegistry>,
        server_key: Option<String>,
    ) -> Self {
        Self { gateway, api, clients, server_key, state: Mutex::new(SubscriptionState::Unsubscribed) }
    }

    pub async fn state(&self) -> SubscriptionState {
        *self.state.lock().await
    }

    /// Subscribe the caller to push notifications: resolve permission,
    /// reuse or create the platform subscription, and register it with the
    /// server under the caller's token. Idempotent for a live subscription.
    pub async fn subscribe(&self, owner_token: &str) -> Result<Subscription, PushError> {
        if owner_token.is_empty() {
            return Err(PushError::MissingToken);
        }

        self.resolve_permission().await?;

        if let Some(existing) = self.gateway.subscription().await {
            *self.state.lock().await = SubscriptionState::Subscribed;
            return Ok(existing);
        }

        let server_key = self
            .server_key
            .as_deref()
            .ok_or_else(|| PushError::SubscribeFailed("no server key configured".to_string()))?;
        let subscription = self.gateway.subscribe(server_key).await?;

        if let Err(e) = self
            .api
            .subscribe(owner_token, &subscription.endpoint, &subscription.keys)
            .await
        {
            // Roll back so a later retry starts clean.
            let _ = self.gateway.unsubscribe().await;
            return Err(PushError::ServerRegister(e));
        }

        *self.state.lock().await = SubscriptionState::Subscribed;
        tracing::info!(endpoint = %subscription.endpoint, "push subscription registered");
        Ok(subscription)
    }

    /// Cancel the subscription. Local cancellation happens first and is
    /// never undone; a server notification failure is reported in the
    /// outcome rather than failing the call.
    pub async fn unsubscribe(&self, owner_token: &str) -> Result<UnsubscribeOutcome, PushError> {
        if owner_token.is_empty() {
            return Err(PushError::MissingToken);
        }

        let Some(subscription) = self.gateway.subscription().await else {
            return Ok(UnsubscribeOutcome { had_subscription: false, server_notified: false, server_error: None });
        };

        let cancelled = self.gateway.unsubscribe().await;
        if !cancelled {
            return Err(PushError::UnsubscribeFailed("platform refused to cancel".to_string()));
        }
        *self.state.lock().await = SubscriptionState::Unsubscribed;

        match self.api.unsubscribe(owner_token, &subscription.endpoint).await {
            Ok(()) => Ok(UnsubscribeOutcome { had_subscription: true, server_notified: true, server_error: None }),
            Err(e) => {
                tracing::warn!(endpoint = %subscription.endpoint, error = %e, "server unsubscribe failed");
                Ok(UnsubscribeOutcome {
                    had_subscription: true,
                    server_notified: false,
                    server_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Handle an incoming push payload. Always shows exactly one
    /// notification; malformed payloads fall back to the defaults.
    pub async fn on_push(&self, payload: &[u8]) -> Notification {
        let message: PushMessage = serde_json::from_slice(payload).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "unparseable push payload, using defaults");
            PushMessage::default()
        });

        let notification = Notification {
            title: message.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: message.options.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: message.options.icon,
            badge: message.options.badge,
            url: message.options.data.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
        };

        self.gateway.show_notification(&notification).await;
        notification
    }

    /// Handle a click on a displayed notification: close it, then focus an
    /// open window already showing the target, or open a new one.
    pub async fn on_notification_click(&self, url: &str) -> ClickAction {
        self.gateway.close_notification().await;

        for window in self.clients.list().await {
            if window.url.contains(url) && self.clients.focus(&window.id).await {
                return ClickAction::Focused(window.id);
            }
        }

        self.clients.open(url).await;
        ClickAction::Opened(url.to_string())
    }

    async fn resolve_permission(&self) -> Result<(), PushError> {
        match self.gateway.permission().await {
            PermissionState::Granted => Ok(()),
            PermissionState::Denied => {
                *self.state.lock().await = SubscriptionState::Denied;
                Err(PushError::PermissionDenied)
            }
            PermissionState::Prompt => match self.gateway.request_permission().await {
                PermissionOutcome::Granted => Ok(()),
                PermissionOutcome::Denied => {
                    *self.state.lock().await = SubscriptionState::Denied;
                    Err(PushError::PermissionDenied)
                }
                PermissionOutcome::Dismissed => Err(PushError::PermissionDismissed),
            },
        }
    }
}
