//! Remote push-subscription API client.
//!
//! ### Specification
//!
//! - **Endpoints**: `POST {base}/notifications/subscribe` and
//!   `DELETE {base}/notifications/subscribe`.
//! - **Authentication**: bearer-style owner token.
//! - **Bodies**: subscribe sends `{endpoint, keys:{p256dh, auth}}`;
//!   unsubscribe sends `{endpoint}` only.
//! - **Replies**: JSON `{error, message}`; a reply with `error: true` is
//!   surfaced as a rejection even on a 2xx status.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "driftcache/0.1";

/// Client key material identifying a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Push API client errors. Always structured values, never panics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PushApiError {
    #[error("AUTH_REQUIRED: owner token is empty")]
    MissingToken,

    #[error("PUSH_API_TRANSPORT: {0}")]
    Transport(String),

    #[error("PUSH_API_REJECTED: {0}")]
    Rejected(String),
}

/// Remote subscription registry seam; the worker's push channel talks to the
/// server through this so tests can count what was actually sent.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    async fn subscribe(&self, owner_token: &str, endpoint: &str, keys: &SubscriptionKeys) -> Result<(), PushApiError>;

    async fn unsubscribe(&self, owner_token: &str, endpoint: &str) -> Result<(), PushApiError>;
}

/// Push API client configuration.
#[derive(Debug, Clone)]
pub struct PushApiConfig {
    /// API base URL, e.g. `https://story-api.example.com/v1`.
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl PushApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), timeout: DEFAULT_TIMEOUT, user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

#[derive(Serialize)]
struct SubscribeBody<'a> {
    endpoint: &'a str,
    keys: &'a SubscriptionKeys,
}

#[derive(Serialize)]
struct UnsubscribeBody<'a> {
    endpoint: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: String,
}

/// Production push API client over reqwest.
#[derive(Debug, Clone)]
pub struct PushApi {
    http: reqwest::Client,
    config: PushApiConfig,
}

impl PushApi {
    /// Create a new client with the given configuration.
    pub fn new(config: PushApiConfig) -> Result<Self, PushApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PushApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn subscribe_url(&self) -> String {
        format!("{}/notifications/subscribe", self.config.base_url.trim_end_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<(), PushApiError> {
        let status = response.status();
        let reply: ApiReply = response.json().await.unwrap_or_default();

        if !status.is_success() || reply.error {
            let message = if reply.message.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                reply.message
            };
            return Err(PushApiError::Rejected(message));
        }

        Ok(())
    }
}

#[async_trait]
impl SubscriptionApi for PushApi {
    async fn subscribe(&self, owner_token: &str, endpoint: &str, keys: &SubscriptionKeys) -> Result<(), PushApiError> {
        if owner_token.is_empty() {
            return Err(PushApiError::MissingToken);
        }

        let response = self
            .http
            .post(self.subscribe_url())
            .bearer_auth(owner_token)
            .json(&SubscribeBody { endpoint, keys })
            .send()
            .await
            .map_err(|e| PushApiError::Transport(e.to_string()))?;

        Self::check(response).await?;
        tracing::debug!(endpoint, "registered push subscription with server");
        Ok(())
    }

    async fn unsubscribe(&self, owner_token: &str, endpoint: &str) -> Result<(), PushApiError> {
        if owner_token.is_empty() {
            return Err(PushApiError::MissingToken);
        }

        let response = self
            .http
            .delete(self.subscribe_url())
            .bearer_auth(owner_token)
            .json(&UnsubscribeBody { endpoint })
            .send()
            .await
            .map_err(|e| PushApiError::Transport(e.to_string()))?;

        Self::check(response).await?;
        tracing::debug!(endpoint, "removed push subscription from server");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_url_trims_trailing_slash() {
        let api = PushApi::new(PushApiConfig::new("https://story-api.example.com/v1/")).unwrap();
        assert_eq!(
            api.subscribe_url(),
            "https://story-api.example.com/v1/notifications/subscribe"
        );
    }

    #[test]
    fn test_subscribe_body_shape() {
        let keys = SubscriptionKeys { p256dh: "pk".into(), auth: "secret".into() };
        let body = serde_json::to_value(SubscribeBody { endpoint: "https://push.example/ep1", keys: &keys }).unwrap();
        assert_eq!(body["endpoint"], "https://push.example/ep1");
        assert_eq!(body["keys"]["p256dh"], "pk");
        assert_eq!(body["keys"]["auth"], "secret");
    }

    #[test]
    fn test_unsubscribe_body_shape() {
        let body = serde_json::to_value(UnsubscribeBody { endpoint: "https://push.example/ep1" }).unwrap();
        assert_eq!(body, serde_json::json!({"endpoint": "https://push.example/ep1"}));
    }

    #[test]
    fn test_reply_defaults() {
        let reply: ApiReply = serde_json::from_str("{}").unwrap();
        assert!(!reply.error);
        assert!(reply.message.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = PushApiError::Rejected("token expired".to_string());
        assert!(err.to_string().contains("PUSH_API_REJECTED"));
        assert!(err.to_string().contains("token expired"));
    }
}
