//! Worker error types.
//!
//! Only subscription-management and storage/install failures cross the
//! component boundary; everything inside the fetch fallback chain is
//! resolved locally and never becomes an error.

use driftcache_client::PushApiError;

/// Lifecycle and dispatch failures.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Storage(#[from] driftcache_core::Error),

    /// A precache fetch or write failed; the install attempt is abandoned
    /// and the host runtime retries later.
    #[error("PRECACHE_FAILED: {0}")]
    Precache(String),

    #[error("CONFIG_INVALID: {0}")]
    Config(String),
}

/// Structured push-channel failures, carrying a human-readable reason.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("AUTH_REQUIRED: owner token is empty")]
    MissingToken,

    /// The user declined notification permission; the channel is in its
    /// terminal Denied state until out-of-band user action.
    #[error("PERMISSION_DENIED: notification permission was denied")]
    PermissionDenied,

    /// The permission prompt was dismissed without an answer.
    #[error("PERMISSION_DISMISSED: permission prompt was dismissed")]
    PermissionDismissed,

    #[error("SUBSCRIBE_FAILED: {0}")]
    SubscribeFailed(String),

    #[error("UNSUBSCRIBE_FAILED: {0}")]
    UnsubscribeFailed(String),

    #[error("SERVER_REGISTER_FAILED: {0}")]
    ServerRegister(#[from] PushApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_error_display() {
        let err = PushError::SubscribeFailed("no key material".to_string());
        assert!(err.to_string().contains("SUBSCRIBE_FAILED"));
        assert!(err.to_string().contains("no key material"));
    }

    #[test]
    fn test_worker_error_from_storage() {
        let err: WorkerError = driftcache_core::Error::PartitionMissing("image-v1".into()).into();
        assert!(err.to_string().contains("PARTITION_MISSING"));
    }
}
