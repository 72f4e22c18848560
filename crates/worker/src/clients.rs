//! Open application windows, as seen from the worker.
//!
//! Activation claims control of all open clients, and notification clicks
//! either focus an existing window or open a new one. The registry is a
//! platform seam with an in-memory implementation for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// One open application window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// Platform seam over the host's client windows.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Claim control of all open clients immediately.
    async fn claim(&self);

    /// All open windows, including uncontrolled ones.
    async fn list(&self) -> Vec<ClientWindow>;

    /// Focus a window by id; false if it no longer exists.
    async fn focus(&self, id: &str) -> bool;

    /// Open a new window at a URL; false if the host refused.
    async fn open(&self, url: &str) -> bool;
}

/// In-memory registry for tests.
#[derive(Debug, Default)]
pub struct MemoryClientRegistry {
    windows: Mutex<Vec<ClientWindow>>,
    claimed: AtomicBool,
    focused: Mutex<Option<String>>,
    next_id: AtomicUsize,
}

impl MemoryClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an open window.
    pub async fn add_window(&self, url: &str) -> String {
        let id = format!("window-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.windows
            .lock()
            .await
            .push(ClientWindow { id: id.clone(), url: url.to_string() });
        id
    }

    pub fn claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    pub async fn focused(&self) -> Option<String> {
        self.focused.lock().await.clone()
    }
}

#[async_trait]
impl ClientRegistry for MemoryClientRegistry {
    async fn claim(&self) {
        self.claimed.store(true, Ordering::SeqCst);
    }

    async fn list(&self) -> Vec<ClientWindow> {
        self.windows.lock().await.clone()
    }

    async fn focus(&self, id: &str) -> bool {
        let windows = self.windows.lock().await;
        if windows.iter().any(|w| w.id == id) {
            *self.focused.lock().await = Some(id.to_string());
            true
        } else {
            false
        }
    }

    async fn open(&self, url: &str) -> bool {
        let _ = self.add_window(url).await;
        true
    }
}
