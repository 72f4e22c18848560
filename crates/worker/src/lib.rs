//! Event-driven offline interception worker.
//!
//! This crate is the background process that sits between the application
//! and the network: it classifies every outgoing request, serves it through
//! one of four fetch strategies backed by versioned cache partitions, manages
//! partition lifecycle across versions, and runs the push notification
//! channel. No handler ever surfaces an unhandled failure to the caller;
//! fallback chains resolve everything locally.
//!
//! The worker is a constructed service object with injected storage,
//! network, and platform seams, and events are delivered through an explicit
//! dispatch table rather than host-runtime listener registration, so every
//! path is callable directly in tests.

pub mod clients;
pub mod dispatch;
pub mod error;
pub mod interceptor;
pub mod lifecycle;
pub mod push;

#[cfg(test)]
pub(crate) mod testutil;

pub use clients::{ClientRegistry, ClientWindow, MemoryClientRegistry};
pub use dispatch::{EventOutcome, Worker, WorkerDeps, WorkerEvent};
pub use error::{PushError, WorkerError};
pub use interceptor::{Classifier, RequestClass, RequestInterceptor, ShellPaths};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleManager};
pub use push::{
    ClickAction, MemoryPushGateway, Notification, PermissionOutcome, PermissionState, PushChannel, PushGateway,
    Subscription, SubscriptionState, UnsubscribeOutcome,
};
