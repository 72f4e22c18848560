//! Network edge for driftcache.
//!
//! This crate provides the outbound HTTP surface: the `Network` seam the
//! interceptor fetches through (with a reqwest production client), and the
//! remote push-subscription API client.

pub mod fetch;
pub mod push_api;

pub use fetch::{FetchClient, FetchConfig, Network, NetworkError, Request};
pub use push_api::{PushApi, PushApiConfig, PushApiError, SubscriptionApi, SubscriptionKeys};
