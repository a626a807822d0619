//! TTL lifecycle management for short-lived managed Kubernetes clusters.

pub mod aws;
pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod tags;
pub mod ttl;

use std::sync::Arc;

pub use backends::Backends;
pub use config::Config;
pub use error::LifecycleError;

use cache::{InMemoryRecordCache, RecordCache};
use services::{ClusterService, Reconciler, ReconcilerSettings};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub clusters: ClusterService,
    pub reconciler: Reconciler,
}

impl AppState {
    pub fn new(backends: &Backends, settings: ReconcilerSettings) -> Self {
        let cache: Arc<dyn RecordCache> = Arc::new(InMemoryRecordCache::new());
        Self::with_cache(backends, settings, cache)
    }

    /// Handlers and the reconciler share one display cache; the store
    /// stays authoritative for every read.
    pub fn with_cache(
        backends: &Backends,
        settings: ReconcilerSettings,
        cache: Arc<dyn RecordCache>,
    ) -> Self {
        Self {
            clusters: ClusterService::new(backends, cache.clone()),
            reconciler: Reconciler::new(backends, cache, settings),
        }
    }
}
