#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use kubettl_backend::backends::memory::{InMemoryNotifier, InMemoryRecordStore, InMemoryStacks};
use kubettl_backend::backends::{Backends, ProvisionHandle, ProvisioningBackend, RecordStore};
use kubettl_backend::cache::InMemoryRecordCache;
use kubettl_backend::models::{ClusterRecord, StackRefs};
use kubettl_backend::services::{ClusterService, Reconciler, ReconcilerSettings};
use kubettl_backend::AppState;

pub const OWNER: &str = "dev@example.com";
pub const SOURCE: &str = "eks-ttl@example.com";

/// Fixed creation instant all scenarios measure age from.
pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

pub fn settings() -> ReconcilerSettings {
    ReconcilerSettings {
        warning_window: 5,
        concurrency: 4,
        record_timeout: Some(StdDuration::from_secs(5)),
    }
}

pub fn record(id: &str, name: &str, timeout: i64) -> ClusterRecord {
    ClusterRecord {
        id: id.to_string(),
        name: name.to_string(),
        num_workers: 1,
        kube_version: "1.12".to_string(),
        timeout,
        ttl: timeout,
        owner: OWNER.to_string(),
        created_at: t0(),
        notified: false,
        stacks: StackRefs::default(),
    }
}

/// In-memory collaborators with typed handles for assertions.
pub struct Harness {
    pub store: Arc<InMemoryRecordStore>,
    pub stacks: Arc<InMemoryStacks>,
    pub notifier: Arc<InMemoryNotifier>,
    pub cache: Arc<InMemoryRecordCache>,
    pub backends: Backends,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        let stacks = Arc::new(InMemoryStacks::new());
        let notifier = Arc::new(InMemoryNotifier::new(Some(SOURCE.to_string())));
        let backends = Backends {
            store: store.clone(),
            directory: stacks.clone(),
            provisioner: stacks.clone(),
            notifier: notifier.clone(),
        };
        Self {
            store,
            stacks,
            notifier,
            cache: Arc::new(InMemoryRecordCache::new()),
            backends,
        }
    }

    pub fn clusters(&self) -> ClusterService {
        ClusterService::new(&self.backends, self.cache.clone())
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(&self.backends, self.cache.clone(), settings())
    }

    pub fn state(&self) -> AppState {
        AppState::with_cache(&self.backends, settings(), self.cache.clone())
    }

    /// Store a record together with tagged control-plane and data-plane stacks.
    pub async fn seed_cluster(&self, id: &str, name: &str, timeout: i64) -> ClusterRecord {
        let record = record(id, name, timeout);
        self.store.put(&record).await.unwrap();
        self.stacks
            .insert_stack(&format!("eksctl-{}-cluster", name), name, None);
        self.stacks.insert_stack(
            &format!("eksctl-{}-nodegroup-ng-1", name),
            name,
            Some("ng-1"),
        );
        record
    }

    pub async fn stored(&self, id: &str) -> Option<ClusterRecord> {
        self.store.get(id).await.unwrap()
    }

    /// Warnings sent so far, creation notices excluded.
    pub fn warnings(&self) -> Vec<String> {
        self.notifier
            .sent()
            .into_iter()
            .filter(|m| m.subject.contains("shutting down"))
            .map(|m| m.subject)
            .collect()
    }
}

/// A store whose reads fail for selected ids and whose listing can include
/// ids that were never stored.
pub struct FlakyStore {
    pub inner: Arc<InMemoryRecordStore>,
    pub failing: HashSet<String>,
    pub phantom: Vec<String>,
    pub fail_list: bool,
}

impl FlakyStore {
    pub fn new(inner: Arc<InMemoryRecordStore>) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
            phantom: Vec::new(),
            fail_list: false,
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get(&self, id: &str) -> Result<Option<ClusterRecord>> {
        if self.failing.contains(id) {
            return Err(anyhow!("connection reset while reading {}", id));
        }
        self.inner.get(id).await
    }

    async fn put(&self, record: &ClusterRecord) -> Result<()> {
        self.inner.put(record).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<String>> {
        if self.fail_list {
            return Err(anyhow!("bucket unavailable"));
        }
        let mut ids = self.inner.list().await?;
        ids.extend(self.phantom.iter().cloned());
        Ok(ids)
    }
}

/// Provisioner whose deletes of one stack never finish.
pub struct StallingProvisioner {
    pub inner: Arc<InMemoryStacks>,
    pub stalled_stack: String,
}

#[async_trait]
impl ProvisioningBackend for StallingProvisioner {
    async fn create_cluster(&self, record: &ClusterRecord) -> Result<ProvisionHandle> {
        self.inner.create_cluster(record).await
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        if name == self.stalled_stack {
            tokio::time::sleep(StdDuration::from_secs(3600)).await;
        }
        self.inner.delete_stack(name).await
    }
}
