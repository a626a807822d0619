use anyhow::Context;
use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backends::{Backends, Notifier, ProvisioningBackend, RecordStore};
use crate::cache::RecordCache;
use crate::error::{LifecycleError, Result};
use crate::models::{
    ClusterRecord, CreateClusterRequest, StackRefs, DEFAULT_KUBE_VERSION, DEFAULT_NAME,
    DEFAULT_NUM_WORKERS, DEFAULT_TIMEOUT_MINUTES,
};
use crate::services::notices;
use crate::ttl;

/// Wildcard accepted by the status endpoint to list every cluster id.
pub const ALL_CLUSTERS: &str = "*";

/// Create, prolong and status operations on cluster records.
#[derive(Clone)]
pub struct ClusterService {
    store: Arc<dyn RecordStore>,
    provisioner: Arc<dyn ProvisioningBackend>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<dyn RecordCache>,
}

#[derive(Debug, Clone)]
pub struct ProlongOutcome {
    pub record: ClusterRecord,
    pub extension: i64,
    pub age: i64,
}

impl ProlongOutcome {
    pub fn message(&self) -> String {
        format!(
            "Successfully prolonged the lifetime of cluster {} by {} minutes. New timeout is {} min, {} min remaining.",
            self.record.id,
            self.extension,
            self.record.timeout,
            ttl::remaining_minutes(self.record.timeout, self.age)
        )
    }
}

impl ClusterService {
    pub fn new(backends: &Backends, cache: Arc<dyn RecordCache>) -> Self {
        Self {
            store: backends.store.clone(),
            provisioner: backends.provisioner.clone(),
            notifier: backends.notifier.clone(),
            cache,
        }
    }

    pub async fn create(&self, request: CreateClusterRequest) -> Result<String> {
        self.create_at(request, Utc::now()).await
    }

    /// Persist a new record, hand it to provisioning and notify the owner.
    /// The record is written before provisioning so that infrastructure is
    /// never left without a record to expire it.
    pub async fn create_at(&self, request: CreateClusterRequest, now: DateTime<Utc>) -> Result<String> {
        let mut record = new_record(request, now)?;
        info!(
            cluster_id = %record.id,
            cluster = %record.name,
            kube_version = %record.kube_version,
            workers = record.num_workers,
            timeout = record.timeout,
            "Creating cluster record"
        );

        self.store
            .put(&record)
            .await
            .context("Failed to store cluster record")?;

        let handle = self
            .provisioner
            .create_cluster(&record)
            .await
            .context("Failed to provision cluster")?;
        if !handle.stacks.is_empty() {
            record.stacks = handle.stacks;
            self.store
                .put(&record)
                .await
                .context("Failed to store stack references")?;
        }
        self.cache.put(record.clone());

        if record.has_owner() {
            let notice = notices::cluster_created(&record);
            self.notifier
                .send(&record.owner, &notice.subject, &notice.body)
                .await
                .context("Failed to notify cluster owner")?;
            info!(cluster_id = %record.id, owner = %record.owner, "Owner informed about new cluster");
        }

        Ok(record.id)
    }

    pub async fn prolong(&self, id: &str, minutes: &str) -> Result<ProlongOutcome> {
        self.prolong_at(id, minutes, Utc::now()).await
    }

    /// Extend the remaining budget of a cluster by `minutes`, measured from
    /// its age at the moment of the call.
    pub async fn prolong_at(&self, id: &str, minutes: &str, now: DateTime<Utc>) -> Result<ProlongOutcome> {
        let extension = parse_extension(minutes)?;
        let mut record = self.load(id).await?;

        let age = ttl::age_minutes(record.created_at, now);
        let timeout = ttl::prolonged_timeout(record.timeout, age, extension)
            .filter(|timeout| *timeout <= ttl::MAX_TIMEOUT_MINUTES)
            .ok_or_else(|| {
                LifecycleError::validation(format!(
                    "Cluster {} cannot be prolonged by {} min, the timeout would exceed the maximum of {} min",
                    id,
                    extension,
                    ttl::MAX_TIMEOUT_MINUTES
                ))
            })?;
        if timeout <= 0 {
            return Err(LifecycleError::validation(format!(
                "Cluster {} is {} min old with a timeout of {} min; prolonging by {} min is not enough",
                id, age, record.timeout, extension
            )));
        }

        debug!(cluster_id = %id, age, old_timeout = record.timeout, new_timeout = timeout, "Prolonging cluster");
        record.timeout = timeout;
        record.ttl = ttl::remaining_minutes(timeout, age);
        record.notified = false;

        self.store
            .put(&record)
            .await
            .context("Failed to store prolonged cluster record")?;
        self.cache.invalidate(id);

        info!(cluster_id = %id, extension, timeout, "Cluster prolonged");
        Ok(ProlongOutcome {
            record,
            extension,
            age,
        })
    }

    /// Read one record from the store. The cache is refreshed for display
    /// consumers but never answers a status request.
    pub async fn status(&self, id: &str) -> Result<ClusterRecord> {
        let record = self.load(id).await.map_err(|err| {
            if err.is_not_found() {
                self.cache.invalidate(id);
            }
            err
        })?;
        debug!(cluster_id = %id, timeout = record.timeout, "Read cluster status");
        self.cache.put(record.clone());
        Ok(record)
    }

    pub async fn list_ids(&self) -> Result<Vec<String>> {
        let ids = self
            .store
            .list()
            .await
            .context("Failed to list cluster records")?;
        Ok(ids)
    }

    async fn load(&self, id: &str) -> Result<ClusterRecord> {
        self.store
            .get(id)
            .await
            .with_context(|| format!("Failed to read cluster record '{}'", id))?
            .ok_or_else(|| LifecycleError::not_found(id))
    }
}

fn new_record(request: CreateClusterRequest, now: DateTime<Utc>) -> Result<ClusterRecord> {
    let timeout = request.timeout.unwrap_or(DEFAULT_TIMEOUT_MINUTES);
    if timeout <= 0 {
        return Err(LifecycleError::validation(format!(
            "Invalid timeout {}, it must be a positive number of minutes",
            timeout
        )));
    }
    if timeout > ttl::MAX_TIMEOUT_MINUTES {
        return Err(LifecycleError::validation(format!(
            "Invalid timeout {}, it exceeds the maximum of {} minutes",
            timeout,
            ttl::MAX_TIMEOUT_MINUTES
        )));
    }

    Ok(ClusterRecord {
        id: Uuid::new_v4().to_string(),
        name: non_blank(request.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        num_workers: request.num_workers.unwrap_or(DEFAULT_NUM_WORKERS),
        kube_version: non_blank(request.kube_version)
            .unwrap_or_else(|| DEFAULT_KUBE_VERSION.to_string()),
        timeout,
        ttl: timeout,
        owner: non_blank(request.owner).unwrap_or_default(),
        // Stored at second precision
        created_at: now.with_nanosecond(0).unwrap_or(now),
        notified: false,
        stacks: StackRefs::default(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the prolong amount, a positive whole number of minutes.
pub fn parse_extension(minutes: &str) -> Result<i64> {
    let minutes = minutes.trim();
    let value: i64 = minutes.parse().map_err(|_| {
        LifecycleError::validation(format!(
            "Invalid prolong request, '{}' is not a plain integer number of minutes",
            minutes
        ))
    })?;
    if value < 1 {
        return Err(LifecycleError::validation(format!(
            "Invalid prolong request, {} minutes is not a positive duration",
            value
        )));
    }
    if value > i64::from(u32::MAX) {
        return Err(LifecycleError::validation(format!(
            "Invalid prolong request, {} minutes exceeds the maximum of {} minutes",
            value,
            u32::MAX
        )));
    }
    Ok(value)
}
