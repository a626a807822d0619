//! The periodic lifecycle sweep
//!
//! Each pass classifies every record by age and performs at most one
//! irreversible step per record:
//!
//! 1. expired with a data-plane stack: delete the data-plane stack
//! 2. expired with only a control-plane stack: delete the control-plane stack
//! 3. expired with no stacks left: delete the record
//! 4. within the warning window: notify the owner once
//!
//! Every step is idempotent, so overlapping or interrupted sweeps converge.
//! Records are processed independently; one failing or stalled record never
//! holds back the others.

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backends::{Backends, Notifier, ProvisioningBackend, RecordStore};
use crate::cache::RecordCache;
use crate::error::{LifecycleError, Result};
use crate::models::{RecordFailure, RecordOutcome, SweepAction, SweepReport};
use crate::services::notices;
use crate::services::stack_resolver::StackResolver;
use crate::ttl::{self, Phase};

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Heads-up window before expiry, in minutes.
    pub warning_window: i64,
    /// Records processed concurrently within one sweep.
    pub concurrency: usize,
    /// Deadline for one record's processing; `None` waits indefinitely.
    pub record_timeout: Option<Duration>,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            warning_window: ttl::DEFAULT_WARNING_WINDOW,
            concurrency: 8,
            record_timeout: Some(Duration::from_secs(120)),
        }
    }
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    resolver: StackResolver,
    provisioner: Arc<dyn ProvisioningBackend>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<dyn RecordCache>,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(backends: &Backends, cache: Arc<dyn RecordCache>, settings: ReconcilerSettings) -> Self {
        Self {
            store: backends.store.clone(),
            resolver: StackResolver::new(backends.directory.clone()),
            provisioner: backends.provisioner.clone(),
            notifier: backends.notifier.clone(),
            cache,
            settings,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// One pass over every record, classified against a single `now`.
    /// Fails only when the records cannot be listed; per-record errors are
    /// collected in the report.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let ids = self
            .store
            .list()
            .await
            .context("Failed to list cluster records")?;
        debug!(count = ids.len(), "Starting reconcile sweep");

        let results: Vec<_> = stream::iter(ids)
            .map(|id| async move {
                let result = self.reconcile_with_deadline(&id, now).await;
                (id, result)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = SweepReport::new(now);
        for (id, result) in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    warn!(cluster_id = %id, error = %e, "Failed to reconcile cluster");
                    report.failures.push(RecordFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.outcomes.sort_by(|a, b| a.id.cmp(&b.id));
        report.failures.sort_by(|a, b| a.id.cmp(&b.id));

        info!(
            processed = report.outcomes.len() + report.failures.len(),
            steps = report.destructive_steps(),
            failed = report.failures.len(),
            "Reconcile sweep finished"
        );
        Ok(report)
    }

    async fn reconcile_with_deadline(&self, id: &str, now: DateTime<Utc>) -> Result<RecordOutcome> {
        match self.settings.record_timeout {
            Some(limit) => tokio::time::timeout(limit, self.reconcile(id, now))
                .await
                .map_err(|_| LifecycleError::Timeout {
                    id: id.to_string(),
                    limit,
                })?,
            None => self.reconcile(id, now).await,
        }
    }

    /// Advance one record by a single step.
    pub async fn reconcile(&self, id: &str, now: DateTime<Utc>) -> Result<RecordOutcome> {
        let record = self
            .store
            .get(id)
            .await
            .with_context(|| format!("Failed to read cluster record '{}'", id))?;
        let Some(mut record) = record else {
            debug!(cluster_id = %id, "Record vanished before it could be reconciled");
            return Ok(RecordOutcome {
                id: id.to_string(),
                phase: None,
                ttl: None,
                action: SweepAction::Vanished,
            });
        };

        let age = ttl::age_minutes(record.created_at, now);
        let phase = ttl::classify(age, record.timeout, self.settings.warning_window);
        record.ttl = ttl::remaining_minutes(record.timeout, age);

        let action = match phase {
            Phase::Expired => {
                let stacks = self
                    .resolver
                    .resolve(&record)
                    .await
                    .with_context(|| format!("Failed to resolve stacks of cluster '{}'", record.name))?;

                if let Some(stack) = stacks.data_plane {
                    info!(cluster_id = %id, stack = %stack, "Tearing down data plane");
                    self.delete_stack(&stack).await?;
                    SweepAction::DeletedDataPlane { stack }
                } else if let Some(stack) = stacks.control_plane {
                    info!(cluster_id = %id, stack = %stack, "Tearing down control plane");
                    self.delete_stack(&stack).await?;
                    SweepAction::DeletedControlPlane { stack }
                } else {
                    self.store
                        .delete(id)
                        .await
                        .with_context(|| format!("Failed to delete cluster record '{}'", id))?;
                    self.cache.invalidate(id);
                    info!(cluster_id = %id, cluster = %record.name, "Cluster record removed");
                    return Ok(RecordOutcome {
                        id: id.to_string(),
                        phase: Some(phase),
                        ttl: Some(record.ttl),
                        action: SweepAction::DeletedRecord,
                    });
                }
            }
            Phase::Warning if record.has_owner() && !record.notified => {
                let notice = notices::cluster_expiring(&record, self.settings.warning_window);
                self.notifier
                    .send(&record.owner, &notice.subject, &notice.body)
                    .await
                    .with_context(|| format!("Failed to warn owner of cluster '{}'", id))?;
                record.notified = true;
                info!(cluster_id = %id, owner = %record.owner, "Owner warned about upcoming tear down");
                SweepAction::Warned
            }
            Phase::Warning | Phase::Active => {
                debug!(cluster_id = %id, age, timeout = record.timeout, "Cluster within its lifetime");
                SweepAction::None
            }
        };

        self.store
            .put(&record)
            .await
            .with_context(|| format!("Failed to update cluster record '{}'", id))?;
        let ttl = record.ttl;
        self.cache.put(record);

        Ok(RecordOutcome {
            id: id.to_string(),
            phase: Some(phase),
            ttl: Some(ttl),
            action,
        })
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        self.provisioner
            .delete_stack(name)
            .await
            .with_context(|| format!("Failed to delete stack '{}'", name))?;
        Ok(())
    }

    /// Sweep on a fixed interval until `shutdown` fires. A failed sweep is
    /// logged and retried on the next tick.
    pub async fn run(self, interval: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs(), "Reconciler started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.sweep().await {
                        Ok(report) if !report.is_success() => {
                            warn!(failed = ?report.failed_ids(), "Reconcile sweep had failures");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Reconcile sweep aborted"),
                    }
                }
            }
        }

        info!("Reconciler stopped");
    }
}
