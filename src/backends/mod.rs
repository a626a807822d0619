//! Capabilities the lifecycle core depends on
//!
//! Handlers and the reconciler only see these traits. Production wiring
//! uses the AWS implementations in [`crate::aws`]; local runs and tests use
//! the in-memory ones in [`memory`].

pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::aws::{AwsContext, CloudFormationStacks, S3RecordStore, SesNotifier};
use crate::config::{BackendKind, Config};
use crate::models::{ClusterRecord, StackRefs};

/// Durable keyed storage, one record per cluster id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<ClusterRecord>>;

    /// Idempotent upsert keyed by `record.id`.
    async fn put(&self, record: &ClusterRecord) -> Result<()>;

    /// Deleting an absent record succeeds.
    async fn delete(&self, id: &str) -> Result<()>;

    async fn list(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSummary {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    pub name: String,
    pub status: String,
    pub tags: HashMap<String, String>,
}

impl StackDescription {
    /// A stack still exists unless its deletion has completed.
    pub fn is_live(&self) -> bool {
        self.status != STATUS_DELETE_COMPLETE
    }
}

pub const STATUS_CREATE_COMPLETE: &str = "CREATE_COMPLETE";
pub const STATUS_DELETE_COMPLETE: &str = "DELETE_COMPLETE";

/// Read side of the infrastructure provider.
#[async_trait]
pub trait StackDirectory: Send + Sync {
    /// Stacks in a settled, not yet deleted state.
    async fn list_active_stacks(&self) -> Result<Vec<StackSummary>>;

    /// `None` when no such stack exists.
    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>>;
}

/// What provisioning knows about a new cluster's stacks.
#[derive(Debug, Clone, Default)]
pub struct ProvisionHandle {
    pub stacks: StackRefs,
}

/// Write side of the infrastructure provider.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    async fn create_cluster(&self, record: &ClusterRecord) -> Result<ProvisionHandle>;

    /// Deleting an absent stack succeeds.
    async fn delete_stack(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// A no-op when the notifier has no source address configured.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// The collaborator set a running service is built from.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn RecordStore>,
    pub directory: Arc<dyn StackDirectory>,
    pub provisioner: Arc<dyn ProvisioningBackend>,
    pub notifier: Arc<dyn Notifier>,
}

impl Backends {
    /// Fully simulated collaborators sharing one stack table.
    pub fn in_memory(notification_source: Option<String>) -> Self {
        let stacks = Arc::new(memory::InMemoryStacks::new());
        Self {
            store: Arc::new(memory::InMemoryRecordStore::new()),
            directory: stacks.clone(),
            provisioner: stacks,
            notifier: Arc::new(memory::InMemoryNotifier::new(notification_source)),
        }
    }

    /// Build the collaborators selected by `CLUSTER_BACKEND`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::Memory => {
                info!("Using in-memory backends");
                Ok(Self::in_memory(config.notification_address.clone()))
            }
            BackendKind::Aws => {
                let bucket = config
                    .metadata_bucket
                    .clone()
                    .context("CLUSTER_METADATA_BUCKET is required with the aws backend")?;
                let ctx = AwsContext::new(config.aws_region.as_deref()).await;
                info!(region = ?ctx.region(), bucket = %bucket, "Using AWS backends");

                let stacks = Arc::new(CloudFormationStacks::from_context(&ctx));
                Ok(Self {
                    store: Arc::new(S3RecordStore::from_context(&ctx, bucket)),
                    directory: stacks.clone(),
                    provisioner: stacks,
                    notifier: Arc::new(SesNotifier::from_context(
                        &ctx,
                        &config.ses_region,
                        config.notification_address.clone(),
                    )),
                })
            }
        }
    }
}
