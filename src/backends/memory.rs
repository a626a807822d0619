//! In-process collaborators for local runs and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::{
    Notifier, ProvisionHandle, ProvisioningBackend, RecordStore, StackDescription, StackDirectory,
    StackSummary, STATUS_CREATE_COMPLETE,
};
use crate::models::{ClusterRecord, StackRefs};
use crate::tags::{control_plane_stack_name, TAG_CLUSTER_NAME, TAG_NODEGROUP_NAME};

/// Records held as serialized JSON, the same bytes the S3 store writes.
#[derive(Default)]
pub struct InMemoryRecordStore {
    objects: RwLock<BTreeMap<String, String>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn raw(&self, id: &str) -> Option<String> {
        self.objects.read().get(id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, id: &str) -> Result<Option<ClusterRecord>> {
        let Some(json) = self.raw(id) else {
            return Ok(None);
        };
        let record = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse cluster record '{}'", id))?;
        Ok(Some(record))
    }

    async fn put(&self, record: &ClusterRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to serialize cluster record")?;
        self.objects.write().insert(record.id.clone(), json);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.objects.write().remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.objects.read().keys().cloned().collect())
    }
}

/// A simulated stack provider. Stacks are listed in insertion order and
/// every delete call is logged, including deletes of absent stacks.
#[derive(Default)]
pub struct InMemoryStacks {
    stacks: RwLock<Vec<StackDescription>>,
    delete_calls: Mutex<Vec<String>>,
}

impl InMemoryStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack tagged for `cluster_name`; `nodegroup` marks it as data plane.
    pub fn insert_stack(&self, name: &str, cluster_name: &str, nodegroup: Option<&str>) {
        let mut tags = HashMap::new();
        tags.insert(TAG_CLUSTER_NAME.to_string(), cluster_name.to_string());
        if let Some(ng) = nodegroup {
            tags.insert(TAG_NODEGROUP_NAME.to_string(), ng.to_string());
        }
        self.insert(StackDescription {
            name: name.to_string(),
            status: STATUS_CREATE_COMPLETE.to_string(),
            tags,
        });
    }

    pub fn insert(&self, stack: StackDescription) {
        let mut stacks = self.stacks.write();
        stacks.retain(|s| s.name != stack.name);
        stacks.push(stack);
    }

    /// Drop a stack without recording a delete call, as if removed out of band.
    pub fn remove(&self, name: &str) {
        self.stacks.write().retain(|s| s.name != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stacks.read().iter().any(|s| s.name == name)
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().clone()
    }
}

#[async_trait]
impl StackDirectory for InMemoryStacks {
    async fn list_active_stacks(&self) -> Result<Vec<StackSummary>> {
        Ok(self
            .stacks
            .read()
            .iter()
            .filter(|s| s.is_live())
            .map(|s| StackSummary {
                name: s.name.clone(),
                status: s.status.clone(),
            })
            .collect())
    }

    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>> {
        Ok(self.stacks.read().iter().find(|s| s.name == name).cloned())
    }
}

#[async_trait]
impl ProvisioningBackend for InMemoryStacks {
    async fn create_cluster(&self, record: &ClusterRecord) -> Result<ProvisionHandle> {
        let control_plane = control_plane_stack_name(&record.name);
        self.insert_stack(&control_plane, &record.name, None);

        let data_plane = if record.num_workers > 0 {
            let ng = format!("ng-{}", record.id.chars().take(8).collect::<String>());
            let stack = format!("eksctl-{}-nodegroup-{}", record.name, ng);
            self.insert_stack(&stack, &record.name, Some(&ng));
            Some(stack)
        } else {
            None
        };

        info!(cluster = %record.name, "Simulated cluster provisioning");
        Ok(ProvisionHandle {
            stacks: StackRefs {
                control_plane: Some(control_plane),
                data_plane,
            },
        })
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        self.delete_calls.lock().push(name.to_string());
        self.stacks.write().retain(|s| s.name != name);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Collects messages instead of delivering them.
pub struct InMemoryNotifier {
    source: Option<String>,
    outbox: Mutex<Vec<SentMessage>>,
}

impl InMemoryNotifier {
    pub fn new(source: Option<String>) -> Self {
        Self {
            source,
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox.lock().clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if self.source.is_none() {
            debug!(to = %to, "No notification source configured, skipping");
            return Ok(());
        }
        info!(to = %to, subject = %subject, "Notification queued");
        self.outbox.lock().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
