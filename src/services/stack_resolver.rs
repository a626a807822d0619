use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backends::StackDirectory;
use crate::models::ClusterRecord;
use crate::tags;

/// The stacks currently backing a cluster. `None` means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedStacks {
    pub control_plane: Option<String>,
    pub data_plane: Option<String>,
}

impl ResolvedStacks {
    pub fn is_empty(&self) -> bool {
        self.control_plane.is_none() && self.data_plane.is_none()
    }
}

/// Maps a cluster to its control-plane and data-plane stacks.
#[derive(Clone)]
pub struct StackResolver {
    directory: Arc<dyn StackDirectory>,
}

impl StackResolver {
    pub fn new(directory: Arc<dyn StackDirectory>) -> Self {
        Self { directory }
    }

    /// Stored stack refs win while their stacks exist. Roles without a live
    /// stored ref are filled from a tag scan on the cluster name.
    pub async fn resolve(&self, record: &ClusterRecord) -> Result<ResolvedStacks> {
        let mut resolved = ResolvedStacks {
            control_plane: self.live(record.stacks.control_plane.as_deref()).await?,
            data_plane: self.live(record.stacks.data_plane.as_deref()).await?,
        };

        if resolved.control_plane.is_none() || resolved.data_plane.is_none() {
            let scanned = self.scan(&record.name).await?;
            resolved.control_plane = resolved.control_plane.or(scanned.control_plane);
            resolved.data_plane = resolved.data_plane.or(scanned.data_plane);
        }

        debug!(
            cluster = %record.name,
            control_plane = ?resolved.control_plane,
            data_plane = ?resolved.data_plane,
            "Resolved stacks"
        );
        Ok(resolved)
    }

    /// Tag scan over every active stack.
    pub async fn scan(&self, cluster_name: &str) -> Result<ResolvedStacks> {
        let mut found = ResolvedStacks::default();

        for summary in self.directory.list_active_stacks().await? {
            let Some(stack) = self.directory.describe_stack(&summary.name).await? else {
                // Deleted between list and describe.
                continue;
            };
            if tags::cluster_name_of(&stack.tags) != Some(cluster_name) {
                continue;
            }

            let slot = if tags::is_nodegroup(&stack.tags) {
                &mut found.data_plane
            } else {
                &mut found.control_plane
            };
            if let Some(existing) = slot.as_deref() {
                warn!(
                    cluster = %cluster_name,
                    kept = %existing,
                    ignored = %stack.name,
                    "Several stacks match the same role, keeping the first"
                );
            } else {
                *slot = Some(stack.name);
            }
        }

        Ok(found)
    }

    async fn live(&self, stored: Option<&str>) -> Result<Option<String>> {
        let Some(name) = stored else {
            return Ok(None);
        };
        let stack = self.directory.describe_stack(name).await?;
        Ok(stack.filter(|s| s.is_live()).map(|s| s.name))
    }
}
