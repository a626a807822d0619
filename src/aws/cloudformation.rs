//! CloudFormation stack discovery and teardown
//!
//! Clusters are provisioned out of band (eksctl), so `create_cluster` does
//! not start anything. It reports the control-plane stack name eksctl uses
//! for the cluster; the data-plane stack is found later by tag scan.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudformation::types::StackStatus;
use aws_sdk_cloudformation::Client;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::backends::{
    ProvisionHandle, ProvisioningBackend, StackDescription, StackDirectory, StackSummary,
};
use crate::models::{ClusterRecord, StackRefs};
use crate::tags;

/// Stack states worth considering for teardown: settled, not yet gone.
const ACTIVE_STATUSES: &[StackStatus] = &[
    StackStatus::CreateComplete,
    StackStatus::UpdateComplete,
    StackStatus::UpdateRollbackComplete,
    StackStatus::RollbackComplete,
    StackStatus::DeleteInProgress,
    StackStatus::DeleteFailed,
];

pub struct CloudFormationStacks {
    client: Client,
}

impl CloudFormationStacks {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudformation_client(),
        }
    }
}

#[async_trait]
impl StackDirectory for CloudFormationStacks {
    async fn list_active_stacks(&self) -> Result<Vec<StackSummary>> {
        let mut stacks = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_stacks()
                .set_stack_status_filter(Some(ACTIVE_STATUSES.to_vec()))
                .set_next_token(next_token.take())
                .send()
                .await
                .context("Failed to list CloudFormation stacks")?;

            for summary in response.stack_summaries() {
                let Some(name) = summary.stack_name() else {
                    continue;
                };
                stacks.push(StackSummary {
                    name: name.to_string(),
                    status: summary
                        .stack_status()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                });
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = stacks.len(), "Listed active stacks");
        Ok(stacks)
    }

    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>> {
        let response = match self.client.describe_stacks().stack_name(name).send().await {
            Ok(response) => response,
            Err(e) if classify_sdk_error(&e).is_not_found() => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to describe stack {}", name)),
        };

        let Some(stack) = response.stacks().first() else {
            return Ok(None);
        };

        let tags: HashMap<String, String> = stack
            .tags()
            .iter()
            .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
            .collect();

        Ok(Some(StackDescription {
            name: stack.stack_name().unwrap_or(name).to_string(),
            status: stack
                .stack_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            tags,
        }))
    }
}

#[async_trait]
impl ProvisioningBackend for CloudFormationStacks {
    async fn create_cluster(&self, record: &ClusterRecord) -> Result<ProvisionHandle> {
        let control_plane = tags::control_plane_stack_name(&record.name);
        debug!(cluster_id = %record.id, stack = %control_plane, "Expecting control plane stack");

        Ok(ProvisionHandle {
            stacks: StackRefs {
                control_plane: Some(control_plane),
                data_plane: None,
            },
        })
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        info!(stack = %name, "Deleting CloudFormation stack");

        match self.client.delete_stack().stack_name(name).send().await {
            Ok(_) => Ok(()),
            Err(e) if classify_sdk_error(&e).is_not_found() => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete stack {}", name)),
        }
    }
}
