//! Stack tag keys used to associate infrastructure with a cluster
//!
//! Clusters are provisioned with eksctl, which tags every stack it creates.
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `eksctl.cluster.k8s.io/v1alpha1/cluster-name` | Cluster name (older eksctl releases) |
//! | `alpha.eksctl.io/cluster-name` | Cluster name (current eksctl releases) |
//! | `alpha.eksctl.io/nodegroup-name` | Node group name, only on data-plane stacks |

use std::collections::HashMap;

/// Tag key carrying the cluster name, legacy form
pub const TAG_CLUSTER_NAME_LEGACY: &str = "eksctl.cluster.k8s.io/v1alpha1/cluster-name";

/// Tag key carrying the cluster name
pub const TAG_CLUSTER_NAME: &str = "alpha.eksctl.io/cluster-name";

/// Tag key present only on node-group stacks
pub const TAG_NODEGROUP_NAME: &str = "alpha.eksctl.io/nodegroup-name";

/// All keys that may carry the cluster name, in lookup order
pub const CLUSTER_NAME_TAGS: &[&str] = &[TAG_CLUSTER_NAME_LEGACY, TAG_CLUSTER_NAME];

/// Cluster name a stack belongs to, if it is tagged with one.
pub fn cluster_name_of(tags: &HashMap<String, String>) -> Option<&str> {
    CLUSTER_NAME_TAGS
        .iter()
        .filter_map(|key| tags.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// Whether a stack hosts worker capacity.
pub fn is_nodegroup(tags: &HashMap<String, String>) -> bool {
    tags.get(TAG_NODEGROUP_NAME).is_some_and(|v| !v.is_empty())
}

/// Conventional eksctl name of a cluster's control-plane stack.
pub fn control_plane_stack_name(cluster_name: &str) -> String {
    format!("eksctl-{}-cluster", cluster_name)
}
