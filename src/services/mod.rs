pub mod cluster_service;
pub mod notices;
pub mod reconciler;
pub mod stack_resolver;

pub use cluster_service::{ClusterService, ProlongOutcome, ALL_CLUSTERS};
pub use reconciler::{Reconciler, ReconcilerSettings};
pub use stack_resolver::{ResolvedStacks, StackResolver};
