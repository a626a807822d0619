use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ttl::Phase;

/// The single step a sweep took for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SweepAction {
    /// Only the ttl was refreshed.
    None,
    /// Heads-up sent to the owner.
    Warned,
    DeletedDataPlane { stack: String },
    DeletedControlPlane { stack: String },
    /// Both stacks were gone, the record has been removed.
    DeletedRecord,
    /// The record disappeared between listing and reading it.
    Vanished,
}

impl SweepAction {
    /// Whether this step changed infrastructure or removed the record.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            SweepAction::DeletedDataPlane { .. }
                | SweepAction::DeletedControlPlane { .. }
                | SweepAction::DeletedRecord
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(flatten)]
    pub action: SweepAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
    pub id: String,
    pub error: String,
}

/// Result of one reconcile sweep over every tracked record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<RecordOutcome>,
    pub failures: Vec<RecordFailure>,
}

impl SweepReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn outcome(&self, id: &str) -> Option<&RecordOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// Number of stack or record deletions issued by this sweep.
    pub fn destructive_steps(&self) -> usize {
        self.outcomes.iter().filter(|o| o.action.is_destructive()).count()
    }
}
