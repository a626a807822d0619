//! Age and remaining-time arithmetic shared by every handler.
//!
//! All values are whole minutes. Age is truncated, so a cluster that is
//! 10m59s old has an age of 10.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default heads-up window before expiry, in minutes.
pub const DEFAULT_WARNING_WINDOW: i64 = 5;

/// Largest lifetime budget a record may carry, in minutes.
pub const MAX_TIMEOUT_MINUTES: i64 = u32::MAX as i64;

/// Lifecycle phase of a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Active,
    Warning,
    Expired,
}

/// Minutes elapsed since `created_at`. Never negative, even under clock skew.
pub fn age_minutes(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_minutes().max(0)
}

/// Minutes left of the lifetime budget; negative once expired.
pub fn remaining_minutes(timeout: i64, age: i64) -> i64 {
    timeout.saturating_sub(age)
}

/// New lifetime budget after extending by `extension` minutes at `age`.
/// `None` when the result does not fit in an `i64`.
pub fn prolonged_timeout(timeout: i64, age: i64, extension: i64) -> Option<i64> {
    timeout.checked_sub(age)?.checked_add(extension)
}

/// Classify a record. Both bounds are strict: `age == timeout` is still a
/// warning, `age == timeout - window` is still active.
pub fn classify(age: i64, timeout: i64, window: i64) -> Phase {
    if age > timeout {
        Phase::Expired
    } else if age > timeout.saturating_sub(window) {
        Phase::Warning
    } else {
        Phase::Active
    }
}
