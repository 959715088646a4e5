//! Append-only usage log
//!
//! Every quota mutation appends one immutable entry. The store-assigned
//! `sequence` is the ordering authority: two entries can share a
//! `recorded_at` timestamp, application order they cannot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of quota mutation an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    /// Usage was added
    Increment,
    /// Usage was subtracted (clamped at zero)
    Decrement,
    /// Usage was overwritten with an absolute value
    Set,
}

impl UsageAction {
    /// Stable string form used in aggregation maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Set => "set",
        }
    }
}

impl std::fmt::Display for UsageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable usage-log record
///
/// Never mutated or deleted by the core; retention is external policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Unique entry id
    pub id: String,
    /// Store-assigned, monotonically increasing position (0 until appended)
    pub sequence: u64,
    /// Tenant the usage belongs to
    pub tenant_id: String,
    /// Resource the usage applies to
    pub resource_type: String,
    /// What happened
    pub action: UsageAction,
    /// Requested amount (for `Set`, the new absolute value)
    pub amount: u64,
    /// Free-text origin tag (`"api"`, `"backup-job"`, ...)
    pub source: String,
    /// Structured context (previous value, clamping info, caller data)
    pub context: HashMap<String, serde_json::Value>,
    /// When the entry was recorded
    pub recorded_at: DateTime<Utc>,
}

impl UsageLogEntry {
    /// Create an entry awaiting its store-assigned sequence
    pub fn new(
        tenant_id: impl Into<String>,
        resource_type: impl Into<String>,
        action: UsageAction,
        amount: u64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sequence: 0,
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
            action,
            amount,
            source: source.into(),
            context: HashMap::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Add a context value
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Merge a context map
    pub fn with_context_map(mut self, context: HashMap<String, serde_json::Value>) -> Self {
        self.context.extend(context);
        self
    }
}

/// Replay a stream of entries from zero usage
///
/// Applies the same clamping the live ledger applies, so replaying a key's
/// full log reproduces its record's `current_usage` exactly.
pub fn replay(entries: &[UsageLogEntry]) -> u64 {
    entries.iter().fold(0u64, |usage, entry| match entry.action {
        UsageAction::Increment => usage.saturating_add(entry.amount),
        UsageAction::Decrement => usage.saturating_sub(entry.amount),
        UsageAction::Set => entry.amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = UsageLogEntry::new("t-1", "storage_mb", UsageAction::Increment, 25, "api")
            .with_context("request_id", serde_json::json!("req-9"));

        assert_eq!(entry.tenant_id, "t-1");
        assert_eq!(entry.action, UsageAction::Increment);
        assert_eq!(entry.amount, 25);
        assert_eq!(entry.sequence, 0);
        assert_eq!(
            entry.context.get("request_id"),
            Some(&serde_json::json!("req-9"))
        );
    }

    #[test]
    fn test_action_strings() {
        assert_eq!(UsageAction::Increment.as_str(), "increment");
        assert_eq!(UsageAction::Decrement.to_string(), "decrement");
        assert_eq!(UsageAction::Set.as_str(), "set");
    }

    #[test]
    fn test_replay_applies_clamping() {
        let entries = vec![
            UsageLogEntry::new("t-1", "r", UsageAction::Increment, 10, "test"),
            UsageLogEntry::new("t-1", "r", UsageAction::Decrement, 25, "test"),
            UsageLogEntry::new("t-1", "r", UsageAction::Increment, 7, "test"),
        ];

        // 0 + 10, clamped to 0 by the oversized decrement, then + 7.
        assert_eq!(replay(&entries), 7);
    }

    #[test]
    fn test_replay_set_is_absolute() {
        let entries = vec![
            UsageLogEntry::new("t-1", "r", UsageAction::Increment, 100, "test"),
            UsageLogEntry::new("t-1", "r", UsageAction::Set, 40, "admin"),
            UsageLogEntry::new("t-1", "r", UsageAction::Decrement, 15, "test"),
        ];

        assert_eq!(replay(&entries), 25);
    }
}
