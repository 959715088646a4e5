//! Quota storage seam
//!
//! The ledger talks to storage through [`QuotaStore`]; a persisted
//! implementation maps `quota_records` to a table with a unique
//! (tenant_id, resource_type) key and `usage_log` to an append-only table
//! with a monotonic sequence column. The in-memory implementation backs
//! tests and single-process deployments.

use crate::error::{QuotaError, QuotaResult};
use crate::log::UsageLogEntry;
use crate::record::QuotaRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Natural key of a quota record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotaKey {
    /// Tenant the quota belongs to
    pub tenant_id: String,
    /// Resource being accounted
    pub resource_type: String,
}

impl QuotaKey {
    /// Create a new key
    pub fn new(tenant_id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
        }
    }
}

/// Quota storage trait (implement with your database)
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Get a record by its natural key
    async fn get(&self, tenant_id: &str, resource_type: &str)
    -> QuotaResult<Option<QuotaRecord>>;

    /// Insert or replace a record
    async fn upsert(&self, record: &QuotaRecord) -> QuotaResult<()>;

    /// All records for a tenant, ordered by resource type
    async fn list_for_tenant(&self, tenant_id: &str) -> QuotaResult<Vec<QuotaRecord>>;

    /// Append a log entry, assigning its sequence
    async fn append_log(&self, entry: UsageLogEntry) -> QuotaResult<UsageLogEntry>;

    /// Log entries for a key within an optional time range, in append order
    async fn log_entries(
        &self,
        tenant_id: &str,
        resource_type: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> QuotaResult<Vec<UsageLogEntry>>;
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<UsageLogEntry>,
    next_sequence: u64,
}

/// In-memory quota store
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    records: RwLock<HashMap<QuotaKey, QuotaRecord>>,
    log: RwLock<LogState>,
}

impl InMemoryQuotaStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of log entries across all keys
    pub fn log_len(&self) -> usize {
        self.log.read().entries.len()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn get(
        &self,
        tenant_id: &str,
        resource_type: &str,
    ) -> QuotaResult<Option<QuotaRecord>> {
        let key = QuotaKey::new(tenant_id, resource_type);
        Ok(self.records.read().get(&key).cloned())
    }

    async fn upsert(&self, record: &QuotaRecord) -> QuotaResult<()> {
        let key = QuotaKey::new(&record.tenant_id, &record.resource_type);
        self.records.write().insert(key, record.clone());
        Ok(())
    }

    async fn list_for_tenant(&self, tenant_id: &str) -> QuotaResult<Vec<QuotaRecord>> {
        let mut records: Vec<_> = self
            .records
            .read()
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.resource_type.cmp(&b.resource_type));
        Ok(records)
    }

    async fn append_log(&self, mut entry: UsageLogEntry) -> QuotaResult<UsageLogEntry> {
        let mut log = self.log.write();
        log.next_sequence += 1;
        entry.sequence = log.next_sequence;
        log.entries.push(entry.clone());
        Ok(entry)
    }

    async fn log_entries(
        &self,
        tenant_id: &str,
        resource_type: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> QuotaResult<Vec<UsageLogEntry>> {
        let log = self.log.read();
        Ok(log
            .entries
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.resource_type == resource_type)
            .filter(|e| start.is_none_or(|from| e.recorded_at >= from))
            .filter(|e| end.is_none_or(|until| e.recorded_at <= until))
            .cloned()
            .collect())
    }
}

/// Convenience conversion so store impls can bubble backend errors
impl From<serde_json::Error> for QuotaError {
    fn from(err: serde_json::Error) -> Self {
        QuotaError::storage(err.to_string())
    }
}
