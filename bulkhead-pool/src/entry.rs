//! Pool entry metadata

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One pooled tenant connection plus its usage metadata
///
/// The entry owns the only pooled handle to the connection; every acquirer
/// of the same tenant receives a clone of the same `Arc`.
#[derive(Debug)]
pub struct PoolEntry<C> {
    tenant_id: String,
    connection: Arc<C>,
    use_count: u64,
    created_at: Instant,
    last_accessed_at: Instant,
}

impl<C> PoolEntry<C> {
    /// Create an entry for a freshly constructed connection
    ///
    /// Creation counts as the first use.
    pub fn new(tenant_id: impl Into<String>, connection: C) -> Self {
        let now = Instant::now();
        Self {
            tenant_id: tenant_id.into(),
            connection: Arc::new(connection),
            use_count: 1,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Tenant this entry belongs to
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Shared handle to the connection
    pub fn connection(&self) -> Arc<C> {
        Arc::clone(&self.connection)
    }

    /// Times this entry has been handed out
    pub fn use_count(&self) -> u64 {
        self.use_count
    }

    /// When the entry was last acquired or released
    pub fn last_accessed_at(&self) -> Instant {
        self.last_accessed_at
    }

    /// Record another acquisition
    pub fn record_use(&mut self) {
        self.use_count += 1;
        self.last_accessed_at = Instant::now();
    }

    /// Refresh the access timestamp without counting a use
    pub fn touch(&mut self) {
        self.last_accessed_at = Instant::now();
    }

    /// How long the entry has gone untouched
    pub fn idle_for(&self) -> Duration {
        self.last_accessed_at.elapsed()
    }

    /// How long the entry has existed
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Read-only view for monitoring
    pub fn snapshot(&self) -> PoolEntrySnapshot {
        PoolEntrySnapshot {
            tenant_id: self.tenant_id.clone(),
            use_count: self.use_count,
            idle_secs: self.idle_for().as_secs(),
            age_secs: self.age().as_secs(),
        }
    }
}

/// Serializable view of one pool entry for the admin/reporting layer
#[derive(Debug, Clone, Serialize)]
pub struct PoolEntrySnapshot {
    /// Tenant the entry belongs to
    pub tenant_id: String,
    /// Times the entry has been handed out
    pub use_count: u64,
    /// Seconds since the entry was last touched
    pub idle_secs: u64,
    /// Seconds since the entry was created
    pub age_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_counts_as_first_use() {
        let entry = PoolEntry::new("t-1", "conn");
        assert_eq!(entry.use_count(), 1);
        assert_eq!(entry.tenant_id(), "t-1");
    }

    #[test]
    fn test_record_use_is_monotonic() {
        let mut entry = PoolEntry::new("t-1", "conn");
        let before = entry.last_accessed_at();

        entry.record_use();
        entry.record_use();

        assert_eq!(entry.use_count(), 3);
        assert!(entry.last_accessed_at() >= before);
    }

    #[test]
    fn test_touch_does_not_count_a_use() {
        let mut entry = PoolEntry::new("t-1", "conn");
        entry.touch();
        assert_eq!(entry.use_count(), 1);
    }

    #[test]
    fn test_shared_connection_identity() {
        let entry = PoolEntry::new("t-1", "conn");
        let a = entry.connection();
        let b = entry.connection();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_snapshot() {
        let mut entry = PoolEntry::new("t-1", "conn");
        entry.record_use();

        let snap = entry.snapshot();
        assert_eq!(snap.tenant_id, "t-1");
        assert_eq!(snap.use_count, 2);
    }
}
