//! Quota ledger
//!
//! Authoritative current-usage tracking per (tenant, resource) with an
//! append-only history. Mutations for one key are serialized: the
//! read-modify-write on the record and the log append happen inside the
//! same per-key critical section, so concurrent increments are both
//! reflected and the log order matches the order usage was applied.
//!
//! The ledger never throws for "over quota". It applies the mutation,
//! records it, and returns the record whose status the caller inspects —
//! dropping real usage data would corrupt the audit trail.

use crate::error::{QuotaError, QuotaResult};
use crate::log::{UsageAction, UsageLogEntry};
use crate::record::{QuotaRecord, QuotaStatus};
use crate::store::{QuotaKey, QuotaStore};
use dashmap::DashMap;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Defaults applied when a mutation targets a key with no record yet
#[derive(Debug, Clone)]
pub struct QuotaDefaults {
    /// Per-resource default limits; resources not listed get `fallback_limit`
    pub limits: HashMap<String, u64>,
    /// Limit for resources without a configured default (0 = unlimited)
    pub fallback_limit: u64,
    /// Warning threshold for auto-created records
    pub warning_threshold_pct: f64,
}

impl Default for QuotaDefaults {
    fn default() -> Self {
        Self {
            limits: HashMap::new(),
            fallback_limit: 0,
            warning_threshold_pct: QuotaRecord::DEFAULT_WARNING_THRESHOLD_PCT,
        }
    }
}

impl QuotaDefaults {
    /// Create defaults with no per-resource limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default limit for one resource type
    pub fn with_limit(mut self, resource_type: impl Into<String>, limit: u64) -> Self {
        self.limits.insert(resource_type.into(), limit);
        self
    }

    /// Set the fallback limit
    pub fn with_fallback_limit(mut self, limit: u64) -> Self {
        self.fallback_limit = limit;
        self
    }

    /// Set the default warning threshold
    pub fn with_warning_threshold(mut self, pct: f64) -> Self {
        self.warning_threshold_pct = pct;
        self
    }

    /// Default limit for a resource type
    pub fn limit_for(&self, resource_type: &str) -> u64 {
        self.limits
            .get(resource_type)
            .copied()
            .unwrap_or(self.fallback_limit)
    }
}

/// Optional fields for [`QuotaLedger::get_or_create`]
#[derive(Debug, Clone, Default)]
pub struct QuotaOptions {
    /// New warning threshold
    pub warning_threshold_pct: Option<f64>,
    /// New enforcement flag
    pub enforcement_enabled: Option<bool>,
    /// Metadata to merge into the record
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl QuotaOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the warning threshold
    pub fn with_warning_threshold(mut self, pct: f64) -> Self {
        self.warning_threshold_pct = Some(pct);
        self
    }

    /// Set the enforcement flag
    pub fn with_enforcement(mut self, enabled: bool) -> Self {
        self.enforcement_enabled = Some(enabled);
        self
    }

    /// Merge metadata into the record
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Quota ledger
///
/// Explicitly constructed with an injected store; no process-wide
/// singletons. One instance serves every tenant.
pub struct QuotaLedger {
    store: Arc<dyn QuotaStore>,
    defaults: QuotaDefaults,
    key_locks: DashMap<QuotaKey, Arc<Mutex<()>>>,
}

impl QuotaLedger {
    /// Create a ledger with default settings
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self::with_defaults(store, QuotaDefaults::default())
    }

    /// Create a ledger with explicit defaults
    pub fn with_defaults(store: Arc<dyn QuotaStore>, defaults: QuotaDefaults) -> Self {
        Self {
            store,
            defaults,
            key_locks: DashMap::new(),
        }
    }

    /// The store backing this ledger
    pub fn store(&self) -> &Arc<dyn QuotaStore> {
        &self.store
    }

    /// Defaults applied to auto-created records
    pub fn defaults(&self) -> &QuotaDefaults {
        &self.defaults
    }

    /// Insert or update the record for a key
    ///
    /// Never resets `current_usage` on an existing record; only the
    /// limit, threshold, enforcement flag, and metadata are touched.
    pub async fn get_or_create(
        &self,
        tenant_id: &str,
        resource_type: &str,
        limit: u64,
        opts: QuotaOptions,
    ) -> QuotaResult<QuotaRecord> {
        validate_key(tenant_id, resource_type)?;
        if let Some(pct) = opts.warning_threshold_pct {
            validate_threshold(pct)?;
        }

        let lock = self.key_lock(tenant_id, resource_type);
        let _guard = lock.lock().await;

        let mut record = match self.store.get(tenant_id, resource_type).await? {
            Some(existing) => existing,
            None => {
                debug!(
                    tenant_id = %tenant_id,
                    resource_type = %resource_type,
                    limit = limit,
                    "creating quota record"
                );
                QuotaRecord::new(tenant_id, resource_type, limit)
                    .with_warning_threshold(self.defaults.warning_threshold_pct)
            }
        };

        record.limit = limit;
        if let Some(pct) = opts.warning_threshold_pct {
            record.warning_threshold_pct = pct;
        }
        if let Some(enabled) = opts.enforcement_enabled {
            record.enforcement_enabled = enabled;
        }
        if let Some(metadata) = opts.metadata {
            record.metadata.extend(metadata);
        }
        record.updated_at = chrono::Utc::now();

        self.store.upsert(&record).await?;
        Ok(record)
    }

    /// Add usage for a key
    ///
    /// Always applied, even past the limit: over-limit is surfaced as
    /// [`QuotaStatus::Exceeded`] on the returned record, never an error.
    /// Callers that must hard-block call [`QuotaLedger::check`] first.
    pub async fn increment(
        &self,
        tenant_id: &str,
        resource_type: &str,
        amount: u64,
        source: &str,
        context: HashMap<String, serde_json::Value>,
    ) -> QuotaResult<QuotaRecord> {
        self.apply(tenant_id, resource_type, UsageAction::Increment, amount, source, context)
            .await
    }

    /// Subtract usage for a key, clamping at zero
    pub async fn decrement(
        &self,
        tenant_id: &str,
        resource_type: &str,
        amount: u64,
        source: &str,
        context: HashMap<String, serde_json::Value>,
    ) -> QuotaResult<QuotaRecord> {
        self.apply(tenant_id, resource_type, UsageAction::Decrement, amount, source, context)
            .await
    }

    /// Overwrite usage for a key with an absolute value
    ///
    /// The previous value lands in the log entry's context for traceability.
    pub async fn set_usage(
        &self,
        tenant_id: &str,
        resource_type: &str,
        amount: u64,
        source: &str,
        context: HashMap<String, serde_json::Value>,
    ) -> QuotaResult<QuotaRecord> {
        self.apply(tenant_id, resource_type, UsageAction::Set, amount, source, context)
            .await
    }

    /// Read-only fetch of a record and its derived status
    pub async fn check(
        &self,
        tenant_id: &str,
        resource_type: &str,
    ) -> QuotaResult<Option<QuotaRecord>> {
        validate_key(tenant_id, resource_type)?;
        self.store.get(tenant_id, resource_type).await
    }

    async fn apply(
        &self,
        tenant_id: &str,
        resource_type: &str,
        action: UsageAction,
        amount: u64,
        source: &str,
        context: HashMap<String, serde_json::Value>,
    ) -> QuotaResult<QuotaRecord> {
        validate_key(tenant_id, resource_type)?;

        let lock = self.key_lock(tenant_id, resource_type);
        let _guard = lock.lock().await;

        let mut record = match self.store.get(tenant_id, resource_type).await? {
            Some(existing) => existing,
            None => QuotaRecord::new(
                tenant_id,
                resource_type,
                self.defaults.limit_for(resource_type),
            )
            .with_warning_threshold(self.defaults.warning_threshold_pct),
        };

        let previous = record.current_usage;
        let mut entry = UsageLogEntry::new(tenant_id, resource_type, action, amount, source)
            .with_context_map(context);

        record.current_usage = match action {
            UsageAction::Increment => previous.saturating_add(amount),
            UsageAction::Decrement => {
                let next = previous.saturating_sub(amount);
                if amount > previous {
                    entry = entry
                        .with_context("clamped", json!(true))
                        .with_context("applied", json!(previous - next));
                }
                next
            }
            UsageAction::Set => {
                entry = entry.with_context("previous_usage", json!(previous));
                amount
            }
        };

        let now = chrono::Utc::now();
        record.last_checked_at = Some(now);
        record.updated_at = now;

        let status = record.status();
        if status >= QuotaStatus::Warning {
            record.last_warning_at = Some(now);
            if record.enforcement_enabled {
                warn!(
                    tenant_id = %tenant_id,
                    resource_type = %resource_type,
                    usage = record.current_usage,
                    limit = record.limit,
                    status = %status,
                    "quota threshold crossed"
                );
            } else {
                debug!(
                    tenant_id = %tenant_id,
                    resource_type = %resource_type,
                    status = %status,
                    "quota threshold crossed (enforcement disabled)"
                );
            }
        }

        // Upsert and append inside the same per-key critical section so the
        // log order always matches the order usage was applied.
        self.store.upsert(&record).await?;
        self.store.append_log(entry).await?;

        Ok(record)
    }

    fn key_lock(&self, tenant_id: &str, resource_type: &str) -> Arc<Mutex<()>> {
        let key = QuotaKey::new(tenant_id, resource_type);
        self.key_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn validate_key(tenant_id: &str, resource_type: &str) -> QuotaResult<()> {
    if tenant_id.is_empty() {
        return Err(QuotaError::validation("tenant id must not be empty"));
    }
    if resource_type.is_empty() {
        return Err(QuotaError::validation("resource type must not be empty"));
    }
    Ok(())
}

fn validate_threshold(pct: f64) -> QuotaResult<()> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(QuotaError::validation(format!(
            "warning threshold must be between 0 and 100, got {}",
            pct
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryQuotaStore;

    fn ledger() -> QuotaLedger {
        QuotaLedger::new(Arc::new(InMemoryQuotaStore::new()))
    }

    fn no_context() -> HashMap<String, serde_json::Value> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_get_or_create_preserves_usage() {
        let ledger = ledger();

        ledger
            .get_or_create("t-1", "storage_mb", 1000, QuotaOptions::new())
            .await
            .unwrap();
        ledger
            .increment("t-1", "storage_mb", 400, "test", no_context())
            .await
            .unwrap();

        // Re-upserting the key changes the limit but not the usage.
        let record = ledger
            .get_or_create(
                "t-1",
                "storage_mb",
                2000,
                QuotaOptions::new().with_warning_threshold(50.0),
            )
            .await
            .unwrap();

        assert_eq!(record.limit, 2000);
        assert_eq!(record.current_usage, 400);
        assert_eq!(record.warning_threshold_pct, 50.0);
    }

    #[tokio::test]
    async fn test_increment_applies_past_the_limit() {
        let ledger = ledger();
        ledger
            .get_or_create("t-1", "storage_mb", 100, QuotaOptions::new())
            .await
            .unwrap();

        let record = ledger
            .increment("t-1", "storage_mb", 150, "test", no_context())
            .await
            .unwrap();

        // Usage is recorded in full; the status is what flags the overrun.
        assert_eq!(record.current_usage, 150);
        assert_eq!(record.status(), QuotaStatus::Exceeded);
        assert!(record.last_warning_at.is_some());
    }

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let ledger = ledger();
        ledger
            .increment("t-1", "storage_mb", 30, "test", no_context())
            .await
            .unwrap();

        let record = ledger
            .decrement("t-1", "storage_mb", 100, "test", no_context())
            .await
            .unwrap();

        assert_eq!(record.current_usage, 0);
    }

    #[tokio::test]
    async fn test_set_usage_logs_previous_value() {
        let ledger = ledger();
        ledger
            .increment("t-1", "storage_mb", 75, "test", no_context())
            .await
            .unwrap();
        ledger
            .set_usage("t-1", "storage_mb", 20, "admin", no_context())
            .await
            .unwrap();

        let entries = ledger
            .store()
            .log_entries("t-1", "storage_mb", None, None)
            .await
            .unwrap();
        let set_entry = entries.last().unwrap();

        assert_eq!(set_entry.action, UsageAction::Set);
        assert_eq!(set_entry.context.get("previous_usage"), Some(&json!(75)));
    }

    #[tokio::test]
    async fn test_auto_created_record_uses_defaults() {
        let defaults = QuotaDefaults::new()
            .with_limit("api_calls", 10_000)
            .with_warning_threshold(70.0);
        let ledger = QuotaLedger::with_defaults(Arc::new(InMemoryQuotaStore::new()), defaults);

        let record = ledger
            .increment("t-1", "api_calls", 1, "test", no_context())
            .await
            .unwrap();

        assert_eq!(record.limit, 10_000);
        assert_eq!(record.warning_threshold_pct, 70.0);

        // Unconfigured resources fall back to unlimited.
        let record = ledger
            .increment("t-1", "exports", 1, "test", no_context())
            .await
            .unwrap();
        assert!(record.is_unlimited());
    }

    #[tokio::test]
    async fn test_validation_rejects_before_mutation() {
        let ledger = ledger();

        assert!(matches!(
            ledger.increment("", "r", 1, "test", no_context()).await,
            Err(QuotaError::Validation(_))
        ));
        assert!(matches!(
            ledger.increment("t-1", "", 1, "test", no_context()).await,
            Err(QuotaError::Validation(_))
        ));
        assert!(matches!(
            ledger
                .get_or_create(
                    "t-1",
                    "r",
                    10,
                    QuotaOptions::new().with_warning_threshold(150.0)
                )
                .await,
            Err(QuotaError::Validation(_))
        ));

        // Nothing was written.
        assert!(ledger.check("t-1", "r").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let ledger = Arc::new(ledger());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger
                    .increment("t-1", "api_calls", 5, "test", HashMap::new())
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = ledger.check("t-1", "api_calls").await.unwrap().unwrap();
        assert_eq!(record.current_usage, 100);
    }
}
