//! Tenant connection pool manager
//!
//! Hands out tenant-scoped connections on demand while bounding how many
//! are held at once. Entries are reused across sequential calls for the
//! same tenant, reclaimed when idle, and evicted least-recently-used when
//! the pool is full. A pooled connection that fails its liveness probe is
//! rebuilt inside the same call; the caller never sees the repair.

use crate::config::PoolConfig;
use crate::entry::{PoolEntry, PoolEntrySnapshot};
use crate::error::{PoolError, PoolResult};
use crate::factory::{ConnectionFactory, ConnectionSpec};
use crate::health::{HealthIssue, PoolHealth};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Tenant connection pool manager
///
/// Explicitly constructed and injected; the manager is the sole mutator of
/// pool membership, and every membership change happens under one lock.
///
/// # Examples
///
/// ```rust,ignore
/// let manager = TenantPoolManager::new(Arc::new(factory), PoolConfig::default())?;
///
/// let report = manager
///     .run_in_context("t-acme", |conn| async move { do_work(conn).await })
///     .await?;
/// ```
pub struct TenantPoolManager<F: ConnectionFactory> {
    config: PoolConfig,
    factory: Arc<F>,
    entries: Mutex<HashMap<String, PoolEntry<F::Connection>>>,
}

impl<F: ConnectionFactory> TenantPoolManager<F> {
    /// Create a new pool manager
    pub fn new(factory: Arc<F>, config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory,
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// The configuration this pool was built with
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get a connection for a tenant
    ///
    /// Reuses the tenant's pooled connection when it is still live,
    /// otherwise constructs one — sweeping idle entries first and evicting
    /// the least-recently-used entry if the pool is full. With pooling
    /// disabled this builds a fresh unpooled connection every call.
    ///
    /// Concurrent acquires for the same tenant receive the same connection
    /// object; coordinating statement-level concurrency on it is the
    /// caller's job.
    pub async fn acquire(&self, tenant_id: &str) -> PoolResult<Arc<F::Connection>> {
        if tenant_id.is_empty() {
            return Err(PoolError::validation("tenant id must not be empty"));
        }

        if !self.config.pooling_enabled {
            debug!(tenant_id = %tenant_id, "pooling disabled, building unpooled connection");
            let spec = self.spec_for(tenant_id)?;
            return Ok(Arc::new(self.connect(&spec).await?));
        }

        let mut entries = self.entries.lock().await;
        self.sweep_locked(&mut entries).await;

        let mut stale = false;
        if let Some(entry) = entries.get_mut(tenant_id) {
            let connection = entry.connection();
            if self.factory.probe(&connection).await {
                entry.record_use();
                trace!(
                    tenant_id = %tenant_id,
                    use_count = entry.use_count(),
                    "reusing pooled connection"
                );
                return Ok(connection);
            }
            stale = true;
        }

        if stale {
            // Dead connection: drop it quietly and rebuild below.
            if let Some(entry) = entries.remove(tenant_id) {
                debug!(tenant_id = %tenant_id, "pooled connection failed probe, rebuilding");
                self.close_entry(entry).await;
            }
        }

        if entries.len() >= self.config.max_pool_size {
            self.evict_lru_locked(&mut entries).await;
        }

        let spec = self.spec_for(tenant_id)?;
        let connection = self.connect(&spec).await?;
        let entry = PoolEntry::new(tenant_id, connection);
        let handle = entry.connection();
        entries.insert(tenant_id.to_string(), entry);
        debug!(
            tenant_id = %tenant_id,
            pool_size = entries.len(),
            "pooled new tenant connection"
        );
        Ok(handle)
    }

    /// Mark a tenant's connection as no longer in active use
    ///
    /// The connection stays pooled and open; only the access timestamp is
    /// refreshed. No-op when the tenant has no entry.
    pub async fn release(&self, tenant_id: &str) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(tenant_id) {
            entry.touch();
            trace!(tenant_id = %tenant_id, "released tenant connection");
        }
    }

    /// Close and evict a tenant's entry regardless of LRU order
    ///
    /// Used when a tenant is deleted or suspended.
    pub async fn remove(&self, tenant_id: &str) {
        let entry = self.entries.lock().await.remove(tenant_id);
        if let Some(entry) = entry {
            debug!(tenant_id = %tenant_id, "removed tenant connection from pool");
            self.close_entry(entry).await;
        }
    }

    /// Close and evict every entry
    pub async fn clear(&self) {
        let drained: Vec<_> = {
            let mut entries = self.entries.lock().await;
            entries.drain().map(|(_, entry)| entry).collect()
        };
        let count = drained.len();
        for entry in drained {
            self.close_entry(entry).await;
        }
        debug!(closed = count, "cleared connection pool");
    }

    /// Close every entry idle longer than the configured `max_idle_time`
    ///
    /// Runs opportunistically at the start of each pooled `acquire`; an
    /// external scheduler may also call it periodically.
    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        self.sweep_locked(&mut entries).await
    }

    /// Run tenant-scoped work with a pooled connection
    ///
    /// Acquires, invokes `work`, and releases on every exit path — the
    /// entry's access timestamp is refreshed whether `work` succeeds or
    /// fails.
    pub async fn run_in_context<T, E, Fut, W>(&self, tenant_id: &str, work: W) -> Result<T, E>
    where
        W: FnOnce(Arc<F::Connection>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<PoolError>,
    {
        let connection = self.acquire(tenant_id).await?;
        let result = work(connection).await;
        self.release(tenant_id).await;
        result
    }

    /// Number of pooled entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the pool is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Read-only views of every entry for the reporting layer
    pub async fn snapshot(&self) -> Vec<PoolEntrySnapshot> {
        let entries = self.entries.lock().await;
        let mut snapshots: Vec<_> = entries.values().map(PoolEntry::snapshot).collect();
        snapshots.sort_by(|a, b| a.tenant_id.cmp(&b.tenant_id));
        snapshots
    }

    /// Compute the pool's health without mutating it
    ///
    /// Warnings accumulate for high occupancy (> 90 % of capacity) and for
    /// entries approaching idle expiry (>= 80 % of `max_idle_time`); the
    /// least-recently-used connection is probed as a sample, and a probe
    /// failure escalates the report to an error.
    pub async fn health_check(&self) -> PoolHealth {
        let mut health = PoolHealth::healthy();

        let stale_cutoff = self.config.max_idle_time.mul_f64(0.8);
        let (size, stale_count, sample) = {
            let entries = self.entries.lock().await;
            let stale_count = entries
                .values()
                .filter(|entry| entry.idle_for() >= stale_cutoff)
                .count();
            let sample = entries
                .values()
                .min_by_key(|entry| entry.last_accessed_at())
                .map(|entry| (entry.tenant_id().to_string(), entry.connection()));
            (entries.len(), stale_count, sample)
        };

        if size * 10 > self.config.max_pool_size * 9 {
            health.push(HealthIssue::warning(format!(
                "pool occupancy {}/{} exceeds 90% of capacity",
                size, self.config.max_pool_size
            )));
        }

        if stale_count > 0 {
            health.push(HealthIssue::warning(format!(
                "{} entr{} within 80% of the idle expiry",
                stale_count,
                if stale_count == 1 { "y is" } else { "ies are" }
            )));
        }

        if let Some((tenant_id, connection)) = sample {
            if !self.factory.probe(&connection).await {
                health.push(HealthIssue::error(format!(
                    "sampled connection for tenant {} failed its liveness probe",
                    tenant_id
                )));
            }
        }

        health
    }

    fn spec_for(&self, tenant_id: &str) -> PoolResult<ConnectionSpec> {
        let template = self.config.template.as_ref().ok_or_else(|| {
            PoolError::configuration("no database template available for tenant connections")
        })?;
        Ok(ConnectionSpec::new(
            tenant_id,
            template.database_name(tenant_id),
        ))
    }

    async fn connect(&self, spec: &ConnectionSpec) -> PoolResult<F::Connection> {
        match timeout(self.config.connection_timeout, self.factory.connect(spec)).await {
            Ok(result) => result,
            Err(_) => Err(PoolError::Timeout {
                seconds: self.config.connection_timeout.as_secs(),
            }),
        }
    }

    async fn sweep_locked(&self, entries: &mut HashMap<String, PoolEntry<F::Connection>>) -> usize {
        let expired: Vec<String> = entries
            .values()
            .filter(|entry| entry.idle_for() >= self.config.max_idle_time)
            .map(|entry| entry.tenant_id().to_string())
            .collect();

        for tenant_id in &expired {
            if let Some(entry) = entries.remove(tenant_id) {
                debug!(
                    tenant_id = %tenant_id,
                    idle_secs = entry.idle_for().as_secs(),
                    "sweeping idle tenant connection"
                );
                self.close_entry(entry).await;
            }
        }
        expired.len()
    }

    async fn evict_lru_locked(&self, entries: &mut HashMap<String, PoolEntry<F::Connection>>) {
        let victim = entries
            .values()
            .min_by_key(|entry| entry.last_accessed_at())
            .map(|entry| entry.tenant_id().to_string());

        if let Some(tenant_id) = victim {
            if let Some(entry) = entries.remove(&tenant_id) {
                debug!(tenant_id = %tenant_id, "evicting least-recently-used connection");
                self.close_entry(entry).await;
            }
        }
    }

    /// Close a connection, keeping the pool consistent even when close fails
    ///
    /// The entry is already out of the map at this point; a close failure
    /// is logged and swallowed, since a stuck bookkeeping entry is worse
    /// than a best-effort close failure.
    async fn close_entry(&self, entry: PoolEntry<F::Connection>) {
        let connection = entry.connection();
        if let Err(error) = self.factory.close(&connection).await {
            warn!(
                tenant_id = %entry.tenant_id(),
                error = %error,
                "failed to close evicted connection"
            );
        }
    }
}
