//! Tenant-Scoped Caching
//!
//! Wraps any cache backend with per-tenant key prefixing so tenants can
//! never observe each other's entries, and tracks live keys per tenant so
//! a single tenant's cache can be flushed without touching anyone else's.

use async_trait::async_trait;
use parking_lot::Mutex;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Cache backend trait
///
/// Implement this with your cache of choice (Redis, Memcached, ...). Keys
/// arriving here are already tenant-prefixed.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get value from cache
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set value in cache
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Delete value from cache
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Clear all keys (every tenant!)
    async fn clear(&self) -> Result<(), CacheError>;
}

/// Tenant-aware cache
///
/// Prefixes every key with `tenant:{id}:` and maintains an index of live
/// keys per tenant. The index is what makes [`TenantCache::flush_tenant`]
/// possible on backends without key-pattern scans.
pub struct TenantCache<S: CacheStore> {
    store: S,
    keys: RwLock<HashMap<String, HashSet<String>>>,
}

impl<S: CacheStore> TenantCache<S> {
    /// Create a new tenant cache over an injected backend
    pub fn new(store: S) -> Self {
        Self {
            store,
            keys: RwLock::new(HashMap::new()),
        }
    }

    fn scoped_key(tenant_id: &str, key: &str) -> String {
        format!("tenant:{}:{}", tenant_id, key)
    }

    /// Get a value for a tenant
    pub async fn get(&self, tenant_id: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.store.get(&Self::scoped_key(tenant_id, key)).await
    }

    /// Set a value for a tenant
    pub async fn set(
        &self,
        tenant_id: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let scoped = Self::scoped_key(tenant_id, key);
        self.store.set(&scoped, value, ttl).await?;
        self.keys
            .write()
            .entry(tenant_id.to_string())
            .or_default()
            .insert(scoped);
        Ok(())
    }

    /// Delete a value for a tenant
    pub async fn delete(&self, tenant_id: &str, key: &str) -> Result<(), CacheError> {
        let scoped = Self::scoped_key(tenant_id, key);
        self.store.delete(&scoped).await?;
        if let Some(tracked) = self.keys.write().get_mut(tenant_id) {
            tracked.remove(&scoped);
        }
        Ok(())
    }

    /// Check if a key exists for a tenant
    pub async fn exists(&self, tenant_id: &str, key: &str) -> Result<bool, CacheError> {
        self.store.exists(&Self::scoped_key(tenant_id, key)).await
    }

    /// Remove every cached key belonging to one tenant
    ///
    /// Called explicitly when a tenant is suspended, deleted, or its
    /// configuration changes. Other tenants' entries are untouched.
    pub async fn flush_tenant(&self, tenant_id: &str) -> Result<usize, CacheError> {
        let tracked = self.keys.write().remove(tenant_id).unwrap_or_default();
        for key in &tracked {
            self.store.delete(key).await?;
        }
        debug!(tenant_id = %tenant_id, flushed = tracked.len(), "flushed tenant cache");
        Ok(tracked.len())
    }

    /// Number of live keys tracked for a tenant
    pub fn tracked_keys(&self, tenant_id: &str) -> usize {
        self.keys.read().get(tenant_id).map_or(0, HashSet::len)
    }

    /// Get a value with JSON deserialization
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        tenant_id: &str,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        match self.get(tenant_id, key).await? {
            Some(data) => {
                let value = serde_json::from_slice(&data)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value with JSON serialization
    pub async fn set_json<T: serde::Serialize>(
        &self,
        tenant_id: &str,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let data =
            serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.set(tenant_id, key, data, ttl).await
    }
}

/// In-memory cache backend
///
/// TTLs are honored lazily: an expired entry is dropped the next time it is
/// read or checked.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, CachedValue>>,
}

#[derive(Debug)]
struct CachedValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CachedValue {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

impl InMemoryCacheStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including not-yet-collected expired ones
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(value) if value.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(value) => Ok(Some(value.data.clone())),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.lock().insert(
            key.to_string(),
            CachedValue {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(value) if value.is_expired() => {
                entries.remove(key);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().clear();
        Ok(())
    }
}
