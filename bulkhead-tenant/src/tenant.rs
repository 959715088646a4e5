//! Tenant Entity
//!
//! Plain tenant data with explicit mutators. No lifecycle hooks fire when a
//! field changes; cache and pool invalidation are explicit calls made by
//! whoever performs the mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tenant errors
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Invalid tenant: {0}")]
    Invalid(String),

    #[error("Tenant is inactive: {0}")]
    Inactive(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Tenant information
///
/// The `id` is the partition key used by every Bulkhead component: pool
/// entries, quota records, and cache keys are all scoped to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    /// Unique tenant identifier
    pub id: String,

    /// Tenant name/slug
    pub name: String,

    /// Tenant domain (if resolved by domain)
    pub domain: Option<String>,

    /// Explicit database name, overriding the pool's naming template
    pub database: Option<String>,

    /// Whether tenant is active
    pub active: bool,

    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

impl Tenant {
    /// Create a new active tenant
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkhead_tenant::Tenant;
    ///
    /// let tenant = Tenant::new("t-123", "acme-corp");
    /// assert!(tenant.active);
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            domain: None,
            database: None,
            active: true,
            metadata: HashMap::new(),
        }
    }

    /// Set tenant domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set an explicit database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Rename the tenant
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Activate or deactivate the tenant
    ///
    /// Deactivating does not touch pooled connections or cached data.
    /// Callers pair this with `TenantPoolManager::remove` and
    /// `TenantCache::flush_tenant` as their policy requires.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Insert or replace a metadata entry
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Remove a metadata entry, returning the previous value
    pub fn remove_metadata(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    /// Get the cache key prefix for this tenant
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkhead_tenant::Tenant;
    ///
    /// let tenant = Tenant::new("t-123", "acme");
    /// assert_eq!(tenant.cache_key("users:1"), "tenant:t-123:users:1");
    /// ```
    pub fn cache_key(&self, key: &str) -> String {
        format!("tenant:{}:{}", self.id, key)
    }
}

/// Tenant context carried through a unit of work
///
/// The host's resolution layer fills this in once per request/job; Bulkhead
/// components read the tenant id out of it.
#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    tenant: Option<Tenant>,
}

impl TenantContext {
    /// Create empty tenant context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with tenant
    pub fn with_tenant(tenant: Tenant) -> Self {
        Self {
            tenant: Some(tenant),
        }
    }

    /// Get tenant
    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    /// Set tenant
    pub fn set_tenant(&mut self, tenant: Tenant) {
        self.tenant = Some(tenant);
    }

    /// Get tenant ID
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().map(|t| t.id.as_str())
    }

    /// Check if tenant is set
    pub fn has_tenant(&self) -> bool {
        self.tenant.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_new() {
        let tenant = Tenant::new("t-1", "acme");
        assert_eq!(tenant.id, "t-1");
        assert_eq!(tenant.name, "acme");
        assert!(tenant.active);
        assert!(tenant.database.is_none());
    }

    #[test]
    fn test_tenant_builder() {
        let tenant = Tenant::new("t-1", "acme")
            .with_domain("acme.example.com")
            .with_database("acme_db")
            .with_metadata("plan", "premium");

        assert_eq!(tenant.domain, Some("acme.example.com".to_string()));
        assert_eq!(tenant.database, Some("acme_db".to_string()));
        assert_eq!(tenant.metadata.get("plan"), Some(&"premium".to_string()));
    }

    #[test]
    fn test_explicit_mutators() {
        let mut tenant = Tenant::new("t-1", "acme");

        tenant.rename("acme-inc");
        tenant.set_active(false);
        tenant.set_metadata("region", "eu-west");

        assert_eq!(tenant.name, "acme-inc");
        assert!(!tenant.active);
        assert_eq!(tenant.remove_metadata("region"), Some("eu-west".to_string()));
        assert!(tenant.metadata.is_empty());
    }

    #[test]
    fn test_cache_key() {
        let tenant = Tenant::new("t-123", "acme");
        assert_eq!(tenant.cache_key("users:1"), "tenant:t-123:users:1");
    }

    #[test]
    fn test_tenant_context() {
        let mut context = TenantContext::new();
        assert!(!context.has_tenant());

        context.set_tenant(Tenant::new("t-1", "acme"));
        assert!(context.has_tenant());
        assert_eq!(context.tenant_id(), Some("t-1"));
        assert_eq!(context.tenant().unwrap().name, "acme");
    }
}
