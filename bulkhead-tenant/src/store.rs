//! Tenant Lookup
//!
//! The seam between Bulkhead and the host application's tenant-resolution
//! layer. The host implements [`TenantStore`] against its own database; the
//! in-memory implementation backs tests and single-process deployments.

use crate::tenant::{Tenant, TenantError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Tenant store trait (implement with your database)
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Find tenant by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, TenantError>;

    /// Find tenant by name/slug
    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>, TenantError>;

    /// Find tenant by domain
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, TenantError>;
}

/// In-memory tenant store
///
/// Mutations are explicit `insert`/`remove` calls; there are no implicit
/// save hooks.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    tenants: RwLock<HashMap<String, Tenant>>,
}

impl InMemoryTenantStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a tenant, returning the previous entry
    pub fn insert(&self, tenant: Tenant) -> Option<Tenant> {
        self.tenants.write().insert(tenant.id.clone(), tenant)
    }

    /// Remove a tenant by id, returning it if present
    pub fn remove(&self, id: &str) -> Option<Tenant> {
        self.tenants.write().remove(id)
    }

    /// Number of stored tenants
    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.tenants.read().is_empty()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, TenantError> {
        Ok(self.tenants.read().get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>, TenantError> {
        Ok(self
            .tenants
            .read()
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, TenantError> {
        Ok(self
            .tenants
            .read()
            .values()
            .find(|t| t.domain.as_deref() == Some(domain))
            .cloned())
    }
}
