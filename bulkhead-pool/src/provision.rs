//! Tenant database provisioning
//!
//! Creates and drops per-tenant databases through an injected backend.
//! Existence is checked explicitly before creation; the outcome is a typed
//! value, never inferred from the text of a duplicate-database error.

use crate::config::DatabaseTemplate;
use crate::error::{PoolError, PoolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Database provisioning backend
///
/// Implement this with your database's administrative interface.
#[async_trait]
pub trait DatabaseProvisioner: Send + Sync {
    /// Check whether a database exists
    async fn database_exists(&self, database: &str) -> PoolResult<bool>;

    /// Create a database
    async fn create_database(&self, database: &str) -> PoolResult<()>;

    /// Drop a database (optional)
    async fn drop_database(&self, database: &str) -> PoolResult<()> {
        Err(PoolError::Unsupported(format!(
            "dropping database {} is not supported by this provisioner",
            database
        )))
    }
}

/// Result of a provisioning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// The database was created by this call
    Created,
    /// The database already existed; nothing was done
    AlreadyExists,
}

/// Provisions tenant databases using the pool's naming template
pub struct TenantProvisioner<P: DatabaseProvisioner> {
    provisioner: Arc<P>,
    template: DatabaseTemplate,
}

impl<P: DatabaseProvisioner> TenantProvisioner<P> {
    /// Create a new tenant provisioner
    pub fn new(provisioner: Arc<P>, template: DatabaseTemplate) -> Self {
        Self {
            provisioner,
            template,
        }
    }

    /// Derive the database name this provisioner will use for a tenant
    pub fn database_name(&self, tenant_id: &str) -> String {
        self.template.database_name(tenant_id)
    }

    /// Ensure the tenant's database exists
    ///
    /// Checks for existence first and reports which branch was taken.
    /// Creation failures propagate unchanged.
    pub async fn provision(&self, tenant_id: &str) -> PoolResult<ProvisionOutcome> {
        if tenant_id.is_empty() {
            return Err(PoolError::validation("tenant id must not be empty"));
        }

        let database = self.database_name(tenant_id);
        if self.provisioner.database_exists(&database).await? {
            debug!(tenant_id = %tenant_id, database = %database, "tenant database already exists");
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        self.provisioner.create_database(&database).await?;
        info!(tenant_id = %tenant_id, database = %database, "created tenant database");
        Ok(ProvisionOutcome::Created)
    }

    /// Drop the tenant's database
    pub async fn deprovision(&self, tenant_id: &str) -> PoolResult<()> {
        if tenant_id.is_empty() {
            return Err(PoolError::validation("tenant id must not be empty"));
        }

        let database = self.database_name(tenant_id);
        self.provisioner.drop_database(&database).await?;
        info!(tenant_id = %tenant_id, database = %database, "dropped tenant database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockProvisioner {
        databases: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl DatabaseProvisioner for MockProvisioner {
        async fn database_exists(&self, database: &str) -> PoolResult<bool> {
            Ok(self.databases.lock().unwrap().contains(database))
        }

        async fn create_database(&self, database: &str) -> PoolResult<()> {
            self.databases.lock().unwrap().insert(database.to_string());
            Ok(())
        }

        async fn drop_database(&self, database: &str) -> PoolResult<()> {
            self.databases.lock().unwrap().remove(database);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_provision_reports_created_then_already_exists() {
        let backend = Arc::new(MockProvisioner::default());
        let provisioner = TenantProvisioner::new(Arc::clone(&backend), DatabaseTemplate::default());

        assert_eq!(
            provisioner.provision("t-1").await.unwrap(),
            ProvisionOutcome::Created
        );
        assert_eq!(
            provisioner.provision("t-1").await.unwrap(),
            ProvisionOutcome::AlreadyExists
        );
        assert!(backend.databases.lock().unwrap().contains("tenant_t-1"));
    }

    #[tokio::test]
    async fn test_deprovision_drops_database() {
        let backend = Arc::new(MockProvisioner::default());
        let provisioner = TenantProvisioner::new(Arc::clone(&backend), DatabaseTemplate::default());

        provisioner.provision("t-1").await.unwrap();
        provisioner.deprovision("t-1").await.unwrap();

        assert!(backend.databases.lock().unwrap().is_empty());
        assert_eq!(
            provisioner.provision("t-1").await.unwrap(),
            ProvisionOutcome::Created
        );
    }

    #[tokio::test]
    async fn test_empty_tenant_id_rejected() {
        let backend = Arc::new(MockProvisioner::default());
        let provisioner = TenantProvisioner::new(backend, DatabaseTemplate::default());

        assert!(matches!(
            provisioner.provision("").await,
            Err(PoolError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_unsupported_by_default() {
        struct CreateOnly;

        #[async_trait]
        impl DatabaseProvisioner for CreateOnly {
            async fn database_exists(&self, _database: &str) -> PoolResult<bool> {
                Ok(false)
            }

            async fn create_database(&self, _database: &str) -> PoolResult<()> {
                Ok(())
            }
        }

        let provisioner = TenantProvisioner::new(Arc::new(CreateOnly), DatabaseTemplate::default());
        assert!(matches!(
            provisioner.deprovision("t-1").await,
            Err(PoolError::Unsupported(_))
        ));
    }
}
