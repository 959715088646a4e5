//! Pool configuration and database-name derivation

use crate::error::{PoolError, PoolResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Template for deriving a tenant's database name
///
/// The derived name is `{prefix}{tenant_id}{suffix}`, so the same tenant id
/// always maps to the same database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseTemplate {
    /// Prepended to the tenant id
    pub prefix: String,
    /// Appended after the tenant id
    pub suffix: String,
}

impl DatabaseTemplate {
    /// Create a new template
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Derive the database name for a tenant
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkhead_pool::DatabaseTemplate;
    ///
    /// let template = DatabaseTemplate::default();
    /// assert_eq!(template.database_name("acme"), "tenant_acme");
    /// ```
    pub fn database_name(&self, tenant_id: &str) -> String {
        format!("{}{}{}", self.prefix, tenant_id, self.suffix)
    }
}

impl Default for DatabaseTemplate {
    fn default() -> Self {
        Self::new("tenant_", "")
    }
}

/// Configuration for the tenant connection pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of pooled connections across all tenants
    pub max_pool_size: usize,
    /// How long an untouched entry may stay pooled before being swept
    pub max_idle_time: Duration,
    /// How long a connection attempt may take before failing
    pub connection_timeout: Duration,
    /// When false, every acquire builds a fresh unpooled connection
    pub pooling_enabled: bool,
    /// Database naming template; `None` means no tenant connection can be
    /// constructed and `acquire` fails with a configuration error
    pub template: Option<DatabaseTemplate>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 50,
            max_idle_time: Duration::from_secs(300),
            connection_timeout: Duration::from_secs(10),
            pooling_enabled: true,
            template: Some(DatabaseTemplate::default()),
        }
    }
}

impl PoolConfig {
    /// Create a configuration with the documented defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum pool size
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set the idle expiry duration
    pub fn with_max_idle_time(mut self, idle: Duration) -> Self {
        self.max_idle_time = idle;
        self
    }

    /// Set the connection construction timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Enable or disable pooling
    pub fn with_pooling_enabled(mut self, enabled: bool) -> Self {
        self.pooling_enabled = enabled;
        self
    }

    /// Set the database naming template
    pub fn with_template(mut self, template: DatabaseTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Remove the naming template
    ///
    /// Useful for deployments where connections are only ever built by an
    /// external provisioning step and `acquire` should refuse to construct.
    pub fn without_template(mut self) -> Self {
        self.template = None;
        self
    }

    /// Check the configuration for invalid combinations
    pub fn validate(&self) -> PoolResult<()> {
        if self.pooling_enabled && self.max_pool_size == 0 {
            return Err(PoolError::configuration(
                "max_pool_size must be at least 1 when pooling is enabled",
            ));
        }
        if self.connection_timeout.is_zero() {
            return Err(PoolError::configuration(
                "connection_timeout must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_pool_size, 50);
        assert_eq!(config.max_idle_time, Duration::from_secs(300));
        assert_eq!(config.connection_timeout, Duration::from_secs(10));
        assert!(config.pooling_enabled);
        assert!(config.template.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_name_derivation() {
        let template = DatabaseTemplate::new("saas_", "_prod");
        assert_eq!(template.database_name("t-42"), "saas_t-42_prod");
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new()
            .with_max_pool_size(2)
            .with_max_idle_time(Duration::from_secs(60))
            .with_pooling_enabled(false);

        assert_eq!(config.max_pool_size, 2);
        assert_eq!(config.max_idle_time, Duration::from_secs(60));
        assert!(!config.pooling_enabled);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = PoolConfig::new().with_max_pool_size(0);
        assert!(config.validate().is_err());

        // A zero-capacity pool is fine when pooling is off entirely.
        let config = PoolConfig::new()
            .with_max_pool_size(0)
            .with_pooling_enabled(false);
        assert!(config.validate().is_ok());
    }
}
