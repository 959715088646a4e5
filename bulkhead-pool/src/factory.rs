//! Connection factory seam
//!
//! The host application implements [`ConnectionFactory`] with its database
//! client of choice and injects it into the pool manager.

use crate::error::PoolResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolved per-tenant connection parameters
///
/// Built by the pool from its [`DatabaseTemplate`](crate::DatabaseTemplate)
/// and handed to the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Tenant the connection is for
    pub tenant_id: String,
    /// Database the factory should connect to
    pub database: String,
    /// Extra backend-specific parameters (host, search path, ...)
    pub params: HashMap<String, String>,
}

impl ConnectionSpec {
    /// Create a new spec
    pub fn new(tenant_id: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            database: database.into(),
            params: HashMap::new(),
        }
    }

    /// Add a backend parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Connection factory trait
///
/// Users implement this with their database client. `probe` should be the
/// cheapest round trip the backend offers (`SELECT 1` or equivalent);
/// `close` releases server-side resources for backends where dropping the
/// handle is not enough.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// The connection type (e.g. an sqlx pool handle, a client struct)
    type Connection: Send + Sync;

    /// Open a connection for the given tenant spec
    async fn connect(&self, spec: &ConnectionSpec) -> PoolResult<Self::Connection>;

    /// Check that a connection is still usable
    async fn probe(&self, _connection: &Self::Connection) -> bool {
        true
    }

    /// Close a connection
    async fn close(&self, _connection: &Self::Connection) -> PoolResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoFactory;

    #[async_trait]
    impl ConnectionFactory for EchoFactory {
        type Connection = String;

        async fn connect(&self, spec: &ConnectionSpec) -> PoolResult<Self::Connection> {
            Ok(format!("connected to {}", spec.database))
        }
    }

    #[tokio::test]
    async fn test_spec_builder() {
        let spec = ConnectionSpec::new("t-1", "tenant_t-1").with_param("host", "db.internal");
        assert_eq!(spec.tenant_id, "t-1");
        assert_eq!(spec.database, "tenant_t-1");
        assert_eq!(spec.params.get("host"), Some(&"db.internal".to_string()));
    }

    #[tokio::test]
    async fn test_default_probe_and_close() {
        let factory = EchoFactory;
        let conn = factory
            .connect(&ConnectionSpec::new("t-1", "tenant_t-1"))
            .await
            .unwrap();

        assert_eq!(conn, "connected to tenant_t-1");
        assert!(factory.probe(&conn).await);
        assert!(factory.close(&conn).await.is_ok());
    }
}
