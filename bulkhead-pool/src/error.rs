//! Error types for tenant connection pooling

use thiserror::Error;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Pool errors
///
/// Liveness-probe failures never appear here: a dead pooled connection is
/// rebuilt inside the same `acquire` call. Construction failures propagate
/// unchanged; the pool itself never retries.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Invalid input (empty tenant id, malformed configuration value)
    #[error("Invalid pool input: {0}")]
    Validation(String),

    /// No per-tenant connection template is available
    #[error("Pool configuration error: {0}")]
    Configuration(String),

    /// Establishing a tenant connection failed (network, auth, ...)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection construction exceeded the configured timeout
    #[error("Connection attempt timed out after {seconds}s")]
    Timeout {
        /// Configured timeout that was exceeded
        seconds: u64,
    },

    /// Making room in the pool failed
    ///
    /// Close failures during eviction are logged and the entry is removed
    /// from bookkeeping regardless, so this rarely surfaces.
    #[error("Pool capacity error: {0}")]
    Capacity(String),

    /// Operation not supported by the injected implementation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl PoolError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
