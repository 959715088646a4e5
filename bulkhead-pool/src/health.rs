//! Pool health reporting
//!
//! Health is computed, never thrown: degraded states accumulate as issues
//! so monitoring can render partial health without crashing.

use serde::{Deserialize, Serialize};

/// Overall health of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Everything within thresholds
    Healthy,
    /// Approaching capacity or staleness limits
    Warning,
    /// A sampled connection failed its liveness probe
    Error,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One observed health problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthIssue {
    /// How bad the issue is
    pub severity: HealthStatus,
    /// Human-readable description
    pub message: String,
}

impl HealthIssue {
    /// Create a warning-severity issue
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: HealthStatus::Warning,
            message: message.into(),
        }
    }

    /// Create an error-severity issue
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: HealthStatus::Error,
            message: message.into(),
        }
    }
}

/// Health report for the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolHealth {
    /// Worst severity among the issues
    pub status: HealthStatus,
    /// Every observed problem, worst first is not guaranteed
    pub issues: Vec<HealthIssue>,
}

impl PoolHealth {
    /// A report with no issues
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            issues: Vec::new(),
        }
    }

    /// Record an issue, escalating the overall status if needed
    pub fn push(&mut self, issue: HealthIssue) {
        self.status = self.status.max(issue.severity);
        self.issues.push(issue);
    }

    /// Whether no issues were observed
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl Default for PoolHealth {
    fn default() -> Self {
        Self::healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert!(HealthStatus::Healthy < HealthStatus::Warning);
        assert!(HealthStatus::Warning < HealthStatus::Error);
    }

    #[test]
    fn test_push_escalates() {
        let mut health = PoolHealth::healthy();
        assert!(health.is_healthy());

        health.push(HealthIssue::warning("pool nearly full"));
        assert_eq!(health.status, HealthStatus::Warning);

        health.push(HealthIssue::error("sampled probe failed"));
        assert_eq!(health.status, HealthStatus::Error);

        // A later warning does not downgrade the status.
        health.push(HealthIssue::warning("entries going stale"));
        assert_eq!(health.status, HealthStatus::Error);
        assert_eq!(health.issues.len(), 3);
    }
}
