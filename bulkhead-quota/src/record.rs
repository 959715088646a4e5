//! Quota records and derived status
//!
//! A record caches the current usage for one (tenant, resource) pair; the
//! usage log is the historical source of truth. Status is a pure function
//! of the stored fields and is re-derived on every read, so it moves back
//! down as usage drops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived quota status, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStatus {
    /// Usage below the warning threshold
    Ok,
    /// Usage at or above the warning threshold
    Warning,
    /// Usage at or above the limit
    Exceeded,
}

impl std::fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warning => write!(f, "warning"),
            Self::Exceeded => write!(f, "exceeded"),
        }
    }
}

/// Usage-versus-limit state for one (tenant, resource type) pair
///
/// `limit == 0` means unlimited: percentage reads as zero and the status
/// is always [`QuotaStatus::Ok`]. Records are never deleted by the core;
/// quota history stays available for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaRecord {
    /// Tenant the quota belongs to
    pub tenant_id: String,
    /// Resource being accounted (e.g. `storage_mb`, `api_calls`)
    pub resource_type: String,
    /// Maximum allowed usage; 0 means unlimited
    pub limit: u64,
    /// Current usage, clamped at zero by every mutation
    pub current_usage: u64,
    /// Percentage of the limit at which the status turns to warning
    pub warning_threshold_pct: f64,
    /// Whether threshold crossings update warning bookkeeping
    pub enforcement_enabled: bool,
    /// When usage was last checked or changed
    pub last_checked_at: Option<DateTime<Utc>>,
    /// When the record last entered warning or exceeded
    pub last_warning_at: Option<DateTime<Utc>>,
    /// Free-form metadata
    pub metadata: HashMap<String, serde_json::Value>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl QuotaRecord {
    /// Default warning threshold applied when none is configured
    pub const DEFAULT_WARNING_THRESHOLD_PCT: f64 = 80.0;

    /// Create a new record with zero usage
    ///
    /// # Examples
    ///
    /// ```
    /// use bulkhead_quota::{QuotaRecord, QuotaStatus};
    ///
    /// let record = QuotaRecord::new("t-1", "storage_mb", 1000);
    /// assert_eq!(record.current_usage, 0);
    /// assert_eq!(record.status(), QuotaStatus::Ok);
    /// ```
    pub fn new(
        tenant_id: impl Into<String>,
        resource_type: impl Into<String>,
        limit: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
            limit,
            current_usage: 0,
            warning_threshold_pct: Self::DEFAULT_WARNING_THRESHOLD_PCT,
            enforcement_enabled: true,
            last_checked_at: None,
            last_warning_at: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the warning threshold percentage
    pub fn with_warning_threshold(mut self, pct: f64) -> Self {
        self.warning_threshold_pct = pct;
        self
    }

    /// Enable or disable enforcement bookkeeping
    pub fn with_enforcement(mut self, enabled: bool) -> Self {
        self.enforcement_enabled = enabled;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether this record has no effective limit
    pub fn is_unlimited(&self) -> bool {
        self.limit == 0
    }

    /// Current usage as a percentage of the limit (0.0 when unlimited)
    pub fn usage_percentage(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            self.current_usage as f64 / self.limit as f64 * 100.0
        }
    }

    /// Usage still available under the limit, if one is set
    pub fn remaining(&self) -> Option<u64> {
        (self.limit > 0).then(|| self.limit.saturating_sub(self.current_usage))
    }

    /// Derive the current status
    pub fn status(&self) -> QuotaStatus {
        if self.limit == 0 {
            QuotaStatus::Ok
        } else if self.current_usage >= self.limit {
            QuotaStatus::Exceeded
        } else if self.usage_percentage() >= self.warning_threshold_pct {
            QuotaStatus::Warning
        } else {
            QuotaStatus::Ok
        }
    }
}
