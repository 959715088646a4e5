//! Quota Accounting for Bulkhead
//!
//! Authoritative per-tenant resource usage tracking against configured
//! limits, with threshold-derived status and an append-only usage log for
//! audit and trend analysis.
//!
//! # Features
//!
//! - 📊 **Quota Records** - One record per (tenant, resource type), upserted by natural key
//! - 🧾 **Usage Ledger** - Every mutation appends an immutable, totally ordered log entry
//! - 🚦 **Derived Status** - `ok` / `warning` / `exceeded`, re-evaluated on every read
//! - 🔒 **Per-Key Serialization** - Concurrent increments are never lost
//! - 💡 **Recommendations** - Limit-raise suggestions from recent usage trends
//! - 📈 **Usage Reports** - Action counts, source breakdowns, daily net change
//!
//! # Quick Start
//!
//! ```rust
//! use bulkhead_quota::{InMemoryQuotaStore, QuotaLedger, QuotaOptions, QuotaStatus};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), bulkhead_quota::QuotaError> {
//! let ledger = QuotaLedger::new(Arc::new(InMemoryQuotaStore::new()));
//!
//! ledger
//!     .get_or_create("t-acme", "storage_mb", 1000, QuotaOptions::new())
//!     .await?;
//!
//! let record = ledger
//!     .increment("t-acme", "storage_mb", 850, "api", HashMap::new())
//!     .await?;
//! assert_eq!(record.status(), QuotaStatus::Warning);
//! # Ok(())
//! # }
//! ```
//!
//! Being over a limit is state, not an exception: increments always apply
//! and the returned status tells the caller to act. Callers that must
//! hard-block check the quota before performing the chargeable operation.

pub mod error;
pub mod ledger;
pub mod log;
pub mod record;
pub mod report;
pub mod store;

pub use error::{QuotaError, QuotaResult};
pub use ledger::{QuotaDefaults, QuotaLedger, QuotaOptions};
pub use log::{UsageAction, UsageLogEntry, replay};
pub use record::{QuotaRecord, QuotaStatus};
pub use report::{
    LimitRecommendation, RecommendationPriority, TenantQuotaSummary, UsageSummary,
};
pub use store::{InMemoryQuotaStore, QuotaKey, QuotaStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{QuotaError, QuotaResult};
    pub use crate::ledger::{QuotaDefaults, QuotaLedger, QuotaOptions};
    pub use crate::log::{UsageAction, UsageLogEntry};
    pub use crate::record::{QuotaRecord, QuotaStatus};
    pub use crate::report::{LimitRecommendation, TenantQuotaSummary, UsageSummary};
    pub use crate::store::{InMemoryQuotaStore, QuotaStore};
}
