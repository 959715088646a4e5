//! Quota reporting and recommendations
//!
//! Pure read-side aggregations over quota records and the usage log for
//! the admin/monitoring layer. Nothing here mutates state.

use crate::error::QuotaResult;
use crate::ledger::QuotaLedger;
use crate::log::UsageAction;
use crate::record::QuotaStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How far back the recommendation heuristic looks in the usage log
const TREND_WINDOW_DAYS: i64 = 7;

/// Usage percentage at which a resource counts as critical
const CRITICAL_USAGE_PCT: f64 = 90.0;

/// Aggregated quota state for one tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantQuotaSummary {
    /// Tenant the summary covers
    pub tenant_id: String,
    /// Worst status across the tenant's resources
    pub overall_status: QuotaStatus,
    /// Resources at or over their limit
    pub exceeded: Vec<String>,
    /// Resources at or over their warning threshold (but under the limit)
    pub warning: Vec<String>,
    /// Resources at or above 90 % of their limit, exceeded ones included
    pub critical_resources: Vec<String>,
}

/// Priority of a limit recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    /// Near the threshold but not growing
    Low,
    /// Near the threshold and still growing
    Medium,
    /// Currently over the limit
    High,
}

/// A suggested limit change for one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitRecommendation {
    /// Resource the recommendation applies to
    pub resource_type: String,
    /// Limit as currently configured
    pub current_limit: u64,
    /// Suggested new limit, never below the current usage
    pub suggested_limit: u64,
    /// Why the suggestion was made
    pub reason: String,
    /// How urgent the change is
    pub priority: RecommendationPriority,
}

/// Aggregation of usage-log activity over a time range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Sum of incremented amounts
    pub total_increments: u64,
    /// Sum of decremented amounts
    pub total_decrements: u64,
    /// Increments minus decrements (absolute sets excluded)
    pub net_change: i64,
    /// Entry counts per action name
    pub action_counts: HashMap<String, u64>,
    /// Summed amounts per source tag
    pub source_breakdown: HashMap<String, u64>,
    /// Net change per day (`YYYY-MM-DD`), in date order
    pub daily_usage: BTreeMap<String, i64>,
}

impl QuotaLedger {
    /// Aggregate all of a tenant's quota records into one summary
    ///
    /// Idempotent: two calls with no mutation in between return identical
    /// output.
    pub async fn summary(&self, tenant_id: &str) -> QuotaResult<TenantQuotaSummary> {
        let records = self.store().list_for_tenant(tenant_id).await?;

        let mut summary = TenantQuotaSummary {
            tenant_id: tenant_id.to_string(),
            overall_status: QuotaStatus::Ok,
            exceeded: Vec::new(),
            warning: Vec::new(),
            critical_resources: Vec::new(),
        };

        for record in &records {
            let status = record.status();
            summary.overall_status = summary.overall_status.max(status);
            match status {
                QuotaStatus::Exceeded => summary.exceeded.push(record.resource_type.clone()),
                QuotaStatus::Warning => summary.warning.push(record.resource_type.clone()),
                QuotaStatus::Ok => {}
            }
            if !record.is_unlimited() && record.usage_percentage() >= CRITICAL_USAGE_PCT {
                summary.critical_resources.push(record.resource_type.clone());
            }
        }

        Ok(summary)
    }

    /// Suggest limit raises for resources trending into their limits
    ///
    /// Looks at the last seven days of log activity per resource. The
    /// suggestion is monotonic: higher sustained usage yields a higher
    /// suggested limit, and the suggestion is never below the current
    /// usage. Unlimited resources are skipped.
    pub async fn recommendations(
        &self,
        tenant_id: &str,
    ) -> QuotaResult<Vec<LimitRecommendation>> {
        let records = self.store().list_for_tenant(tenant_id).await?;
        let window_start = Utc::now() - Duration::days(TREND_WINDOW_DAYS);

        let mut recommendations = Vec::new();
        for record in &records {
            if record.is_unlimited() {
                continue;
            }

            let status = record.status();
            if status == QuotaStatus::Ok {
                continue;
            }

            let entries = self
                .store()
                .log_entries(
                    tenant_id,
                    &record.resource_type,
                    Some(window_start),
                    None,
                )
                .await?;
            let net_change: i64 = entries
                .iter()
                .map(|e| match e.action {
                    UsageAction::Increment => e.amount as i64,
                    UsageAction::Decrement => -(e.amount as i64),
                    UsageAction::Set => 0,
                })
                .sum();

            let (priority, reason) = match status {
                QuotaStatus::Exceeded => (
                    RecommendationPriority::High,
                    format!(
                        "usage {} exceeds the limit of {}",
                        record.current_usage, record.limit
                    ),
                ),
                _ if net_change > 0 => (
                    RecommendationPriority::Medium,
                    format!(
                        "usage at {:.0}% of the limit and still growing",
                        record.usage_percentage()
                    ),
                ),
                _ => (
                    RecommendationPriority::Low,
                    format!(
                        "usage at {:.0}% of the limit",
                        record.usage_percentage()
                    ),
                ),
            };

            recommendations.push(LimitRecommendation {
                resource_type: record.resource_type.clone(),
                current_limit: record.limit,
                suggested_limit: with_headroom(record.limit.max(record.current_usage)),
                reason,
                priority,
            });
        }

        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(recommendations)
    }

    /// Aggregate the usage log for one key over a time range
    ///
    /// Pure aggregation with no side effects. Absolute `set` entries are
    /// counted in `action_counts` but excluded from `net_change`, since
    /// they are not deltas.
    pub async fn usage_summary(
        &self,
        tenant_id: &str,
        resource_type: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> QuotaResult<UsageSummary> {
        let entries = self
            .store()
            .log_entries(tenant_id, resource_type, start, end)
            .await?;

        let mut summary = UsageSummary::default();
        for entry in &entries {
            *summary
                .action_counts
                .entry(entry.action.as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .source_breakdown
                .entry(entry.source.clone())
                .or_insert(0) += entry.amount;

            let day = entry.recorded_at.date_naive().to_string();
            let daily = summary.daily_usage.entry(day).or_insert(0);

            match entry.action {
                UsageAction::Increment => {
                    summary.total_increments += entry.amount;
                    *daily += entry.amount as i64;
                }
                UsageAction::Decrement => {
                    summary.total_decrements += entry.amount;
                    *daily -= entry.amount as i64;
                }
                UsageAction::Set => {}
            }
        }
        summary.net_change = summary.total_increments as i64 - summary.total_decrements as i64;

        Ok(summary)
    }
}

/// Add 25 % headroom, always suggesting at least one unit more
fn with_headroom(value: u64) -> u64 {
    value + (value / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::QuotaOptions;
    use crate::store::InMemoryQuotaStore;
    use std::sync::Arc;

    fn ledger() -> QuotaLedger {
        QuotaLedger::new(Arc::new(InMemoryQuotaStore::new()))
    }

    fn no_context() -> HashMap<String, serde_json::Value> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_summary_buckets_and_overall_status() {
        let ledger = ledger();
        ledger
            .get_or_create("t-1", "storage_mb", 100, QuotaOptions::new())
            .await
            .unwrap();
        ledger
            .get_or_create("t-1", "api_calls", 100, QuotaOptions::new())
            .await
            .unwrap();
        ledger
            .get_or_create("t-1", "seats", 100, QuotaOptions::new())
            .await
            .unwrap();

        ledger
            .increment("t-1", "storage_mb", 150, "test", no_context())
            .await
            .unwrap();
        ledger
            .increment("t-1", "api_calls", 85, "test", no_context())
            .await
            .unwrap();
        ledger
            .increment("t-1", "seats", 10, "test", no_context())
            .await
            .unwrap();

        let summary = ledger.summary("t-1").await.unwrap();
        assert_eq!(summary.overall_status, QuotaStatus::Exceeded);
        assert_eq!(summary.exceeded, vec!["storage_mb".to_string()]);
        assert_eq!(summary.warning, vec!["api_calls".to_string()]);
        assert_eq!(summary.critical_resources, vec!["storage_mb".to_string()]);
    }

    #[tokio::test]
    async fn test_summary_is_idempotent() {
        let ledger = ledger();
        ledger
            .increment("t-1", "storage_mb", 42, "test", no_context())
            .await
            .unwrap();

        let first = ledger.summary("t-1").await.unwrap();
        let second = ledger.summary("t-1").await.unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_recommendations_prioritize_exceeded() {
        let ledger = ledger();
        ledger
            .get_or_create("t-1", "storage_mb", 100, QuotaOptions::new())
            .await
            .unwrap();
        ledger
            .get_or_create("t-1", "api_calls", 100, QuotaOptions::new())
            .await
            .unwrap();

        ledger
            .increment("t-1", "storage_mb", 130, "test", no_context())
            .await
            .unwrap();
        ledger
            .increment("t-1", "api_calls", 85, "test", no_context())
            .await
            .unwrap();

        let recommendations = ledger.recommendations("t-1").await.unwrap();
        assert_eq!(recommendations.len(), 2);

        let storage = &recommendations[0];
        assert_eq!(storage.resource_type, "storage_mb");
        assert_eq!(storage.priority, RecommendationPriority::High);
        // Never below current usage, with headroom on top.
        assert!(storage.suggested_limit >= 130);

        let api = &recommendations[1];
        assert_eq!(api.resource_type, "api_calls");
        assert_eq!(api.priority, RecommendationPriority::Medium);
        assert!(api.suggested_limit > api.current_limit);
    }

    #[tokio::test]
    async fn test_recommendations_skip_healthy_and_unlimited() {
        let ledger = ledger();
        ledger
            .get_or_create("t-1", "seats", 100, QuotaOptions::new())
            .await
            .unwrap();
        ledger
            .increment("t-1", "seats", 10, "test", no_context())
            .await
            .unwrap();
        ledger
            .increment("t-1", "unmetered", 1_000_000, "test", no_context())
            .await
            .unwrap();

        let recommendations = ledger.recommendations("t-1").await.unwrap();
        assert!(recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_usage_summary_aggregates() {
        let ledger = ledger();

        ledger
            .increment("t-1", "storage_mb", 100, "api", no_context())
            .await
            .unwrap();
        ledger
            .increment("t-1", "storage_mb", 50, "import-job", no_context())
            .await
            .unwrap();
        ledger
            .decrement("t-1", "storage_mb", 30, "api", no_context())
            .await
            .unwrap();
        ledger
            .set_usage("t-1", "storage_mb", 90, "admin", no_context())
            .await
            .unwrap();

        let summary = ledger
            .usage_summary("t-1", "storage_mb", None, None)
            .await
            .unwrap();

        assert_eq!(summary.total_increments, 150);
        assert_eq!(summary.total_decrements, 30);
        assert_eq!(summary.net_change, 120);
        assert_eq!(summary.action_counts.get("increment"), Some(&2));
        assert_eq!(summary.action_counts.get("decrement"), Some(&1));
        assert_eq!(summary.action_counts.get("set"), Some(&1));
        assert_eq!(summary.source_breakdown.get("api"), Some(&130));
        assert_eq!(summary.source_breakdown.get("import-job"), Some(&50));
        assert_eq!(summary.daily_usage.len(), 1);
    }

    #[tokio::test]
    async fn test_usage_summary_respects_range() {
        let ledger = ledger();
        ledger
            .increment("t-1", "storage_mb", 100, "api", no_context())
            .await
            .unwrap();

        let future = Utc::now() + Duration::hours(1);
        let summary = ledger
            .usage_summary("t-1", "storage_mb", Some(future), None)
            .await
            .unwrap();

        assert_eq!(summary.total_increments, 0);
        assert!(summary.daily_usage.is_empty());
    }

    #[test]
    fn test_headroom_is_monotonic() {
        assert_eq!(with_headroom(100), 125);
        assert_eq!(with_headroom(3), 4);
        assert!(with_headroom(0) > 0);

        let mut last = 0;
        for value in [10u64, 50, 100, 500, 1000] {
            let suggested = with_headroom(value);
            assert!(suggested > value);
            assert!(suggested > last);
            last = suggested;
        }
    }
}
