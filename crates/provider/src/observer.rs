//! Optional query observation.
//!
//! A [`QueryObserver`] receives each compiled plan and the outcome of running
//! it. The provider only calls the observer when
//! [`ProviderConfig::log_queries`](crate::config::ProviderConfig::log_queries)
//! is set; [`TracingObserver`] is the default and emits `tracing` events.

use crate::error::ProviderError;
use crate::query::QueryPlan;
use crate::types::ListResult;

/// Hook receiving compiled plans and their outcomes.
pub trait QueryObserver: Send + Sync {
    /// Called after compilation, before the query is sent.
    fn plan_compiled(&self, _plan: &QueryPlan) {}

    /// Called once the query completed or failed.
    fn query_completed(&self, _plan: &QueryPlan, _outcome: Result<&ListResult, &ProviderError>) {}
}

/// Observer that logs plans and outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn plan_compiled(&self, plan: &QueryPlan) {
        tracing::debug!(
            resource = %plan.resource,
            select = ?plan.select,
            sort_field = %plan.sort.field,
            sort_order = %plan.sort.order,
            range_from = plan.range.from,
            range_to = plan.range.to,
            equality = ?plan.equality,
            clauses = plan.clauses.len(),
            or_groups = ?plan.or_groups(),
            "Compiled list query"
        );
    }

    fn query_completed(&self, plan: &QueryPlan, outcome: Result<&ListResult, &ProviderError>) {
        match outcome {
            Ok(result) => tracing::debug!(
                resource = %plan.resource,
                rows = result.data.len(),
                total = result.total,
                "List query completed"
            ),
            Err(e) => tracing::warn!(
                resource = %plan.resource,
                error = %e,
                "List query failed"
            ),
        }
    }
}
