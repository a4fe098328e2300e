//! Applies a compiled plan to a remote query builder and normalizes the result.

use crate::error::ProviderResult;
use crate::types::ListResult;

use super::builder::{QueryResponse, RemoteQueryBuilder};
use super::plan::QueryPlan;

/// Applies `plan` to `builder` in the fixed order:
///
/// 1. select with count
/// 2. order
/// 3. equality match
/// 4. range
/// 5. operator clauses
/// 6. raw OR expression
/// 7. free-text OR group
pub fn apply_plan<B>(plan: &QueryPlan, builder: &mut B)
where
    B: RemoteQueryBuilder + ?Sized,
{
    builder.select(&plan.select, Some(plan.count));
    builder.order(&plan.sort.field, plan.sort.order.is_ascending());
    builder.match_all(&plan.equality);
    builder.range(plan.range.from, plan.range.to);

    for clause in &plan.clauses {
        builder.apply_clause(clause);
    }

    if let Some(custom) = &plan.custom_filter {
        builder.or(custom);
    }

    if let Some(search) = &plan.text_search {
        builder.or(&search.to_or_expression());
    }
}

/// Applies `plan`, executes the query once and normalizes the response.
///
/// A backend error is returned unchanged; it is never retried or replaced by
/// an empty result.
pub async fn execute_plan<B>(plan: &QueryPlan, mut builder: B) -> ProviderResult<ListResult>
where
    B: RemoteQueryBuilder,
{
    apply_plan(plan, &mut builder);
    let response = builder.execute().await?;
    Ok(ListResult::from(response))
}

impl From<QueryResponse> for ListResult {
    fn from(response: QueryResponse) -> Self {
        ListResult {
            data: response.data.unwrap_or_default(),
            total: response.count.unwrap_or(0),
        }
    }
}
