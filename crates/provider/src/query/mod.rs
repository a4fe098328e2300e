//! List-query compilation.
//!
//! This module turns a loosely-typed [`ListParams`](crate::types::ListParams)
//! into a [`QueryPlan`] and applies that plan to a [`RemoteQueryBuilder`]:
//!
//! - [`FilterOperator`] - operator suffixes (`_gte`, `_lte`, `_neq`, `_is`, `_is_not`)
//! - [`partition_filter`] - equality entries vs. operator clauses
//! - [`RowRange`] - 1-based pages to inclusive 0-based row ranges
//! - [`TextSearch`] - the `q` term as one OR group of `ilike` predicates
//! - [`QueryPlan`] - the compiled request
//! - [`apply_plan`], [`execute_plan`] - plan application and result normalization
//!
//! # Example
//!
//! ```
//! use tabula_provider::query::{FilterOperator, QueryPlan, RowRange};
//! use tabula_provider::types::{ListParams, ResourceConfig, Sort};
//!
//! let config = ResourceConfig::with_search(
//!     ["id", "age_gte", "age_lte", "status", "name"],
//!     ["name"],
//! );
//! let params = ListParams::new(2, 5)
//!     .with_sort(Sort::asc("id"))
//!     .with_filter("age_gte", 18)
//!     .with_filter("status", "active")
//!     .with_filter("q", "smith");
//!
//! let plan = QueryPlan::compile("people", &config, &params).unwrap();
//! assert_eq!(plan.select, vec!["id", "age", "status", "name"]);
//! assert_eq!(plan.range, RowRange { from: 5, to: 9 });
//! assert_eq!(plan.clauses[0].operator, FilterOperator::Gte);
//! assert_eq!(plan.or_groups(), vec!["name.ilike.%smith%"]);
//! ```

mod builder;
mod executor;
mod filter;
mod operator;
mod plan;
mod range;
mod search;

pub use builder::{QueryResponse, RemoteClient, RemoteQueryBuilder, RowFilter};
pub use executor::{apply_plan, execute_plan};
pub use filter::{
    CUSTOM_FILTER_KEY, FilterClause, PartitionedFilter, ReservedTerms, SEARCH_KEY,
    partition_filter, take_reserved,
};
pub use operator::{FilterOperator, strip_operator_suffix};
pub use plan::QueryPlan;
pub use range::RowRange;
pub use search::{TextPredicate, TextSearch, quote_value};
