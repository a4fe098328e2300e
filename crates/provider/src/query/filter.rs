//! Filter partitioning.
//!
//! The caller's filter map is split in two steps:
//!
//! 1. [`take_reserved`] removes the reserved keys `q` and `customFilterQuery`.
//! 2. [`partition_filter`] moves every operator-suffixed key into a
//!    [`FilterClause`] and leaves the remaining keys in an equality map.
//!
//! Every non-reserved key lands in exactly one of the two outputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RequestError;
use crate::types::Filter;

use super::operator::FilterOperator;

/// Reserved filter key carrying the free-text search term.
pub const SEARCH_KEY: &str = "q";

/// Reserved filter key carrying a raw backend OR expression.
pub const CUSTOM_FILTER_KEY: &str = "customFilterQuery";

/// A single comparison on a base column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// The base column, with any operator suffix removed.
    pub field: String,
    /// The comparison operator.
    pub operator: FilterOperator,
    /// The value to compare against.
    pub value: Value,
}

impl FilterClause {
    /// Creates a clause.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Parses a filter entry, reading the operator from the key suffix.
    pub fn parse(key: &str, value: Value) -> Self {
        let (field, operator) = FilterOperator::split_key(key);
        Self::new(field, operator, value)
    }
}

/// The reserved terms extracted from a filter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedTerms {
    /// The free-text search term (`q`), if non-empty.
    pub search: Option<String>,
    /// The raw OR expression (`customFilterQuery`), if non-empty.
    pub custom_filter: Option<String>,
}

/// A filter map split into equality entries and operator clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedFilter {
    /// Keys without an operator suffix, matched by equality.
    pub equality: Filter,
    /// Operator clauses, in filter-map order.
    pub clauses: Vec<FilterClause>,
}

/// Removes the reserved keys from `filter`.
///
/// Returns the reserved terms and the remaining filter. Empty strings and
/// nulls count as absent. Numbers are accepted as search terms.
pub fn take_reserved(filter: Filter) -> Result<(ReservedTerms, Filter), RequestError> {
    let mut terms = ReservedTerms::default();
    let mut rest = Filter::new();

    for (key, value) in filter {
        match key.as_str() {
            SEARCH_KEY => terms.search = search_term(value)?,
            CUSTOM_FILTER_KEY => terms.custom_filter = custom_filter(value)?,
            _ => {
                rest.insert(key, value);
            }
        }
    }

    Ok((terms, rest))
}

fn search_term(value: Value) -> Result<Option<String>, RequestError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(RequestError::InvalidFilterValue {
            key: SEARCH_KEY.to_string(),
            message: format!("expected a string, found {}", json_kind(&other)),
        }),
    }
}

fn custom_filter(value: Value) -> Result<Option<String>, RequestError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(RequestError::InvalidFilterValue {
            key: CUSTOM_FILTER_KEY.to_string(),
            message: format!("expected a string, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Splits a filter map into equality entries and operator clauses.
///
/// `age_gte` and `age_lte` both produce clauses on `age`; they are applied
/// independently and combine with AND.
pub fn partition_filter(filter: Filter) -> PartitionedFilter {
    let mut partitioned = PartitionedFilter::default();

    for (key, value) in filter {
        let clause = FilterClause::parse(&key, value);
        if clause.operator == FilterOperator::Eq {
            partitioned.equality.insert(key, clause.value);
        } else {
            partitioned.clauses.push(clause);
        }
    }

    partitioned
}
