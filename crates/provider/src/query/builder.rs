//! Remote query builder and client traits.
//!
//! These traits are the seam between the compiler and a concrete backend.
//! A [`RemoteQueryBuilder`] accumulates clauses for one read query and
//! executes it in a single round trip; a [`RemoteClient`] hands out builders
//! and performs record mutations.
//!
//! ```text
//! RemoteClient
//!     ├── from_table() -> RemoteQueryBuilder
//!     │       select -> order -> match_all -> range -> gte/lte/neq/is/is_not -> or -> execute
//!     ├── insert()
//!     ├── update()
//!     └── delete()
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendResult;
use crate::types::{CountMode, Filter};

use super::filter::FilterClause;
use super::operator::FilterOperator;

/// Rows and count returned by a read query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    /// The returned rows, if the backend sent any.
    pub data: Option<Vec<Value>>,
    /// The total count, if one was requested and reported.
    pub count: Option<u64>,
}

impl QueryResponse {
    /// Creates a response with rows and a count.
    pub fn new(data: Vec<Value>, count: Option<u64>) -> Self {
        Self {
            data: Some(data),
            count,
        }
    }
}

/// A fluent read query against one table.
///
/// Conditions added by `match_all` and the comparison methods combine with
/// AND. Each call to [`or`](RemoteQueryBuilder::or) adds one separate OR group
/// that is itself ANDed with everything else.
#[async_trait]
pub trait RemoteQueryBuilder: Send {
    /// Selects columns, optionally requesting a total count.
    fn select(&mut self, columns: &[String], count: Option<CountMode>);

    /// Orders by a column.
    fn order(&mut self, field: &str, ascending: bool);

    /// Requires every entry of `filter` to match exactly.
    fn match_all(&mut self, filter: &Filter);

    /// Restricts the result to rows `from..=to`.
    fn range(&mut self, from: u64, to: u64);

    /// `field >= value`.
    fn gte(&mut self, field: &str, value: &Value);

    /// `field <= value`.
    fn lte(&mut self, field: &str, value: &Value);

    /// `field <> value`.
    fn neq(&mut self, field: &str, value: &Value);

    /// `field IS value` for null, true or false.
    fn is(&mut self, field: &str, value: &Value);

    /// `field IS NOT value`.
    fn is_not(&mut self, field: &str, value: &Value);

    /// `field IN (values)`.
    fn in_list(&mut self, field: &str, values: &[Value]);

    /// Adds an OR group written in the backend's logic-tree syntax.
    fn or(&mut self, expression: &str);

    /// Applies a parsed filter clause with the matching method.
    fn apply_clause(&mut self, clause: &FilterClause) {
        match clause.operator {
            FilterOperator::Eq => {
                let mut single = Filter::new();
                single.insert(clause.field.clone(), clause.value.clone());
                self.match_all(&single);
            }
            FilterOperator::Gte => self.gte(&clause.field, &clause.value),
            FilterOperator::Lte => self.lte(&clause.field, &clause.value),
            FilterOperator::Neq => self.neq(&clause.field, &clause.value),
            FilterOperator::Is => self.is(&clause.field, &clause.value),
            FilterOperator::IsNot => self.is_not(&clause.field, &clause.value),
        }
    }

    /// Executes the query.
    async fn execute(&mut self) -> BackendResult<QueryResponse>;
}

/// Rows targeted by an update or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// Rows matching every entry exactly.
    Match(Filter),
    /// Rows whose `field` is one of `values`.
    In {
        /// The column tested.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
}

impl RowFilter {
    /// Rows whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        let mut filter = Filter::new();
        filter.insert(field.into(), value);
        RowFilter::Match(filter)
    }

    /// Rows whose `field` is one of `values`.
    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        RowFilter::In {
            field: field.into(),
            values,
        }
    }
}

/// A client for a tabular backend.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// The read query type.
    type Query: RemoteQueryBuilder;

    /// Returns a human-readable name for this backend.
    fn backend_name(&self) -> &'static str;

    /// Starts a read query on `table`.
    fn from_table(&self, table: &str) -> Self::Query;

    /// Inserts one record and returns the stored rows.
    async fn insert(&self, table: &str, record: Value) -> BackendResult<Vec<Value>>;

    /// Applies `patch` to the targeted rows and returns them.
    async fn update(&self, table: &str, target: &RowFilter, patch: Value)
    -> BackendResult<Vec<Value>>;

    /// Deletes the targeted rows and returns them.
    async fn delete(&self, table: &str, target: &RowFilter) -> BackendResult<Vec<Value>>;
}
