//! In-memory backend.
//!
//! [`MemoryClient`] keeps tables as vectors of JSON rows and evaluates the
//! same builder calls a PostgREST server would receive. Every executed read
//! query is recorded with the exact sequence of builder calls, which makes
//! the client useful both for local experiments and for asserting how the
//! compiler drives a backend.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabula_provider::backends::memory::MemoryClient;
//! use tabula_provider::query::{RemoteClient, RemoteQueryBuilder};
//!
//! let client = MemoryClient::new();
//! client.seed("posts", vec![json!({"id": 1, "views": 5}), json!({"id": 2, "views": 50})]);
//!
//! let mut query = client.from_table("posts");
//! query.gte("views", &json!(10));
//! # let response = tokio::runtime::Builder::new_current_thread()
//! #     .build()
//! #     .unwrap()
//! #     .block_on(query.execute())
//! #     .unwrap();
//! assert_eq!(response.data.unwrap(), vec![json!({"id": 2, "views": 50})]);
//! assert_eq!(client.query_log()[0].call_names(), vec!["gte"]);
//! ```

mod eval;
mod expr;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{BackendError, BackendResult};
use crate::query::{FilterOperator, QueryResponse, RemoteClient, RemoteQueryBuilder, RowFilter};
use crate::types::{CountMode, Filter};

pub use expr::{ExprOperator, ExprParseError, ExprValue, LogicExpr};

/// One builder call, as received by [`MemoryQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCall {
    /// `select(columns, count)`
    Select {
        /// Selected columns.
        columns: Vec<String>,
        /// Requested count mode.
        count: Option<CountMode>,
    },
    /// `order(field, ascending)`
    Order {
        /// Sort column.
        field: String,
        /// Ascending when true.
        ascending: bool,
    },
    /// `match_all(filter)`
    Match(Filter),
    /// `range(from, to)`
    Range {
        /// First row, inclusive.
        from: u64,
        /// Last row, inclusive.
        to: u64,
    },
    /// `gte`, `lte`, `neq`, `is` or `is_not`
    Compare {
        /// Column compared.
        field: String,
        /// Comparison applied.
        operator: FilterOperator,
        /// Right-hand value.
        value: Value,
    },
    /// `in_list(field, values)`
    In {
        /// Column tested.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// `or(expression)`
    Or(String),
}

impl QueryCall {
    /// Short name of the builder method.
    pub fn name(&self) -> &'static str {
        match self {
            QueryCall::Select { .. } => "select",
            QueryCall::Order { .. } => "order",
            QueryCall::Match(_) => "match",
            QueryCall::Range { .. } => "range",
            QueryCall::Compare { operator, .. } => match operator {
                FilterOperator::Eq => "eq",
                FilterOperator::Gte => "gte",
                FilterOperator::Lte => "lte",
                FilterOperator::Neq => "neq",
                FilterOperator::Is => "is",
                FilterOperator::IsNot => "is_not",
            },
            QueryCall::In { .. } => "in",
            QueryCall::Or(_) => "or",
        }
    }
}

/// An executed read query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    /// The table queried.
    pub table: String,
    /// Builder calls in the order they were made.
    pub calls: Vec<QueryCall>,
}

impl RecordedQuery {
    /// Builder method names in call order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.iter().map(QueryCall::name).collect()
    }

    /// The OR expressions in call order.
    pub fn or_expressions(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                QueryCall::Or(expr) => Some(expr.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    log: Mutex<Vec<RecordedQuery>>,
    pending_failure: Mutex<Option<BackendError>>,
}

/// A [`RemoteClient`] over in-memory tables.
///
/// Clones share the same tables and query log.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    state: Arc<MemoryState>,
    id_field: String,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// Creates a client with no tables.
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState::default()),
            id_field: "id".to_string(),
        }
    }

    /// Sets the column filled in by [`insert`](RemoteClient::insert) when a
    /// record has no identifier.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Replaces the rows of `table`, creating it if needed.
    pub fn seed(&self, table: impl Into<String>, rows: Vec<Value>) {
        self.state.tables.write().insert(table.into(), rows);
    }

    /// Loads tables from a JSON object mapping table names to row arrays.
    pub fn load_json(&self, document: Value) -> BackendResult<()> {
        let Value::Object(tables) = document else {
            return Err(BackendError::SerializationError {
                message: "expected an object mapping table names to row arrays".to_string(),
            });
        };

        for (table, rows) in tables {
            match rows {
                Value::Array(rows) => self.seed(table, rows),
                _ => {
                    return Err(BackendError::SerializationError {
                        message: format!("table '{}' must be an array of rows", table),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns a copy of the rows of `table`.
    pub fn rows(&self, table: &str) -> Option<Vec<Value>> {
        self.state.tables.read().get(table).cloned()
    }

    /// Returns every executed read query, oldest first.
    pub fn query_log(&self) -> Vec<RecordedQuery> {
        self.state.log.lock().clone()
    }

    /// Clears the query log.
    pub fn clear_log(&self) {
        self.state.log.lock().clear();
    }

    /// Makes the next query or mutation fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        *self.state.pending_failure.lock() = Some(error);
    }

    fn take_failure(&self) -> BackendResult<()> {
        take_failure(&self.state)
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Vec<Value>) -> BackendResult<T>,
    ) -> BackendResult<T> {
        self.take_failure()?;
        let mut tables = self.state.tables.write();
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        f(rows)
    }
}

#[async_trait]
impl RemoteClient for MemoryClient {
    type Query = MemoryQuery;

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn from_table(&self, table: &str) -> MemoryQuery {
        MemoryQuery {
            state: Arc::clone(&self.state),
            table: table.to_string(),
            calls: Vec::new(),
        }
    }

    async fn insert(&self, table: &str, record: Value) -> BackendResult<Vec<Value>> {
        let Value::Object(mut record) = record else {
            return Err(BackendError::query("insert expects a JSON object"));
        };

        self.with_table(table, |rows| {
            if record.get(&self.id_field).is_none_or(Value::is_null) {
                record.insert(self.id_field.clone(), next_id(rows, &self.id_field));
            }
            let row = Value::Object(record);
            rows.push(row.clone());
            tracing::debug!(table = %table, "Inserted row");
            Ok(vec![row])
        })
    }

    async fn update(
        &self,
        table: &str,
        target: &RowFilter,
        patch: Value,
    ) -> BackendResult<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(BackendError::query("update expects a JSON object"));
        };

        self.with_table(table, |rows| {
            let mut updated = Vec::new();
            for row in rows.iter_mut().filter(|row| targets(row, target)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
            tracing::debug!(table = %table, rows = updated.len(), "Updated rows");
            Ok(updated)
        })
    }

    async fn delete(&self, table: &str, target: &RowFilter) -> BackendResult<Vec<Value>> {
        self.with_table(table, |rows| {
            let (deleted, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|row| targets(row, target));
            *rows = kept;
            tracing::debug!(table = %table, rows = deleted.len(), "Deleted rows");
            Ok(deleted)
        })
    }
}

/// A read query against a [`MemoryClient`] table.
#[derive(Debug)]
pub struct MemoryQuery {
    state: Arc<MemoryState>,
    table: String,
    calls: Vec<QueryCall>,
}

impl MemoryQuery {
    /// Builder calls made so far.
    pub fn calls(&self) -> &[QueryCall] {
        &self.calls
    }

    fn compare(&mut self, field: &str, operator: FilterOperator, value: &Value) {
        self.calls.push(QueryCall::Compare {
            field: field.to_string(),
            operator,
            value: value.clone(),
        });
    }

    fn run(&self) -> BackendResult<QueryResponse> {
        let predicates = self
            .calls
            .iter()
            .filter_map(RowPredicate::from_call)
            .collect::<BackendResult<Vec<_>>>()?;

        let tables = self.state.tables.read();
        let rows = tables
            .get(&self.table)
            .ok_or_else(|| missing_table(&self.table))?;

        let mut columns: Option<&[String]> = None;
        let mut count_mode = None;
        let mut range = None;
        let mut orders = Vec::new();
        for call in &self.calls {
            match call {
                QueryCall::Select { columns: c, count } => {
                    columns = Some(c.as_slice());
                    count_mode = *count;
                }
                QueryCall::Order { field, ascending } => orders.push((field.as_str(), *ascending)),
                QueryCall::Range { from, to } => range = Some((*from, *to)),
                _ => {}
            }
        }

        if let Some(columns) = columns {
            check_columns(&self.table, rows, columns)?;
        }

        let mut matched: Vec<&Value> = rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .collect();
        let count = count_mode.map(|_| matched.len() as u64);

        matched.sort_by(|a, b| {
            orders
                .iter()
                .map(|(field, ascending)| eval::order_rows(a, b, field, *ascending))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let page = match range {
            Some((from, to)) => {
                let skip = usize::try_from(from).unwrap_or(usize::MAX);
                let take = usize::try_from(to.saturating_sub(from).saturating_add(1))
                    .unwrap_or(usize::MAX);
                matched.into_iter().skip(skip).take(take).collect()
            }
            None => matched,
        };

        let data = page
            .into_iter()
            .map(|row| project(row, columns))
            .collect();
        Ok(QueryResponse::new(data, count))
    }
}

#[async_trait]
impl RemoteQueryBuilder for MemoryQuery {
    fn select(&mut self, columns: &[String], count: Option<CountMode>) {
        self.calls.push(QueryCall::Select {
            columns: columns.to_vec(),
            count,
        });
    }

    fn order(&mut self, field: &str, ascending: bool) {
        self.calls.push(QueryCall::Order {
            field: field.to_string(),
            ascending,
        });
    }

    fn match_all(&mut self, filter: &Filter) {
        self.calls.push(QueryCall::Match(filter.clone()));
    }

    fn range(&mut self, from: u64, to: u64) {
        self.calls.push(QueryCall::Range { from, to });
    }

    fn gte(&mut self, field: &str, value: &Value) {
        self.compare(field, FilterOperator::Gte, value);
    }

    fn lte(&mut self, field: &str, value: &Value) {
        self.compare(field, FilterOperator::Lte, value);
    }

    fn neq(&mut self, field: &str, value: &Value) {
        self.compare(field, FilterOperator::Neq, value);
    }

    fn is(&mut self, field: &str, value: &Value) {
        self.compare(field, FilterOperator::Is, value);
    }

    fn is_not(&mut self, field: &str, value: &Value) {
        self.compare(field, FilterOperator::IsNot, value);
    }

    fn in_list(&mut self, field: &str, values: &[Value]) {
        self.calls.push(QueryCall::In {
            field: field.to_string(),
            values: values.to_vec(),
        });
    }

    fn or(&mut self, expression: &str) {
        self.calls.push(QueryCall::Or(expression.to_string()));
    }

    async fn execute(&mut self) -> BackendResult<QueryResponse> {
        self.state.log.lock().push(RecordedQuery {
            table: self.table.clone(),
            calls: self.calls.clone(),
        });
        take_failure(&self.state)?;

        let response = self.run()?;
        tracing::trace!(
            table = %self.table,
            rows = response.data.as_ref().map_or(0, Vec::len),
            count = ?response.count,
            "Executed memory query"
        );
        Ok(response)
    }
}

/// A row condition compiled from one builder call.
enum RowPredicate<'a> {
    Match(&'a Filter),
    Compare {
        field: &'a str,
        operator: FilterOperator,
        value: &'a Value,
    },
    In {
        field: &'a str,
        values: &'a [Value],
    },
    Expr(LogicExpr),
}

impl<'a> RowPredicate<'a> {
    fn from_call(call: &'a QueryCall) -> Option<BackendResult<Self>> {
        let predicate = match call {
            QueryCall::Match(filter) => RowPredicate::Match(filter),
            QueryCall::Compare {
                field,
                operator,
                value,
            } => RowPredicate::Compare {
                field: field.as_str(),
                operator: *operator,
                value,
            },
            QueryCall::In { field, values } => RowPredicate::In {
                field: field.as_str(),
                values: values.as_slice(),
            },
            QueryCall::Or(expression) => {
                return Some(
                    LogicExpr::parse_or_group(expression)
                        .map(RowPredicate::Expr)
                        .map_err(|e| BackendError::InvalidFilterExpression {
                            expression: expression.clone(),
                            message: e.to_string(),
                        }),
                );
            }
            QueryCall::Select { .. } | QueryCall::Order { .. } | QueryCall::Range { .. } => {
                return None;
            }
        };
        Some(Ok(predicate))
    }

    fn matches(&self, row: &Value) -> bool {
        match self {
            RowPredicate::Match(filter) => matches_all(row, filter),
            RowPredicate::Compare {
                field,
                operator,
                value,
            } => {
                let column = eval::column(row, field);
                match operator {
                    FilterOperator::Eq => eval::equals(column, value),
                    FilterOperator::Gte => eval::compare_with(column, value, |o| o.is_ge()),
                    FilterOperator::Lte => eval::compare_with(column, value, |o| o.is_le()),
                    FilterOperator::Neq => eval::not_equals(column, value),
                    FilterOperator::Is => eval::is_identity(column, value),
                    FilterOperator::IsNot => !eval::is_identity(column, value),
                }
            }
            RowPredicate::In { field, values } => {
                let column = eval::column(row, field);
                values.iter().any(|v| eval::equals(column, v))
            }
            RowPredicate::Expr(expr) => eval::eval_expr(row, expr),
        }
    }
}

fn matches_all(row: &Value, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, value)| eval::equals(eval::column(row, field), value))
}

fn targets(row: &Value, target: &RowFilter) -> bool {
    match target {
        RowFilter::Match(filter) => matches_all(row, filter),
        RowFilter::In { field, values } => {
            let column = eval::column(row, field);
            values.iter().any(|v| eval::equals(column, v))
        }
    }
}

/// Rejects selected columns that appear in no row of a non-empty table.
fn check_columns(table: &str, rows: &[Value], columns: &[String]) -> BackendResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let known: BTreeSet<&str> = rows
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    match columns
        .iter()
        .find(|c| c.as_str() != "*" && !known.contains(c.as_str()))
    {
        Some(unknown) => Err(BackendError::Query {
            code: Some("42703".to_string()),
            message: format!("column {}.{} does not exist", table, unknown),
            details: None,
            hint: None,
        }),
        None => Ok(()),
    }
}

fn project(row: &Value, columns: Option<&[String]>) -> Value {
    match columns {
        Some(columns) if !columns.is_empty() && !columns.iter().any(|c| c == "*") => {
            let projected = columns
                .iter()
                .map(|c| (c.clone(), eval::column(row, c).clone()))
                .collect();
            Value::Object(projected)
        }
        _ => row.clone(),
    }
}

fn next_id(rows: &[Value], id_field: &str) -> Value {
    let max = rows
        .iter()
        .filter_map(|row| row.get(id_field).and_then(Value::as_i64))
        .max()
        .unwrap_or(0);
    Value::from(max + 1)
}

fn missing_table(table: &str) -> BackendError {
    BackendError::Query {
        code: Some("42P01".to_string()),
        message: format!("relation \"public.{}\" does not exist", table),
        details: None,
        hint: None,
    }
}

fn take_failure(state: &MemoryState) -> BackendResult<()> {
    match state.pending_failure.lock().take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
