//! PostgREST client over a pluggable transport.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{BackendError, BackendResult};
use crate::query::{
    FilterOperator, QueryPlan, QueryResponse, RemoteClient, RemoteQueryBuilder, RowFilter,
    apply_plan,
};
use crate::types::{CountMode, Filter};

use super::request::{HttpMethod, PostgrestRequest};
use super::response::{PostgrestResponse, decode_mutation, decode_rows};

/// Sends encoded requests to a PostgREST server.
///
/// Implementations own the HTTP stack, base URL and authentication headers.
#[async_trait]
pub trait PostgrestTransport: Send + Sync {
    /// Sends one request and returns the raw response.
    async fn send(&self, request: PostgrestRequest) -> BackendResult<PostgrestResponse>;
}

/// A [`RemoteClient`] that encodes builder calls as PostgREST requests.
#[derive(Clone)]
pub struct PostgrestClient {
    transport: Arc<dyn PostgrestTransport>,
    schema: Option<String>,
}

impl PostgrestClient {
    /// Creates a client sending through `transport`.
    pub fn new(transport: Arc<dyn PostgrestTransport>) -> Self {
        Self {
            transport,
            schema: None,
        }
    }

    /// Targets a schema other than the server default.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    fn request(&self, method: HttpMethod, table: &str) -> PostgrestRequest {
        let mut request = PostgrestRequest::new(method, table);
        if let Some(schema) = &self.schema {
            let header = match method {
                HttpMethod::Get => "Accept-Profile",
                _ => "Content-Profile",
            };
            request.set_header(header, schema.clone());
        }
        request
    }

    fn mutation(&self, method: HttpMethod, table: &str) -> PostgrestRequest {
        let mut request = self.request(method, table);
        request.add_preference("return=representation");
        request
    }

    async fn send_mutation(&self, request: PostgrestRequest) -> BackendResult<Vec<Value>> {
        let method = request.method;
        let response = self.transport.send(request).await?;
        let rows = decode_mutation(&response)?;
        tracing::debug!(method = %method, rows = rows.len(), "PostgREST mutation completed");
        Ok(rows)
    }
}

#[async_trait]
impl RemoteClient for PostgrestClient {
    type Query = PostgrestQuery;

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }

    fn from_table(&self, table: &str) -> PostgrestQuery {
        PostgrestQuery {
            transport: Some(Arc::clone(&self.transport)),
            request: self.request(HttpMethod::Get, table),
        }
    }

    async fn insert(&self, table: &str, record: Value) -> BackendResult<Vec<Value>> {
        let mut request = self.mutation(HttpMethod::Post, table).with_body(record);
        request.set_header("Content-Type", "application/json");
        self.send_mutation(request).await
    }

    async fn update(
        &self,
        table: &str,
        target: &RowFilter,
        patch: Value,
    ) -> BackendResult<Vec<Value>> {
        let mut request = self.mutation(HttpMethod::Patch, table).with_body(patch);
        request.set_header("Content-Type", "application/json");
        request.push_row_filter(target);
        self.send_mutation(request).await
    }

    async fn delete(&self, table: &str, target: &RowFilter) -> BackendResult<Vec<Value>> {
        let mut request = self.mutation(HttpMethod::Delete, table);
        request.push_row_filter(target);
        self.send_mutation(request).await
    }
}

/// A read query being encoded as a PostgREST `GET` request.
pub struct PostgrestQuery {
    transport: Option<Arc<dyn PostgrestTransport>>,
    request: PostgrestRequest,
}

impl PostgrestQuery {
    /// Creates a query with no transport, for rendering only.
    pub fn detached(table: impl Into<String>) -> Self {
        Self {
            transport: None,
            request: PostgrestRequest::new(HttpMethod::Get, table),
        }
    }

    /// Returns the request encoded so far.
    pub fn request(&self) -> &PostgrestRequest {
        &self.request
    }

    /// Consumes the query and returns the encoded request.
    pub fn into_request(self) -> PostgrestRequest {
        self.request
    }
}

/// Renders a compiled plan as the PostgREST request it would send.
pub fn render_plan(plan: &QueryPlan) -> PostgrestRequest {
    let mut query = PostgrestQuery::detached(plan.resource.clone());
    apply_plan(plan, &mut query);
    query.into_request()
}

#[async_trait]
impl RemoteQueryBuilder for PostgrestQuery {
    fn select(&mut self, columns: &[String], count: Option<CountMode>) {
        self.request.push_select(columns, count);
    }

    fn order(&mut self, field: &str, ascending: bool) {
        self.request.push_order(field, ascending);
    }

    fn match_all(&mut self, filter: &Filter) {
        self.request.push_match(filter);
    }

    fn range(&mut self, from: u64, to: u64) {
        self.request.push_range(from, to);
    }

    fn gte(&mut self, field: &str, value: &Value) {
        self.request.push_condition(field, FilterOperator::Gte.postgrest_token(), value);
    }

    fn lte(&mut self, field: &str, value: &Value) {
        self.request.push_condition(field, FilterOperator::Lte.postgrest_token(), value);
    }

    fn neq(&mut self, field: &str, value: &Value) {
        self.request.push_condition(field, FilterOperator::Neq.postgrest_token(), value);
    }

    fn is(&mut self, field: &str, value: &Value) {
        self.request.push_identity(field, FilterOperator::Is.postgrest_token(), value);
    }

    fn is_not(&mut self, field: &str, value: &Value) {
        self.request.push_identity(field, FilterOperator::IsNot.postgrest_token(), value);
    }

    fn in_list(&mut self, field: &str, values: &[Value]) {
        self.request.push_in(field, values);
    }

    fn or(&mut self, expression: &str) {
        self.request.push_param("or", format!("({})", expression));
    }

    async fn execute(&mut self) -> BackendResult<QueryResponse> {
        let transport = self.transport.as_ref().ok_or_else(|| BackendError::Transport {
            message: "query has no transport".to_string(),
        })?;

        tracing::trace!(path = %self.request.path_and_query(), "Sending PostgREST query");
        let response = transport.send(self.request.clone()).await?;
        decode_rows(&response)
    }
}
