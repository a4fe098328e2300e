//! PostgREST request encoding.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::query::{FilterOperator, RowFilter, quote_value};
use crate::types::{CountMode, Filter};

/// HTTP methods used against PostgREST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read rows
    Get,
    /// Insert rows
    Post,
    /// Update rows
    Patch,
    /// Delete rows
    Delete,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An HTTP request addressed to a PostgREST table endpoint.
///
/// Query parameters keep their insertion order; the same name may repeat
/// (e.g. two conditions on `age`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostgrestRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Table name; the request path is `/{table}`.
    pub table: String,
    /// Query parameters, unencoded.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body for inserts and updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl PostgrestRequest {
    /// Creates a request without parameters.
    pub fn new(method: HttpMethod, table: impl Into<String>) -> Self {
        Self {
            method,
            table: table.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a query parameter.
    pub fn push_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    /// Sets a header, replacing an existing one with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Adds a `Prefer` preference, merging with existing preferences.
    pub fn add_preference(&mut self, preference: &str) {
        match self.header("Prefer") {
            Some(existing) if existing.split(',').any(|p| p.trim() == preference) => {}
            Some(existing) => {
                let merged = format!("{},{}", existing, preference);
                self.set_header("Prefer", merged);
            }
            None => self.set_header("Prefer", preference),
        }
    }

    /// Returns a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of a query parameter, in order.
    pub fn params(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns the URL-encoded query string.
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Returns the path and query, e.g. `/posts?select=id`.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            format!("/{}", self.table)
        } else {
            format!("/{}?{}", self.table, self.query_string())
        }
    }

    /// Returns the full URL against a base such as `https://host/rest/v1`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path_and_query())
    }

    pub(crate) fn push_select(&mut self, columns: &[String], count: Option<CountMode>) {
        let select = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        };
        self.query.retain(|(n, _)| n != "select");
        self.push_param("select", select);
        if let Some(mode) = count {
            self.add_preference(&format!("count={}", mode));
        }
    }

    pub(crate) fn push_order(&mut self, field: &str, ascending: bool) {
        let term = format!("{}.{}", field, if ascending { "asc" } else { "desc" });
        match self.query.iter_mut().find(|(n, _)| n == "order") {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&term);
            }
            None => self.push_param("order", term),
        }
    }

    pub(crate) fn push_range(&mut self, from: u64, to: u64) {
        self.set_header("Range-Unit", "items");
        self.set_header("Range", format!("{}-{}", from, to));
    }

    pub(crate) fn push_condition(&mut self, field: &str, operator: &str, value: &Value) {
        self.push_param(field, format!("{}.{}", operator, render_value(value)));
    }

    pub(crate) fn push_identity(&mut self, field: &str, operator: &str, value: &Value) {
        self.push_param(field, format!("{}.{}", operator, render_identity(value)));
    }

    pub(crate) fn push_in(&mut self, field: &str, values: &[Value]) {
        self.push_param(field, format!("in.({})", render_list(values)));
    }

    pub(crate) fn push_match(&mut self, filter: &Filter) {
        for (field, value) in filter {
            self.push_condition(field, FilterOperator::Eq.postgrest_token(), value);
        }
    }

    pub(crate) fn push_row_filter(&mut self, target: &RowFilter) {
        match target {
            RowFilter::Match(filter) => self.push_match(filter),
            RowFilter::In { field, values } => self.push_in(field, values),
        }
    }
}

/// Renders a filter value as PostgREST expects it in a parameter.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn render_identity(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_ascii_lowercase(),
        other => render_value(other),
    }
}

fn render_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| quote_value(&render_value(v)).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}
