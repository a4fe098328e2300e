//! PostgREST response decoding.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{BackendError, BackendResult};
use crate::query::QueryResponse;

/// A raw HTTP response from PostgREST.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgrestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw body text.
    pub body: String,
}

impl PostgrestResponse {
    /// Creates a response without headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A parsed `Content-Range` header such as `0-9/42` or `*/0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// Returned row span, absent for `*`.
    pub range: Option<(u64, u64)>,
    /// Total row count, absent for `*`.
    pub total: Option<u64>,
}

impl FromStr for ContentRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Some proxies keep the unit prefix
        let s = s.trim();
        let s = s.strip_prefix("items ").unwrap_or(s);

        let (span, total) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid content range: {}", s))?;

        let range = match span {
            "*" => None,
            span => {
                let (from, to) = span
                    .split_once('-')
                    .ok_or_else(|| format!("invalid content range: {}", s))?;
                Some((parse_bound(from, s)?, parse_bound(to, s)?))
            }
        };
        let total = match total {
            "*" => None,
            total => Some(parse_bound(total, s)?),
        };

        Ok(ContentRange { range, total })
    }
}

fn parse_bound(value: &str, header: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("invalid content range: {}", header))
}

/// The JSON error body PostgREST sends with 4xx/5xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostgrestErrorBody {
    /// PostgreSQL SQLSTATE or PostgREST `PGRST` code.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Additional detail.
    #[serde(default)]
    pub details: Option<String>,
    /// Suggested fix.
    #[serde(default)]
    pub hint: Option<String>,
}

impl From<PostgrestErrorBody> for BackendError {
    fn from(body: PostgrestErrorBody) -> Self {
        BackendError::Query {
            code: body.code,
            message: body.message,
            details: body.details,
            hint: body.hint,
        }
    }
}

/// Converts an error response into a [`BackendError`].
pub fn decode_error(response: &PostgrestResponse) -> BackendError {
    match serde_json::from_str::<PostgrestErrorBody>(&response.body) {
        Ok(body) if !body.message.is_empty() => body.into(),
        _ => {
            let body = response.body.trim();
            BackendError::Query {
                code: Some(response.status.to_string()),
                message: if body.is_empty() {
                    format!("HTTP {}", response.status)
                } else {
                    body.to_string()
                },
                details: None,
                hint: None,
            }
        }
    }
}

/// Decodes the rows and count of a read response.
pub fn decode_rows(response: &PostgrestResponse) -> BackendResult<QueryResponse> {
    if !response.is_success() {
        return Err(decode_error(response));
    }

    let count = match response.header("Content-Range") {
        Some(header) => header
            .parse::<ContentRange>()
            .map_err(|message| BackendError::SerializationError { message })?
            .total,
        None => None,
    };

    Ok(QueryResponse {
        data: decode_body(&response.body)?,
        count,
    })
}

/// Decodes the rows returned by a mutation with `return=representation`.
pub fn decode_mutation(response: &PostgrestResponse) -> BackendResult<Vec<Value>> {
    if !response.is_success() {
        return Err(decode_error(response));
    }
    Ok(decode_body(&response.body)?.unwrap_or_default())
}

fn decode_body(body: &str) -> BackendResult<Option<Vec<Value>>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Array(rows) => Ok(Some(rows)),
        Value::Null => Ok(None),
        row @ Value::Object(_) => Ok(Some(vec![row])),
        other => Err(BackendError::SerializationError {
            message: format!("expected an array of rows, found {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(
            "0-9/42".parse::<ContentRange>().unwrap(),
            ContentRange {
                range: Some((0, 9)),
                total: Some(42)
            }
        );
        assert_eq!(
            "*/0".parse::<ContentRange>().unwrap(),
            ContentRange {
                range: None,
                total: Some(0)
            }
        );
        assert_eq!("5-9/*".parse::<ContentRange>().unwrap().total, None);
        assert_eq!(
            "items 0-1/2".parse::<ContentRange>().unwrap().range,
            Some((0, 1))
        );
        assert!("0-9".parse::<ContentRange>().is_err());
        assert!("a-b/3".parse::<ContentRange>().is_err());
    }

    #[test]
    fn test_decode_rows_with_count() {
        let response = PostgrestResponse::new(206, r#"[{"id": 6}, {"id": 7}]"#)
            .with_header("content-range", "5-6/7");
        let decoded = decode_rows(&response).unwrap();
        assert_eq!(decoded.data, Some(vec![json!({"id": 6}), json!({"id": 7})]));
        assert_eq!(decoded.count, Some(7));
    }

    #[test]
    fn test_decode_rows_empty_body() {
        let decoded = decode_rows(&PostgrestResponse::new(200, "")).unwrap();
        assert_eq!(decoded, QueryResponse::default());
    }

    #[test]
    fn test_decode_error_body() {
        let response = PostgrestResponse::new(
            400,
            r#"{"code":"42703","message":"column people.nope does not exist","details":null,"hint":"Perhaps you meant people.name"}"#,
        );
        assert_eq!(
            decode_rows(&response).unwrap_err(),
            BackendError::Query {
                code: Some("42703".to_string()),
                message: "column people.nope does not exist".to_string(),
                details: None,
                hint: Some("Perhaps you meant people.name".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_error_plain_text() {
        let err = decode_mutation(&PostgrestResponse::new(502, "Bad Gateway")).unwrap_err();
        assert_eq!(err.to_string(), "query failed: Bad Gateway");

        let err = decode_mutation(&PostgrestResponse::new(500, "")).unwrap_err();
        assert_eq!(err.to_string(), "query failed: HTTP 500");
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_rows(&PostgrestResponse::new(200, "[{")).unwrap_err();
        assert!(matches!(err, BackendError::SerializationError { .. }));

        let err = decode_rows(&PostgrestResponse::new(200, "42")).unwrap_err();
        assert!(matches!(err, BackendError::SerializationError { .. }));
    }
}
