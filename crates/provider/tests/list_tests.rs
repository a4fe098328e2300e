//! Integration tests for list requests through the data provider.
//!
//! These tests drive `DataProvider::get_list` against the in-memory backend
//! and inspect the recorded builder calls to check compilation order,
//! pagination, search and error propagation end to end.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use tabula_provider::backends::memory::{MemoryClient, QueryCall};
use tabula_provider::error::{BackendResult, ProviderError};
use tabula_provider::query::{
    FilterOperator, QueryPlan, QueryResponse, RemoteClient, RemoteQueryBuilder, RowFilter,
};
use tabula_provider::types::{
    CountMode, Filter, ListParams, ListResult, ReferenceParams, ResourceConfig, ResourcesConfig,
    Sort,
};
use tabula_provider::{
    BackendError, ConfigurationError, DataProvider, ProviderConfig, QueryObserver, RequestError,
};

fn people_rows() -> Vec<Value> {
    (1..=20)
        .map(|i| {
            let name = if i % 2 == 0 {
                format!("Anna Smith {}", i)
            } else {
                format!("Bob Jones {}", i)
            };
            let status = if i % 5 == 0 { "inactive" } else { "active" };
            let deleted_at = if i == 7 { Value::Null } else { json!("2024-01-01") };
            json!({
                "id": i,
                "name": name,
                "age": 10 + i * 3,
                "status": status,
                "deleted_at": deleted_at,
            })
        })
        .collect()
}

fn resources() -> ResourcesConfig {
    ResourcesConfig::new()
        .with_resource(
            "people",
            ResourceConfig::with_search(
                ["id", "age_gte", "age_lte", "status", "name"],
                ["name"],
            ),
        )
        .with_resource("notes", ResourceConfig::fields(["id", "body", "person_id"]))
        .with_resource("tags", ResourceConfig::with_search(["id", "label"], Vec::<String>::new()))
}

fn provider() -> DataProvider<MemoryClient> {
    let client = MemoryClient::new();
    client.seed("people", people_rows());
    client.seed(
        "notes",
        vec![
            json!({"id": 1, "body": "first", "person_id": 2}),
            json!({"id": 2, "body": "second", "person_id": 4}),
            json!({"id": 3, "body": "third", "person_id": 2}),
        ],
    );
    client.seed("tags", vec![json!({"id": 1, "label": "vip"})]);
    DataProvider::new(client, resources(), ProviderConfig::default())
}

fn ids(result: &ListResult) -> Vec<i64> {
    result
        .data
        .iter()
        .filter_map(|row| row["id"].as_i64())
        .collect()
}

fn filter(value: Value) -> Filter {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// Compilation Order Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_call_sequence() {
    let provider = provider();
    let params = ListParams::new(2, 5)
        .with_sort(Sort::asc("id"))
        .with_filter("status", "active")
        .with_filter("age_gte", 18)
        .with_filter("age_lte", 65)
        .with_filter("q", "smith");

    let result = provider.get_list("people", params).await.unwrap();

    let log = provider.client().query_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].table, "people");
    assert_eq!(
        log[0].calls,
        vec![
            QueryCall::Select {
                columns: vec![
                    "id".to_string(),
                    "age".to_string(),
                    "status".to_string(),
                    "name".to_string()
                ],
                count: Some(CountMode::Exact),
            },
            QueryCall::Order {
                field: "id".to_string(),
                ascending: true,
            },
            QueryCall::Match(filter(json!({"status": "active"}))),
            QueryCall::Range { from: 5, to: 9 },
            QueryCall::Compare {
                field: "age".to_string(),
                operator: FilterOperator::Gte,
                value: json!(18),
            },
            QueryCall::Compare {
                field: "age".to_string(),
                operator: FilterOperator::Lte,
                value: json!(65),
            },
            QueryCall::Or("name.ilike.%smith%".to_string()),
        ]
    );

    // Even ids are Smiths; 10 is inactive; ages 18..=65 keep ids 3..=18
    assert_eq!(result.total, 7);
    assert_eq!(ids(&result), vec![16, 18]);
}

#[tokio::test]
async fn test_custom_filter_applied_before_search() {
    let provider = provider();
    let params = ListParams::new(1, 50)
        .with_filter("q", "anna")
        .with_filter("customFilterQuery", "age.lt.20,age.gt.60");

    let result = provider.get_list("people", params).await.unwrap();

    let log = provider.client().query_log();
    assert_eq!(
        log[0].or_expressions(),
        vec!["age.lt.20,age.gt.60", "name.ilike.%anna%"]
    );
    assert_eq!(
        log[0].call_names(),
        vec!["select", "order", "match", "range", "or", "or"]
    );

    // Both groups must hold: even ids with age < 20 or > 60
    assert_eq!(ids(&result), vec![2, 18, 20]);
    assert_eq!(result.total, 3);
}

#[tokio::test]
async fn test_is_not_suffix_takes_precedence() {
    let provider = provider();
    let params = ListParams::new(1, 50).with_filter("deleted_at_is_not", Value::Null);

    let result = provider.get_list("people", params).await.unwrap();

    let log = provider.client().query_log();
    assert_eq!(
        log[0].calls[4],
        QueryCall::Compare {
            field: "deleted_at".to_string(),
            operator: FilterOperator::IsNot,
            value: Value::Null,
        }
    );
    assert_eq!(result.total, 19);
    assert!(!ids(&result).contains(&7));
}

#[tokio::test]
async fn test_is_suffix() {
    let provider = provider();
    let params = ListParams::new(1, 50).with_filter("deleted_at_is", Value::Null);

    let result = provider.get_list("people", params).await.unwrap();
    assert_eq!(ids(&result), vec![7]);
}

#[tokio::test]
async fn test_neq_suffix() {
    let provider = provider();
    let params = ListParams::new(1, 50).with_filter("status_neq", "active");

    let result = provider.get_list("people", params).await.unwrap();
    assert_eq!(ids(&result), vec![5, 10, 15, 20]);
}

#[tokio::test]
async fn test_sort_descending() {
    let provider = provider();
    let params = ListParams::new(1, 3).with_sort(Sort::desc("age"));

    let result = provider.get_list("people", params).await.unwrap();
    assert_eq!(ids(&result), vec![20, 19, 18]);
    assert_eq!(result.total, 20);
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_consecutive_pages_do_not_overlap() {
    let provider = provider();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let result = provider
            .get_list("people", ListParams::new(page, 7))
            .await
            .unwrap();
        assert_eq!(result.total, 20);
        seen.extend(ids(&result));
    }

    let unique: HashSet<i64> = seen.iter().copied().collect();
    assert_eq!(seen.len(), 20);
    assert_eq!(unique.len(), 20);
    assert_eq!(seen, (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_page_size_is_inclusive() {
    let provider = provider();

    let result = provider
        .get_list("people", ListParams::new(1, 10))
        .await
        .unwrap();
    assert_eq!(result.data.len(), 10);

    let log = provider.client().query_log();
    assert_eq!(log[0].calls[3], QueryCall::Range { from: 0, to: 9 });
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let provider = provider();
    let result = provider
        .get_list("people", ListParams::new(5, 10))
        .await
        .unwrap();
    assert!(result.data.is_empty());
    assert_eq!(result.total, 20);
}

#[tokio::test]
async fn test_zero_page_is_rejected_before_querying() {
    let provider = provider();
    let err = provider
        .get_list("people", ListParams::new(0, 10))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProviderError::Request(RequestError::InvalidPagination { page: 0, .. })
    ));
    assert!(provider.client().query_log().is_empty());
}

#[tokio::test]
async fn test_max_page_size() {
    let client = MemoryClient::new();
    client.seed("people", people_rows());
    let config = ProviderConfig {
        max_per_page: Some(10),
        ..Default::default()
    };
    let provider = DataProvider::new(client, resources(), config);

    let err = provider
        .get_list("people", ListParams::new(1, 11))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Request(RequestError::PageTooLarge {
            per_page: 11,
            max: 10
        })
    ));
}

// ============================================================================
// Search Tests
// ============================================================================

#[tokio::test]
async fn test_search_uses_select_fields_for_flat_config() {
    let provider = provider();
    let params = ListParams::new(1, 10).with_filter("q", "second");

    let result = provider.get_list("notes", params).await.unwrap();

    let log = provider.client().query_log();
    assert_eq!(
        log[0].or_expressions(),
        vec!["id.ilike.%second%,body.ilike.%second%,person_id.ilike.%second%"]
    );
    assert_eq!(ids(&result), vec![2]);
}

#[tokio::test]
async fn test_search_without_search_fields_is_reported() {
    let provider = provider();
    let params = ListParams::new(1, 10).with_filter("q", "vip");

    let err = provider.get_list("tags", params).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Configuration(ConfigurationError::MissingSearchFields { .. })
    ));
    assert!(provider.client().query_log().is_empty());
}

#[tokio::test]
async fn test_empty_search_term_is_ignored() {
    let provider = provider();
    let params = ListParams::new(1, 10).with_filter("q", "");

    provider.get_list("tags", params).await.unwrap();

    let log = provider.client().query_log();
    assert!(log[0].or_expressions().is_empty());
}

// ============================================================================
// Result Normalization and Error Tests
// ============================================================================

/// A backend that answers every query with neither rows nor a count.
struct SilentClient;

struct SilentQuery;

#[async_trait]
impl RemoteQueryBuilder for SilentQuery {
    fn select(&mut self, _columns: &[String], _count: Option<CountMode>) {}
    fn order(&mut self, _field: &str, _ascending: bool) {}
    fn match_all(&mut self, _filter: &Filter) {}
    fn range(&mut self, _from: u64, _to: u64) {}
    fn gte(&mut self, _field: &str, _value: &Value) {}
    fn lte(&mut self, _field: &str, _value: &Value) {}
    fn neq(&mut self, _field: &str, _value: &Value) {}
    fn is(&mut self, _field: &str, _value: &Value) {}
    fn is_not(&mut self, _field: &str, _value: &Value) {}
    fn in_list(&mut self, _field: &str, _values: &[Value]) {}
    fn or(&mut self, _expression: &str) {}

    async fn execute(&mut self) -> BackendResult<QueryResponse> {
        Ok(QueryResponse::default())
    }
}

#[async_trait]
impl RemoteClient for SilentClient {
    type Query = SilentQuery;

    fn backend_name(&self) -> &'static str {
        "silent"
    }

    fn from_table(&self, _table: &str) -> SilentQuery {
        SilentQuery
    }

    async fn insert(&self, _table: &str, _record: Value) -> BackendResult<Vec<Value>> {
        Ok(vec![])
    }

    async fn update(
        &self,
        _table: &str,
        _target: &RowFilter,
        _patch: Value,
    ) -> BackendResult<Vec<Value>> {
        Ok(vec![])
    }

    async fn delete(&self, _table: &str, _target: &RowFilter) -> BackendResult<Vec<Value>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_missing_rows_and_count_normalize_to_empty() {
    let provider = DataProvider::new(SilentClient, resources(), ProviderConfig::default());
    let result = provider
        .get_list("people", ListParams::new(1, 10))
        .await
        .unwrap();
    assert_eq!(result, ListResult::new(vec![], 0));
}

#[tokio::test]
async fn test_backend_error_propagates_unchanged() {
    let provider = provider();
    let backend_error = BackendError::Query {
        code: Some("57014".to_string()),
        message: "canceling statement due to statement timeout".to_string(),
        details: None,
        hint: None,
    };
    provider.client().fail_next(backend_error.clone());

    let err = provider
        .get_list("people", ListParams::new(1, 10))
        .await
        .unwrap_err();

    match err {
        ProviderError::Backend(e) => assert_eq!(e, backend_error),
        other => panic!("expected backend error, got {:?}", other),
    }
    assert_eq!(provider.client().query_log().len(), 1);
}

#[tokio::test]
async fn test_invalid_custom_filter_reported_by_backend() {
    let provider = provider();
    let params = ListParams::new(1, 10).with_filter("customFilterQuery", "age.between.1");

    let err = provider.get_list("people", params).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Backend(BackendError::InvalidFilterExpression { .. })
    ));
}

#[tokio::test]
async fn test_unknown_resource() {
    let provider = provider();
    let err = provider
        .get_list("invoices", ListParams::new(1, 10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Configuration(ConfigurationError::UnknownResource { .. })
    ));
}

// ============================================================================
// Reference Lists and Observer Tests
// ============================================================================

#[tokio::test]
async fn test_get_many_reference() {
    let provider = provider();
    let params = ReferenceParams::new("person_id", 2, ListParams::new(1, 10));

    let result = provider.get_many_reference("notes", params).await.unwrap();

    assert_eq!(ids(&result), vec![1, 3]);
    assert_eq!(result.total, 2);
    let log = provider.client().query_log();
    assert_eq!(log[0].calls[2], QueryCall::Match(filter(json!({"person_id": 2}))));
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl QueryObserver for RecordingObserver {
    fn plan_compiled(&self, plan: &QueryPlan) {
        self.events
            .lock()
            .push(format!("compiled {} {:?}", plan.resource, plan.or_groups()));
    }

    fn query_completed(&self, plan: &QueryPlan, outcome: Result<&ListResult, &ProviderError>) {
        let event = match outcome {
            Ok(result) => format!("completed {} {}", plan.resource, result.total),
            Err(_) => format!("failed {}", plan.resource),
        };
        self.events.lock().push(event);
    }
}

#[tokio::test]
async fn test_observer_receives_plans_when_enabled() {
    let client = MemoryClient::new();
    client.seed("people", people_rows());
    let observer = Arc::new(RecordingObserver::default());
    let provider = DataProvider::new(
        client,
        resources(),
        ProviderConfig::default().with_log_queries(true),
    )
    .with_observer(observer.clone());

    provider
        .get_list("people", ListParams::new(1, 5).with_filter("q", "jones"))
        .await
        .unwrap();
    provider.client().fail_next(BackendError::Transport {
        message: "reset".to_string(),
    });
    let _ = provider.get_list("people", ListParams::new(1, 5)).await;

    assert_eq!(
        *observer.events.lock(),
        vec![
            r#"compiled people ["name.ilike.%jones%"]"#.to_string(),
            "completed people 10".to_string(),
            "compiled people []".to_string(),
            "failed people".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_observer_silent_when_disabled() {
    let observer = Arc::new(RecordingObserver::default());
    let provider = provider().with_observer(observer.clone());

    provider
        .get_list("people", ListParams::new(1, 5))
        .await
        .unwrap();

    assert!(observer.events.lock().is_empty());
}
