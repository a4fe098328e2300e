//! Compiled list queries.

use serde::Serialize;

use crate::error::{ConfigurationError, ProviderResult};
use crate::types::{CountMode, Filter, ListParams, ResourceConfig, Sort};

use super::filter::{FilterClause, partition_filter, take_reserved};
use super::range::RowRange;
use super::search::TextSearch;

/// A list request compiled against a resource's field configuration.
///
/// Equality entries and operator clauses combine with AND. The raw
/// `customFilterQuery` and the free-text search each contribute their own OR
/// group on top of that conjunction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    /// The table queried.
    pub resource: String,
    /// Base columns to select.
    pub select: Vec<String>,
    /// How the total is counted.
    pub count: CountMode,
    /// Sort directive.
    pub sort: Sort,
    /// Exact-match entries.
    pub equality: Filter,
    /// Row range, inclusive.
    pub range: RowRange,
    /// Operator clauses, in filter order.
    pub clauses: Vec<FilterClause>,
    /// Raw OR expression passed through from `customFilterQuery`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_filter: Option<String>,
    /// Free-text OR group built from `q`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_search: Option<TextSearch>,
}

impl QueryPlan {
    /// Compiles list parameters for `resource`.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::EmptyFieldList` - the resource declares no fields
    /// * `ConfigurationError::MissingSearchFields` - `q` was supplied but the
    ///   resource has no (or an empty) `fullTextSearchFields`
    /// * `RequestError` - invalid pagination or reserved filter values
    pub fn compile(
        resource: &str,
        config: &ResourceConfig,
        params: &ListParams,
    ) -> ProviderResult<Self> {
        let fields = config.resolve();
        if fields.select.is_empty() {
            return Err(ConfigurationError::EmptyFieldList {
                resource: resource.to_string(),
            }
            .into());
        }

        let range = RowRange::from_pagination(&params.pagination)?;
        let (reserved, filter) = take_reserved(params.filter.clone())?;
        let partitioned = partition_filter(filter);

        let text_search = match reserved.search {
            Some(term) => match fields.search {
                Some(search_fields) if !search_fields.is_empty() => {
                    Some(TextSearch::new(term, &search_fields))
                }
                _ => {
                    return Err(ConfigurationError::MissingSearchFields {
                        resource: resource.to_string(),
                    }
                    .into());
                }
            },
            None => None,
        };

        Ok(Self {
            resource: resource.to_string(),
            select: fields.select,
            count: CountMode::default(),
            sort: params.sort.clone(),
            equality: partitioned.equality,
            range,
            clauses: partitioned.clauses,
            custom_filter: reserved.custom_filter,
            text_search,
        })
    }

    /// Sets the count mode.
    pub fn with_count(mut self, count: CountMode) -> Self {
        self.count = count;
        self
    }

    /// Returns the OR groups in application order: the raw expression first,
    /// then the free-text group.
    pub fn or_groups(&self) -> Vec<String> {
        self.custom_filter
            .iter()
            .cloned()
            .chain(self.text_search.iter().map(TextSearch::to_or_expression))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{ProviderError, RequestError};
    use crate::query::FilterOperator;
    use crate::types::SortOrder;

    fn people() -> ResourceConfig {
        ResourceConfig::with_search(["id", "age_gte", "age_lte", "status", "name"], ["name"])
    }

    #[test]
    fn test_compile_end_to_end_scenario() {
        let params = ListParams::new(2, 5)
            .with_sort(Sort::asc("id"))
            .with_filter("age_gte", 18)
            .with_filter("age_lte", 65)
            .with_filter("status", "active")
            .with_filter("q", "smith");

        let plan = QueryPlan::compile("people", &people(), &params).unwrap();

        assert_eq!(plan.select, vec!["id", "age", "status", "name"]);
        assert_eq!(plan.sort.order, SortOrder::Asc);
        assert_eq!(plan.equality.get("status"), Some(&json!("active")));
        assert_eq!(plan.equality.len(), 1);
        assert_eq!(plan.range, RowRange { from: 5, to: 9 });
        assert_eq!(
            plan.clauses,
            vec![
                FilterClause::new("age", FilterOperator::Gte, json!(18)),
                FilterClause::new("age", FilterOperator::Lte, json!(65)),
            ]
        );
        assert_eq!(plan.or_groups(), vec!["name.ilike.%smith%"]);
    }

    #[test]
    fn test_compile_custom_filter_before_search() {
        let params = ListParams::new(1, 10)
            .with_filter("customFilterQuery", "status.eq.draft,status.eq.review")
            .with_filter("q", "rust");

        let plan = QueryPlan::compile("people", &people(), &params).unwrap();

        assert!(plan.equality.is_empty());
        assert_eq!(
            plan.or_groups(),
            vec!["status.eq.draft,status.eq.review", "name.ilike.%rust%"]
        );
    }

    #[test]
    fn test_compile_flat_config_searches_all_fields() {
        let config = ResourceConfig::fields(["id", "title"]);
        let params = ListParams::new(1, 10).with_filter("q", "foo");

        let plan = QueryPlan::compile("posts", &config, &params).unwrap();
        assert_eq!(
            plan.or_groups(),
            vec!["id.ilike.%foo%,title.ilike.%foo%"]
        );
    }

    #[test]
    fn test_compile_search_without_search_fields() {
        let config = ResourceConfig::WithSearch {
            fields: vec!["id".to_string()],
            full_text_search_fields: None,
        };
        let params = ListParams::new(1, 10).with_filter("q", "foo");

        let err = QueryPlan::compile("posts", &config, &params).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Configuration(ConfigurationError::MissingSearchFields { .. })
        ));

        // Without a search term the missing fields are irrelevant.
        let plan = QueryPlan::compile("posts", &config, &ListParams::new(1, 10)).unwrap();
        assert!(plan.text_search.is_none());
    }

    #[test]
    fn test_compile_empty_field_list() {
        let config = ResourceConfig::fields(Vec::<String>::new());
        let err = QueryPlan::compile("posts", &config, &ListParams::new(1, 10)).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Configuration(ConfigurationError::EmptyFieldList { .. })
        ));
    }

    #[test]
    fn test_compile_rejects_zero_page() {
        let err = QueryPlan::compile("people", &people(), &ListParams::new(0, 10)).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Request(RequestError::InvalidPagination { .. })
        ));
    }

    #[test]
    fn test_plan_serializes_without_absent_groups() {
        let plan = QueryPlan::compile("people", &people(), &ListParams::new(1, 10)).unwrap();
        let value = serde_json::to_value(&plan).unwrap();

        assert!(value.get("custom_filter").is_none());
        assert!(value.get("text_search").is_none());
        assert_eq!(value["range"], json!({"from": 0, "to": 9}));
    }
}
