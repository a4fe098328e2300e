//! Request parameter types for list and reference-list operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A loosely-typed filter map as sent by the caller.
///
/// Keys may carry an operator suffix (`age_gte`), and two keys are reserved:
/// `q` for free-text search and `customFilterQuery` for a raw OR expression.
pub type Filter = serde_json::Map<String, Value>;

/// Page-based pagination, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: u64,
    /// Rows per page.
    pub per_page: u64,
}

impl Pagination {
    /// Creates pagination for the given page and page size.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Returns true for ascending order.
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Asc)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

/// A sort directive on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// The field to sort by.
    pub field: String,
    /// The sort order.
    pub order: SortOrder,
}

impl Sort {
    /// Creates a sort directive.
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::asc("id")
    }
}

/// Parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page selection.
    pub pagination: Pagination,
    /// Sort directive.
    pub sort: Sort,
    /// Field filters.
    #[serde(default)]
    pub filter: Filter,
}

impl ListParams {
    /// Creates list parameters for a page, sorted ascending by `id`.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            pagination: Pagination::new(page, per_page),
            ..Default::default()
        }
    }

    /// Sets the sort directive.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Adds a filter entry.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }
}

/// Parameters of a reference-list request: a list restricted to rows whose
/// `target` column equals `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceParams {
    /// The foreign-key column on the listed resource.
    pub target: String,
    /// The referenced record's identifier.
    pub id: Value,
    /// Pagination, sort and additional filters.
    #[serde(flatten)]
    pub list: ListParams,
}

impl ReferenceParams {
    /// Creates reference-list parameters.
    pub fn new(target: impl Into<String>, id: impl Into<Value>, list: ListParams) -> Self {
        Self {
            target: target.into(),
            id: id.into(),
            list,
        }
    }

    /// Converts to list parameters with the foreign-key equality merged into
    /// the filter. The reference constraint replaces any caller filter on the
    /// same key.
    pub fn into_list_params(self) -> ListParams {
        let mut list = self.list;
        list.filter.insert(self.target, self.id);
        list
    }
}

/// How the backend counts the total number of matching rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    /// Exact `COUNT(*)`.
    #[default]
    Exact,
    /// Planner estimate.
    Planned,
    /// Exact for small tables, planner estimate above a threshold.
    Estimated,
}

impl fmt::Display for CountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountMode::Exact => write!(f, "exact"),
            CountMode::Planned => write!(f, "planned"),
            CountMode::Estimated => write!(f, "estimated"),
        }
    }
}
