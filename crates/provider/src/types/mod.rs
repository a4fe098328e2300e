//! Core types for the data provider.
//!
//! - [`ResourceConfig`], [`ResourcesConfig`] - Per-resource field configuration
//! - [`ListParams`], [`ReferenceParams`] - List request parameters
//! - [`ListResult`], [`RecordResult`], [`ManyResult`], [`IdsResult`] - Normalized results
//!
//! # Example
//!
//! ```
//! use tabula_provider::types::{ListParams, ResourceConfig, Sort};
//!
//! let config = ResourceConfig::with_search(["id", "title", "views_gte"], ["title"]);
//! assert_eq!(config.select_fields(), vec!["id", "title", "views"]);
//!
//! let params = ListParams::new(1, 25)
//!     .with_sort(Sort::desc("views"))
//!     .with_filter("views_gte", 100)
//!     .with_filter("q", "rust");
//! assert_eq!(params.filter.len(), 2);
//! ```

mod params;
mod resource;
mod result;

pub use params::{CountMode, Filter, ListParams, Pagination, ReferenceParams, Sort, SortOrder};
pub use resource::{ResolvedFields, ResourceConfig, ResourcesConfig};
pub use result::{IdsResult, ListResult, ManyResult, RecordResult};
