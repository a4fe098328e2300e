//! Tabula Data Provider
//!
//! This crate compiles generic list requests (pagination, sort, field filters,
//! a free-text term and a raw filter expression) into the query language of
//! PostgREST-style tabular backends, and exposes the usual record operations
//! through a single [`DataProvider`] facade.
//!
//! # Features
//!
//! - **Operator suffixes**: `age_gte`, `age_lte`, `status_neq`, `deleted_at_is`,
//!   `deleted_at_is_not` become comparison clauses on the bare column
//! - **Inclusive pagination**: 1-based pages map to inclusive 0-based row ranges
//! - **Free-text search**: the `q` filter becomes one OR group of `ilike`
//!   predicates over the resource's search fields
//! - **Raw expressions**: `customFilterQuery` is passed through as its own OR group
//! - **Normalized results**: missing rows or counts become `[]` and `0`
//!
//! # Architecture
//!
//! - [`types`] - Request parameters, resource configuration and results
//! - [`query`] - Compiler, query plans and the backend traits
//! - [`provider`] - The [`DataProvider`] facade
//! - [`backends`] - In-memory and PostgREST backends
//! - [`config`] - Provider configuration (CLI flags and environment)
//! - [`observer`] - Optional hook receiving compiled plans
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use tabula_provider::backends::postgrest::render_plan;
//! use tabula_provider::query::QueryPlan;
//! use tabula_provider::types::{ListParams, ResourceConfig, Sort};
//!
//! let config = ResourceConfig::with_search(
//!     ["id", "age_gte", "age_lte", "status", "name"],
//!     ["name"],
//! );
//! let params = ListParams::new(2, 5)
//!     .with_sort(Sort::asc("id"))
//!     .with_filter("status", "active")
//!     .with_filter("age_gte", 18)
//!     .with_filter("age_lte", 65)
//!     .with_filter("q", "smith");
//!
//! let plan = QueryPlan::compile("people", &config, &params).unwrap();
//! let request = render_plan(&plan);
//!
//! assert_eq!(request.params("select"), vec!["id,age,status,name"]);
//! assert_eq!(request.params("age"), vec!["gte.18", "lte.65"]);
//! assert_eq!(request.params("or"), vec!["(name.ilike.%smith%)"]);
//! assert_eq!(request.header("Range"), Some("5-9"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod error;
pub mod observer;
pub mod provider;
pub mod query;
pub mod types;

// Re-export commonly used types at crate root
pub use config::ProviderConfig;
pub use error::{
    BackendError, BackendResult, ConfigurationError, ProviderError, ProviderResult, RequestError,
};
pub use provider::DataProvider;
pub use types::{ListParams, ListResult, ResourceConfig, ResourcesConfig};

// Re-export core traits
pub use observer::{QueryObserver, TracingObserver};
pub use query::{QueryPlan, RemoteClient, RemoteQueryBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
