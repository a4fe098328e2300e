//! Error types for the data provider.
//!
//! Errors are organized in a small hierarchy: backend errors reported by the
//! remote query builder, configuration errors for malformed resource
//! definitions, and request errors for list parameters that cannot be compiled.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all data provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Errors reported by the remote backend
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Resource configuration errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Request parameter errors
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Errors originating from the remote backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend rejected or failed the query.
    #[error("query failed: {message}")]
    Query {
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// A single-row operation matched no rows.
    #[error("record not found: {resource}/{id}")]
    NotFound { resource: String, id: String },

    /// A single-row operation matched more than one row.
    #[error("expected a single row from {resource}, found {count}")]
    MultipleRows { resource: String, count: usize },

    /// The raw OR expression could not be parsed.
    #[error("invalid filter expression '{expression}': {message}")]
    InvalidFilterExpression { expression: String, message: String },

    /// The transport failed before a response was received.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// A request or response body could not be (de)serialized.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl BackendError {
    /// Creates a query error with only a message.
    pub fn query(message: impl Into<String>) -> Self {
        BackendError::Query {
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }
}

/// Errors in the per-resource field configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// No configuration exists for the requested resource.
    #[error("no field configuration for resource '{resource}'")]
    UnknownResource { resource: String },

    /// The resource declares no fields to select.
    #[error("resource '{resource}' declares no fields")]
    EmptyFieldList { resource: String },

    /// A free-text term was supplied but the resource has no search fields.
    #[error("resource '{resource}' has no fullTextSearchFields but a search term was supplied")]
    MissingSearchFields { resource: String },

    /// The resources document is malformed.
    #[error("invalid resources configuration: {message}")]
    Invalid { message: String },

    /// The resources file could not be read.
    #[error("failed to read resources configuration from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors in the list request itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Page and page size must both be at least 1.
    #[error("invalid pagination: page {page}, perPage {per_page} (both must be >= 1)")]
    InvalidPagination { page: u64, per_page: u64 },

    /// The row range does not fit in 64 bits.
    #[error("pagination overflow: page {page}, perPage {per_page}")]
    PaginationOverflow { page: u64, per_page: u64 },

    /// The page size exceeds the configured maximum.
    #[error("perPage {per_page} exceeds the maximum of {max}")]
    PageTooLarge { per_page: u64, max: u64 },

    /// A reserved or typed filter value has the wrong shape.
    #[error("invalid value for filter '{key}': {message}")]
    InvalidFilterValue { key: String, message: String },
}

/// Result type alias for data provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for remote backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::SerializationError {
            message: err.to_string(),
        }
    }
}
