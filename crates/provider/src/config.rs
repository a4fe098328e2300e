//! Data provider configuration.
//!
//! Configuration can be built programmatically, parsed from command line
//! arguments (the struct is a `clap` parser and can be flattened into a
//! larger CLI), or read from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TABULA_RESOURCES` | (none) | Path to the resources JSON file |
//! | `TABULA_ID_FIELD` | id | Identifier column used by single-record operations |
//! | `TABULA_COUNT_MODE` | exact | Total count mode (exact, planned, estimated) |
//! | `TABULA_LOG_QUERIES` | false | Pass compiled plans to the query observer |
//! | `TABULA_MAX_PER_PAGE` | (none) | Reject list requests with a larger page size |
//!
//! # Example
//!
//! ```rust
//! use tabula_provider::config::ProviderConfig;
//! use tabula_provider::types::CountMode;
//!
//! let config = ProviderConfig {
//!     count_mode: CountMode::Planned,
//!     max_per_page: Some(100),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::error::{ConfigurationError, RequestError};
use crate::types::{CountMode, ResourcesConfig};

/// Configuration for a [`DataProvider`](crate::provider::DataProvider).
#[derive(Debug, Clone, Parser)]
#[command(name = "tabula")]
pub struct ProviderConfig {
    /// Path to the resources JSON file.
    #[arg(long, env = "TABULA_RESOURCES")]
    pub resources: Option<PathBuf>,

    /// Identifier column used by get_one, get_many, update and delete.
    #[arg(long, env = "TABULA_ID_FIELD", default_value = "id")]
    pub id_field: String,

    /// How the backend counts total rows for list requests.
    #[arg(long, env = "TABULA_COUNT_MODE", value_enum, default_value_t = CountMode::Exact)]
    pub count_mode: CountMode,

    /// Pass compiled plans and outcomes to the query observer.
    #[arg(long, env = "TABULA_LOG_QUERIES", default_value = "false")]
    pub log_queries: bool,

    /// Maximum page size accepted for list requests.
    #[arg(long, env = "TABULA_MAX_PER_PAGE")]
    pub max_per_page: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            resources: None,
            id_field: "id".to_string(),
            count_mode: CountMode::Exact,
            log_queries: false,
            max_per_page: None,
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration from environment variables only.
    pub fn from_env() -> Self {
        // Parse without process arguments so only TABULA_* variables apply
        Self::try_parse_from(["tabula"]).unwrap_or_default()
    }

    /// Enables the query observer.
    pub fn with_log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id_field.trim().is_empty() {
            errors.push("Identifier field cannot be empty".to_string());
        }

        if self.max_per_page == Some(0) {
            errors.push("Max page size cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Loads the resources file named by [`resources`](Self::resources).
    pub fn load_resources(&self) -> Result<ResourcesConfig, ConfigurationError> {
        match &self.resources {
            Some(path) => ResourcesConfig::from_path(path),
            None => Err(ConfigurationError::Invalid {
                message: "no resources file configured (set TABULA_RESOURCES or --resources)"
                    .to_string(),
            }),
        }
    }

    /// Checks a requested page size against [`max_per_page`](Self::max_per_page).
    pub fn check_page_size(&self, per_page: u64) -> Result<(), RequestError> {
        match self.max_per_page {
            Some(max) if per_page > max => Err(RequestError::PageTooLarge { per_page, max }),
            _ => Ok(()),
        }
    }
}
