//! Per-resource field configuration.
//!
//! A resource is configured either with a flat list of field names or with an
//! object naming the selectable fields and the fields eligible for free-text
//! search:
//!
//! ```json
//! {
//!     "tags": ["id", "name"],
//!     "posts": {
//!         "fields": ["id", "title", "body", "views_gte", "views_lte"],
//!         "fullTextSearchFields": ["title", "body"]
//!     }
//! }
//! ```
//!
//! Declared field names may carry an operator suffix (`views_gte`) to signal
//! that a comparison filter exists on the column. Suffixes are stripped when
//! the select list is derived.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::query::strip_operator_suffix;

/// Field configuration for a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceConfig {
    /// Flat field list. The same list is used for free-text search.
    Fields(Vec<String>),

    /// Explicit select fields and full-text search fields.
    WithSearch {
        /// Fields to select, possibly operator-suffixed.
        fields: Vec<String>,

        /// Fields searched by the `q` filter.
        #[serde(
            rename = "fullTextSearchFields",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        full_text_search_fields: Option<Vec<String>>,
    },
}

/// The select list and search fields derived from a [`ResourceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    /// Base column names to select, deduplicated, in declaration order.
    pub select: Vec<String>,

    /// Columns searched by a free-text term, if the resource declares any.
    pub search: Option<Vec<String>>,
}

impl ResourceConfig {
    /// Creates a flat-list configuration.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResourceConfig::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Creates an object-form configuration with explicit search fields.
    pub fn with_search<I, S, J, T>(fields: I, search_fields: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ResourceConfig::WithSearch {
            fields: fields.into_iter().map(Into::into).collect(),
            full_text_search_fields: Some(search_fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Returns the fields exactly as declared.
    pub fn declared_fields(&self) -> &[String] {
        match self {
            ResourceConfig::Fields(fields) => fields,
            ResourceConfig::WithSearch { fields, .. } => fields,
        }
    }

    /// Returns the base column names to select.
    ///
    /// Operator suffixes are stripped and the result is deduplicated by value,
    /// keeping the position of the first occurrence, so
    /// `["price_gte", "price_lte", "name"]` becomes `["price", "name"]`.
    pub fn select_fields(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.declared_fields()
            .iter()
            .map(|field| strip_operator_suffix(field))
            .filter(|base| seen.insert(*base))
            .map(str::to_string)
            .collect()
    }

    /// Returns the fields eligible for free-text search.
    ///
    /// The object form yields `fullTextSearchFields` verbatim (or `None` when
    /// absent). The flat form reuses its resolved select list.
    pub fn search_fields(&self) -> Option<Vec<String>> {
        match self {
            ResourceConfig::Fields(_) => Some(self.select_fields()),
            ResourceConfig::WithSearch {
                full_text_search_fields,
                ..
            } => full_text_search_fields.clone(),
        }
    }

    /// Resolves both the select list and the search fields.
    pub fn resolve(&self) -> ResolvedFields {
        ResolvedFields {
            select: self.select_fields(),
            search: self.search_fields(),
        }
    }
}

/// Field configuration for every resource a provider serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcesConfig {
    resources: HashMap<String, ResourceConfig>,
}

impl ResourcesConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the configuration for a resource.
    pub fn with_resource(mut self, name: impl Into<String>, config: ResourceConfig) -> Self {
        self.resources.insert(name.into(), config);
        self
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Invalid {
            message: e.to_string(),
        })
    }

    /// Loads a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Returns the configuration for a resource.
    pub fn get(&self, resource: &str) -> Result<&ResourceConfig, ConfigurationError> {
        self.resources
            .get(resource)
            .ok_or_else(|| ConfigurationError::UnknownResource {
                resource: resource.to_string(),
            })
    }

    /// Returns the configured resource names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Returns the number of configured resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if no resources are configured.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
