//! Normalized result shapes returned by the data provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page of records plus the total number of matching rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    /// The records on this page. Never null; empty when nothing matched.
    pub data: Vec<Value>,
    /// Total matching rows across all pages. Zero when the backend reports none.
    pub total: u64,
}

impl ListResult {
    /// Creates a list result.
    pub fn new(data: Vec<Value>, total: u64) -> Self {
        Self { data, total }
    }

    /// Returns true if the page holds no records.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    /// The record.
    pub data: Value,
}

/// Several records fetched by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManyResult {
    /// The records. Empty when none matched.
    pub data: Vec<Value>,
}

/// Identifiers of the records affected by a bulk mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdsResult {
    /// The affected identifiers.
    pub data: Vec<Value>,
}

impl IdsResult {
    /// Collects the `id_field` of each record. Records without the field are skipped.
    pub fn from_records(records: &[Value], id_field: &str) -> Self {
        Self {
            data: records
                .iter()
                .filter_map(|record| record.get(id_field).cloned())
                .collect(),
        }
    }
}
