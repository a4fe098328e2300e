//! Filter operators encoded as key suffixes.
//!
//! A filter key such as `age_gte` names the column `age` and the operator
//! [`FilterOperator::Gte`]. Keys without a recognized suffix compare by
//! equality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality (no suffix).
    #[default]
    Eq,
    /// Greater than or equal (`_gte`).
    Gte,
    /// Less than or equal (`_lte`).
    Lte,
    /// Not equal (`_neq`).
    Neq,
    /// Identity check against null/true/false (`_is`).
    Is,
    /// Negated identity check (`_is_not`).
    IsNot,
}

impl FilterOperator {
    /// Suffixed operators in matching order.
    ///
    /// `_is` is a suffix of `_is_not`, so `IsNot` must be tried first.
    pub const SUFFIXED: [FilterOperator; 5] = [
        FilterOperator::IsNot,
        FilterOperator::Neq,
        FilterOperator::Gte,
        FilterOperator::Lte,
        FilterOperator::Is,
    ];

    /// Returns the key suffix for this operator, or `None` for equality.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            FilterOperator::Eq => None,
            FilterOperator::Gte => Some("_gte"),
            FilterOperator::Lte => Some("_lte"),
            FilterOperator::Neq => Some("_neq"),
            FilterOperator::Is => Some("_is"),
            FilterOperator::IsNot => Some("_is_not"),
        }
    }

    /// Returns the PostgREST operator token.
    pub fn postgrest_token(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
            FilterOperator::Neq => "neq",
            FilterOperator::Is => "is",
            FilterOperator::IsNot => "not.is",
        }
    }

    /// Splits a filter key into its base column and operator.
    ///
    /// A key that consists of nothing but a suffix (`_gte`) has no base column
    /// and is treated as a plain equality key.
    pub fn split_key(key: &str) -> (&str, FilterOperator) {
        for operator in Self::SUFFIXED {
            if let Some(suffix) = operator.suffix() {
                if let Some(base) = key.strip_suffix(suffix) {
                    if !base.is_empty() {
                        return (base, operator);
                    }
                }
            }
        }
        (key, FilterOperator::Eq)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOperator::Eq => write!(f, "eq"),
            FilterOperator::Gte => write!(f, "gte"),
            FilterOperator::Lte => write!(f, "lte"),
            FilterOperator::Neq => write!(f, "neq"),
            FilterOperator::Is => write!(f, "is"),
            FilterOperator::IsNot => write!(f, "is_not"),
        }
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" => Ok(FilterOperator::Eq),
            "gte" => Ok(FilterOperator::Gte),
            "lte" => Ok(FilterOperator::Lte),
            "neq" => Ok(FilterOperator::Neq),
            "is" => Ok(FilterOperator::Is),
            "is_not" => Ok(FilterOperator::IsNot),
            _ => Err(format!("unknown filter operator: {}", s)),
        }
    }
}

/// Strips a recognized operator suffix from a field or filter key.
pub fn strip_operator_suffix(name: &str) -> &str {
    FilterOperator::split_key(name).0
}
