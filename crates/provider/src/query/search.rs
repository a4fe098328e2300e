//! Free-text search as a single OR group of `ilike` predicates.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A case-insensitive containment predicate on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPredicate {
    /// The column searched.
    pub field: String,
    /// The `ilike` pattern, `%term%`.
    pub pattern: String,
}

impl TextPredicate {
    /// Renders the predicate in PostgREST logic-tree syntax.
    pub fn to_expression(&self) -> String {
        format!("{}.ilike.{}", self.field, quote_value(&self.pattern))
    }
}

/// A free-text term searched across several columns, any of which may match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSearch {
    /// The search term as supplied.
    pub term: String,
    /// One predicate per search field.
    pub predicates: Vec<TextPredicate>,
}

impl TextSearch {
    /// Builds one containment predicate per field.
    pub fn new(term: impl Into<String>, fields: &[String]) -> Self {
        let term = term.into();
        let pattern = format!("%{}%", term);
        let predicates = fields
            .iter()
            .map(|field| TextPredicate {
                field: field.clone(),
                pattern: pattern.clone(),
            })
            .collect();
        Self { term, predicates }
    }

    /// Renders the OR group body, e.g. `title.ilike.%foo%,body.ilike.%foo%`.
    pub fn to_or_expression(&self) -> String {
        self.predicates
            .iter()
            .map(TextPredicate::to_expression)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Quotes a value for use inside a PostgREST logic tree or `in` list.
///
/// Values containing reserved characters (`,` `(` `)` `"` `\` or surrounding
/// whitespace) are wrapped in double quotes with `"` and `\` escaped.
pub fn quote_value(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value.trim() != value
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\'));

    if !needs_quotes {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}
