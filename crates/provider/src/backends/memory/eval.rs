//! Row predicates and ordering for the in-memory backend.
//!
//! Comparisons follow SQL semantics loosely: any comparison against a null
//! column is false, numeric strings compare as numbers against numeric
//! columns, and `is` is the only way to match a null.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::expr::{ExprOperator, ExprValue, LogicExpr};

static NULL: Value = Value::Null;

/// Returns the column value of a row, or null if the column is absent.
pub fn column<'a>(row: &'a Value, field: &str) -> &'a Value {
    row.get(field).unwrap_or(&NULL)
}

/// Compares a column value with a filter value.
///
/// Returns `None` when either side is null or the types are incomparable.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::String(b)) => {
            a.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?)
        }
        (Value::String(a), Value::Number(b)) => {
            a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?)
        }
        (Value::Bool(a), Value::String(b)) => Some(a.cmp(&parse_bool(b)?)),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

/// Equality as a filter would evaluate it.
pub fn equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Equal)
}

/// Inequality; false when the column is null.
pub fn not_equals(left: &Value, right: &Value) -> bool {
    !left.is_null() && !right.is_null() && !equals(left, right)
}

/// Evaluates `left <op> right` for an ordering comparison.
pub fn compare_with(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> bool {
    compare(left, right).is_some_and(accept)
}

/// `IS` semantics: null, true, false and unknown.
pub fn is_identity(value: &Value, target: &Value) -> bool {
    let target = match target {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "null" | "unknown" => Value::Null,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return false,
        },
        other => other.clone(),
    };
    match target {
        Value::Null => value.is_null(),
        Value::Bool(b) => value.as_bool() == Some(b),
        _ => false,
    }
}

/// SQL `LIKE` / `ILIKE` with `%` and `*` as multi-character wildcards.
pub fn like(value: &Value, pattern: &str, case_insensitive: bool) -> bool {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return false,
    };

    let mut regex = String::from(if case_insensitive { "(?is)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '%' | '*' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    regex.push('$');

    Regex::new(&regex).is_ok_and(|re| re.is_match(&text))
}

/// Evaluates a parsed logic-tree expression against a row.
pub fn eval_expr(row: &Value, expr: &LogicExpr) -> bool {
    match expr {
        LogicExpr::And(items) => items.iter().all(|item| eval_expr(row, item)),
        LogicExpr::Or(items) => items.iter().any(|item| eval_expr(row, item)),
        LogicExpr::Not(inner) => !eval_expr(row, inner),
        LogicExpr::Condition {
            field,
            negated,
            op,
            value,
        } => {
            let matched = eval_condition(column(row, field), *op, value);
            matched != *negated
        }
    }
}

fn eval_condition(left: &Value, op: ExprOperator, value: &ExprValue) -> bool {
    let scalar = match value {
        ExprValue::List(values) => {
            return op == ExprOperator::In
                && values
                    .iter()
                    .any(|v| equals(left, &Value::String(v.clone())));
        }
        ExprValue::Scalar(s) => Value::String(s.clone()),
    };

    match op {
        ExprOperator::Eq => equals(left, &scalar),
        ExprOperator::Neq => not_equals(left, &scalar),
        ExprOperator::Gt => compare_with(left, &scalar, Ordering::is_gt),
        ExprOperator::Gte => compare_with(left, &scalar, Ordering::is_ge),
        ExprOperator::Lt => compare_with(left, &scalar, Ordering::is_lt),
        ExprOperator::Lte => compare_with(left, &scalar, Ordering::is_le),
        ExprOperator::Like => like(left, scalar.as_str().unwrap_or_default(), false),
        ExprOperator::Ilike => like(left, scalar.as_str().unwrap_or_default(), true),
        ExprOperator::Is => is_identity(left, &scalar),
        ExprOperator::In => false,
    }
}

/// Ordering used by `order`: nulls sort last ascending and first descending.
pub fn order_rows(a: &Value, b: &Value, field: &str, ascending: bool) -> Ordering {
    let (left, right) = (column(a, field), column(b, field));
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
    };
    if ascending { ordering } else { ordering.reverse() }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" => Some(true),
        "false" | "f" => Some(false),
        _ => None,
    }
}
