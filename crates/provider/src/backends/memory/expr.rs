//! Parser for PostgREST logic-tree expressions.
//!
//! This is the syntax accepted by the `or` query parameter, without the
//! surrounding parentheses.
//!
//! # Grammar
//!
//! ```text
//! list      = item ("," item)*
//! item      = ["not."] ("and" / "or") "(" list ")" / condition
//! condition = field "." ["not."] operator "." value
//! operator  = "eq" / "neq" / "gt" / "gte" / "lt" / "lte" / "like" / "ilike" / "is" / "in"
//! value     = quoted / raw            ; raw stops at "," or ")"
//! in-value  = "(" value ("," value)* ")"
//! quoted    = DQUOTE *(escaped / char) DQUOTE
//! ```
//!
//! # Example
//!
//! ```text
//! title.ilike.%rust%,and(views.gte.100,status.in.(draft,review)),archived.not.is.true
//! ```

use std::fmt;

/// Comparison operators of a logic-tree condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOperator {
    /// Equal
    Eq,
    /// Not equal
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Case-sensitive pattern match
    Like,
    /// Case-insensitive pattern match
    Ilike,
    /// Identity (null, true, false, unknown)
    Is,
    /// Membership in a list
    In,
}

impl ExprOperator {
    /// Parses an operator token.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(ExprOperator::Eq),
            "neq" => Some(ExprOperator::Neq),
            "gt" => Some(ExprOperator::Gt),
            "gte" => Some(ExprOperator::Gte),
            "lt" => Some(ExprOperator::Lt),
            "lte" => Some(ExprOperator::Lte),
            "like" => Some(ExprOperator::Like),
            "ilike" => Some(ExprOperator::Ilike),
            "is" => Some(ExprOperator::Is),
            "in" => Some(ExprOperator::In),
            _ => None,
        }
    }
}

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprValue {
    /// A single value.
    Scalar(String),
    /// The list of an `in` condition.
    List(Vec<String>),
}

/// A parsed logic-tree expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicExpr {
    /// `field.[not.]op.value`
    Condition {
        /// Column name.
        field: String,
        /// Set by a `not.` before the operator.
        negated: bool,
        /// Comparison operator.
        op: ExprOperator,
        /// Right-hand side.
        value: ExprValue,
    },
    /// All children must hold.
    And(Vec<LogicExpr>),
    /// At least one child must hold.
    Or(Vec<LogicExpr>),
    /// Negation of a group.
    Not(Box<LogicExpr>),
}

/// Expression parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprParseError {
    /// What went wrong.
    pub message: String,
    /// Byte offset into the expression.
    pub position: usize,
}

impl fmt::Display for ExprParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl std::error::Error for ExprParseError {}

impl LogicExpr {
    /// Parses the body of an `or` group, e.g. `a.eq.1,b.eq.2`.
    pub fn parse_or_group(input: &str) -> Result<LogicExpr, ExprParseError> {
        let mut parser = ExprParser::new(input);
        let items = parser.parse_list()?;
        if parser.pos < input.len() {
            return Err(parser.error(format!(
                "unexpected characters after expression: '{}'",
                &input[parser.pos..]
            )));
        }
        Ok(LogicExpr::Or(items))
    }
}

struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ExprParseError {
        ExprParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ExprParseError> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(self.error(format!("expected '{}', found '{}'", c, found))),
            None => Err(self.error(format!("expected '{}', found end of input", c))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<LogicExpr>, ExprParseError> {
        let mut items = vec![self.parse_item()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<LogicExpr, ExprParseError> {
        let start = self.pos;
        let negated = self.eat("not.");

        let group = if self.eat("and(") {
            Some(LogicExpr::And(self.parse_group_tail()?))
        } else if self.eat("or(") {
            Some(LogicExpr::Or(self.parse_group_tail()?))
        } else {
            None
        };

        match group {
            Some(expr) if negated => Ok(LogicExpr::Not(Box::new(expr))),
            Some(expr) => Ok(expr),
            None => {
                // "not." only prefixes groups; a column may itself be named "not"
                self.pos = start;
                self.parse_condition()
            }
        }
    }

    fn parse_group_tail(&mut self) -> Result<Vec<LogicExpr>, ExprParseError> {
        let items = self.parse_list()?;
        self.expect(')')?;
        Ok(items)
    }

    fn parse_condition(&mut self) -> Result<LogicExpr, ExprParseError> {
        let field = self.read_token();
        if field.is_empty() {
            return Err(self.error("expected a column name"));
        }
        self.expect('.')?;

        let negated = self.eat("not.");

        let op_start = self.pos;
        let token = self.read_token();
        let op = ExprOperator::parse(token).ok_or_else(|| ExprParseError {
            message: format!("unknown operator '{}'", token),
            position: op_start,
        })?;
        self.expect('.')?;

        let value = if op == ExprOperator::In {
            ExprValue::List(self.parse_value_list()?)
        } else {
            ExprValue::Scalar(self.parse_value()?)
        };

        Ok(LogicExpr::Condition {
            field: field.to_string(),
            negated,
            op,
            value,
        })
    }

    /// Reads up to the next `.`, `,`, `(` or `)`.
    fn read_token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | ',' | '(' | ')') {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn parse_value(&mut self) -> Result<String, ExprParseError> {
        if self.peek() == Some('"') {
            return self.parse_quoted();
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | ')') {
                break;
            }
            self.pos += c.len_utf8();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_quoted(&mut self) -> Result<String, ExprParseError> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.consume() {
                Some('"') => return Ok(value),
                Some('\\') => match self.consume() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("unterminated escape sequence")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated quoted value")),
            }
        }
    }

    fn parse_value_list(&mut self) -> Result<Vec<String>, ExprParseError> {
        self.expect('(')?;
        let mut values = Vec::new();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(values);
        }
        loop {
            values.push(self.parse_value()?);
            match self.consume() {
                Some(',') => continue,
                Some(')') => return Ok(values),
                _ => return Err(self.error("unterminated value list")),
            }
        }
    }
}
