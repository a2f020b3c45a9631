//! Condition trees.
//!
//! A condition tree is built once from caller input, either the object-shaped
//! DSL (usually written with `serde_json::json!`) or the typed constructors,
//! and is never modified afterwards. Sibling order is significant: it decides
//! both clause text and placeholder numbering.
//!
//! # DSL
//!
//! ```ignore
//! json!({
//!     "active": true,                          // "active" = $1
//!     "$or": [{ "role": "admin" }, { "role": "owner" }],
//!     "$gte": { "createdAt": "2024-01-01" },   // "created_at" >= $n
//!     "deletedAt": null,                       // "deleted_at" IS NULL
//!     ":lower(email)": "'a@b.c'",             // raw left-hand side
//! })
//! ```
//!
//! An array of mappings is flattened and the entries are ANDed.

use crate::error::{BuildError, json_type_name};
use crate::value::Value;
use std::fmt;

/// Logical operator joining sibling conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// SQL keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(LogicalOp::And),
            "$or" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

/// Comparison applied by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparer {
    #[default]
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Case-insensitive POSIX regex match.
    Regexp,
}

impl Comparer {
    /// SQL operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparer::Eq => "=",
            Comparer::Ne => "!=",
            Comparer::Lt => "<",
            Comparer::Lte => "<=",
            Comparer::Gt => ">",
            Comparer::Gte => ">=",
            Comparer::Regexp => "~*",
        }
    }

    /// DSL key, e.g. `$gte`.
    pub fn key(self) -> &'static str {
        match self {
            Comparer::Eq => "$eq",
            Comparer::Ne => "$ne",
            Comparer::Lt => "$lt",
            Comparer::Lte => "$lte",
            Comparer::Gt => "$gt",
            Comparer::Gte => "$gte",
            Comparer::Regexp => "$regexp",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Comparer::Eq),
            "$ne" => Some(Comparer::Ne),
            "$lt" => Some(Comparer::Lt),
            "$lte" => Some(Comparer::Lte),
            "$gt" => Some(Comparer::Gt),
            "$gte" => Some(Comparer::Gte),
            "$regexp" => Some(Comparer::Regexp),
            _ => None,
        }
    }
}

impl fmt::Display for Comparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What a group changes for its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Join children with this operator; the comparer is inherited.
    Logical(LogicalOp),
    /// Compare children with this comparer; the operator is inherited.
    Compare(Comparer),
}

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column reference compared against a bound value.
    Leaf { key: String, value: Value },
    /// Raw SQL left-hand side compared against an inline literal.
    Raw { expr: String, value: Value },
    /// Nested conditions under a modifier.
    Group {
        modifier: Modifier,
        children: Vec<Condition>,
    },
}

impl Condition {
    /// A leaf; keys starting with `:` become raw expressions.
    pub fn leaf(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.strip_prefix(':') {
            Some(expr) => Condition::Raw {
                expr: expr.to_string(),
                value,
            },
            None => Condition::Leaf { key, value },
        }
    }

    /// Raw left-hand side, written without the `:` marker.
    pub fn raw(expr: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Raw {
            expr: expr.into(),
            value: value.into(),
        }
    }

    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(key, value)
    }

    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(Comparer::Ne, vec![Self::leaf(key, value)])
    }

    pub fn lt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(Comparer::Lt, vec![Self::leaf(key, value)])
    }

    pub fn lte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(Comparer::Lte, vec![Self::leaf(key, value)])
    }

    pub fn gt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(Comparer::Gt, vec![Self::leaf(key, value)])
    }

    pub fn gte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(Comparer::Gte, vec![Self::leaf(key, value)])
    }

    pub fn regexp(key: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(Comparer::Regexp, vec![Self::leaf(key, pattern)])
    }

    /// `key IS NULL`
    pub fn is_null(key: impl Into<String>) -> Self {
        Self::leaf(key, Value::Null)
    }

    /// `key IS NOT NULL`
    pub fn is_not_null(key: impl Into<String>) -> Self {
        Self::ne(key, Value::Null)
    }

    pub fn and(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Group {
            modifier: Modifier::Logical(LogicalOp::And),
            children: children.into_iter().collect(),
        }
    }

    pub fn or(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Group {
            modifier: Modifier::Logical(LogicalOp::Or),
            children: children.into_iter().collect(),
        }
    }

    pub fn compare(comparer: Comparer, children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Group {
            modifier: Modifier::Compare(comparer),
            children: children.into_iter().collect(),
        }
    }
}

/// Normalize DSL input into a condition sequence.
pub fn parse_conditions(input: &serde_json::Value) -> Result<Vec<Condition>, BuildError> {
    match input {
        serde_json::Value::Null => Err(BuildError::MissingConditions),
        serde_json::Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(parse_conditions(item)?);
            }
            Ok(out)
        }
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| parse_entry(key, value))
            .collect(),
        other => Err(BuildError::InvalidConditionsType(
            json_type_name(other).to_string(),
        )),
    }
}

fn parse_entry(key: &str, value: &serde_json::Value) -> Result<Condition, BuildError> {
    if key.starts_with('$') {
        let modifier = match (LogicalOp::from_key(key), Comparer::from_key(key)) {
            (Some(op), _) => Modifier::Logical(op),
            (None, Some(comparer)) => Modifier::Compare(comparer),
            (None, None) => return Err(BuildError::UnknownModifier(key.to_string())),
        };
        return Ok(Condition::Group {
            modifier,
            children: parse_conditions(value)?,
        });
    }

    match value {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            Err(BuildError::InvalidConditionsType(format!(
                "{} under `{key}`",
                json_type_name(value)
            )))
        }
        scalar => Ok(Condition::leaf(key, Value::from_json(scalar.clone()))),
    }
}

/// Input accepted by [`QueryBuilder::filter`](crate::QueryBuilder::filter).
pub trait IntoConditions {
    fn into_conditions(self) -> Result<Vec<Condition>, BuildError>;
}

impl IntoConditions for serde_json::Value {
    fn into_conditions(self) -> Result<Vec<Condition>, BuildError> {
        parse_conditions(&self)
    }
}

impl IntoConditions for &serde_json::Value {
    fn into_conditions(self) -> Result<Vec<Condition>, BuildError> {
        parse_conditions(self)
    }
}

impl IntoConditions for Condition {
    fn into_conditions(self) -> Result<Vec<Condition>, BuildError> {
        Ok(vec![self])
    }
}

impl IntoConditions for Vec<Condition> {
    fn into_conditions(self) -> Result<Vec<Condition>, BuildError> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_entries_keep_order() {
        let parsed = parse_conditions(&json!({ "b": 1, "a": 2 })).unwrap();
        assert_eq!(
            parsed,
            vec![Condition::eq("b", 1), Condition::eq("a", 2)]
        );
    }

    #[test]
    fn arrays_flatten() {
        let parsed = parse_conditions(&json!([{ "a": 1 }, { "b": null }])).unwrap();
        assert_eq!(parsed, vec![Condition::eq("a", 1), Condition::is_null("b")]);
    }

    #[test]
    fn modifiers_nest() {
        let parsed = parse_conditions(&json!({
            "$or": [{ "a": 1 }, { "$gt": { "b": 2 } }]
        }))
        .unwrap();
        assert_eq!(
            parsed,
            vec![Condition::or([Condition::eq("a", 1), Condition::gt("b", 2)])]
        );
    }

    #[test]
    fn raw_keys_are_marked() {
        let parsed = parse_conditions(&json!({ ":lower(email)": "x" })).unwrap();
        assert_eq!(parsed, vec![Condition::raw("lower(email)", "x")]);
    }

    #[test]
    fn null_input_is_missing() {
        assert_eq!(
            parse_conditions(&json!(null)),
            Err(BuildError::MissingConditions)
        );
    }

    #[test]
    fn scalar_input_is_invalid() {
        assert_eq!(
            parse_conditions(&json!("a = 1")),
            Err(BuildError::InvalidConditionsType("string".into()))
        );
    }

    #[test]
    fn nested_object_under_column_is_invalid() {
        assert!(matches!(
            parse_conditions(&json!({ "a": { "b": 1 } })),
            Err(BuildError::InvalidConditionsType(_))
        ));
    }

    #[test]
    fn unknown_modifier() {
        assert_eq!(
            parse_conditions(&json!({ "$like": { "a": "x" } })),
            Err(BuildError::UnknownModifier("$like".into()))
        );
    }

    #[test]
    fn comparer_display_uses_dsl_key() {
        assert_eq!(Comparer::Gte.to_string(), "$gte");
        assert_eq!(Comparer::Regexp.symbol(), "~*");
    }
}
