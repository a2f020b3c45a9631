//! The statement accumulator and its parts.
//!
//! A [`Statement`] is plain data: builders fill it in and
//! [`compile`](crate::compile::compile) turns it into SQL. Names are stored as
//! the caller wrote them and are cased during compilation.

use crate::condition::{Condition, IntoConditions, parse_conditions};
use crate::error::{BuildError, json_type_name};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Statement kind, carrying the INSERT/UPDATE payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Command {
    #[default]
    Select,
    Insert(Vec<Assignment>),
    Update(Vec<Assignment>),
    Delete,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Select => "select",
            Command::Insert(_) => "insert",
            Command::Update(_) => "update",
            Command::Delete => "delete",
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Command::Insert(_))
    }
}

/// `column = value` in SET lists and INSERT payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: AssignValue,
}

/// Right-hand side of an [`Assignment`].
#[derive(Debug, Clone, PartialEq)]
pub enum AssignValue {
    /// Literal `NULL`.
    Null,
    /// SQL written verbatim (`:now()` in the input).
    Raw(String),
    /// Bound through a placeholder.
    Bind(Value),
}

impl Assignment {
    /// Classify `value`: null, `:`-prefixed text (raw) or a bound value.
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = match value.into() {
            Value::Null => AssignValue::Null,
            Value::Text(s) if s.starts_with(':') => AssignValue::Raw(s[1..].to_string()),
            other => AssignValue::Bind(other),
        };
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Which sides of a join must have a matching row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredMode {
    /// `FULL OUTER JOIN`
    None,
    /// `LEFT JOIN`
    Local,
    /// `RIGHT JOIN`
    Foreign,
    /// `INNER JOIN`
    #[default]
    Both,
}

impl RequiredMode {
    pub fn join_keyword(self) -> &'static str {
        match self {
            RequiredMode::None => "FULL OUTER JOIN",
            RequiredMode::Local => "LEFT JOIN",
            RequiredMode::Foreign => "RIGHT JOIN",
            RequiredMode::Both => "INNER JOIN",
        }
    }
}

impl FromStr for RequiredMode {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RequiredMode::None),
            "local" => Ok(RequiredMode::Local),
            "foreign" => Ok(RequiredMode::Foreign),
            "both" => Ok(RequiredMode::Both),
            other => Err(BuildError::InvalidJoinRequiredMode(other.to_string())),
        }
    }
}

/// ON clause source of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// Explicit condition tree.
    Conditions(Vec<Condition>),
    /// `<table>.<local> = <join table>.<foreign>`; `None` uses the configured
    /// primary key. A `:` prefix makes a key a raw column reference.
    Keys {
        local: Option<String>,
        foreign: Option<String>,
    },
    /// No ON clause at all.
    Cross,
}

/// A join against another table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub table: String,
    pub on: JoinOn,
    pub required: RequiredMode,
}

impl JoinSpec {
    /// Inner join on the default keys.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on: JoinOn::Keys {
                local: None,
                foreign: None,
            },
            required: RequiredMode::Both,
        }
    }

    /// `CROSS JOIN table`
    pub fn cross(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on: JoinOn::Cross,
            required: RequiredMode::Both,
        }
    }

    /// Use an explicit ON condition tree.
    pub fn on(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.on = JoinOn::Conditions(conditions.into_iter().collect());
        self
    }

    /// Use DSL input for the ON clause.
    pub fn conditions(self, conditions: impl IntoConditions) -> Result<Self, BuildError> {
        Ok(self.on(conditions.into_conditions()?))
    }

    /// Column of the statement's own table.
    pub fn local(mut self, key: impl Into<String>) -> Self {
        if let JoinOn::Keys { local, .. } = &mut self.on {
            *local = Some(key.into());
        } else {
            self.on = JoinOn::Keys {
                local: Some(key.into()),
                foreign: None,
            };
        }
        self
    }

    /// Column of the joined table.
    pub fn foreign(mut self, key: impl Into<String>) -> Self {
        if let JoinOn::Keys { foreign, .. } = &mut self.on {
            *foreign = Some(key.into());
        } else {
            self.on = JoinOn::Keys {
                local: None,
                foreign: Some(key.into()),
            };
        }
        self
    }

    pub fn required(mut self, mode: RequiredMode) -> Self {
        self.required = mode;
        self
    }

    /// Parse `{ table, conditions?, local?, foreign?, required?, cross? }`.
    pub fn from_json(input: &serde_json::Value) -> Result<Self, BuildError> {
        let map = match input {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(BuildError::InvalidJoinSpec(
                    json_type_name(other).to_string(),
                ));
            }
        };

        let table = match map.get("table") {
            Some(serde_json::Value::String(table)) if !table.is_empty() => table.clone(),
            _ => return Err(BuildError::MissingJoinTable),
        };

        let required = match map.get("required") {
            None | Some(serde_json::Value::Null) => RequiredMode::Both,
            Some(serde_json::Value::String(mode)) => mode.parse()?,
            Some(other) => {
                return Err(BuildError::InvalidJoinRequiredMode(other.to_string()));
            }
        };

        let cross = matches!(map.get("cross"), Some(serde_json::Value::Bool(true)));
        let on = match map.get("conditions") {
            _ if cross => JoinOn::Cross,
            Some(conditions) if !conditions.is_null() => {
                JoinOn::Conditions(parse_conditions(conditions)?)
            }
            _ => JoinOn::Keys {
                local: string_field(map, "local"),
                foreign: string_field(map, "foreign"),
            },
        };

        Ok(Self {
            table,
            on,
            required,
        })
    }
}

fn string_field(map: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Action taken when an INSERT hits a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<Assignment>),
}

/// `ON CONFLICT (keys) DO ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictSpec {
    pub keys: Vec<String>,
    pub action: ConflictAction,
}

/// Page window requested by [`QueryBuilder::paginated`](crate::QueryBuilder::paginated).
///
/// `count` is accepted as an alias of `limit` when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default, alias = "count")]
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }
}

/// What a single-row statement resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum First {
    /// The first row.
    Row,
    /// One column of the first row.
    Value(String),
}

/// Everything a builder has accumulated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub command: Command,
    pub table: String,
    /// Select keys for SELECT, RETURNING keys for INSERT/UPDATE. Empty means `*`.
    pub keys: Vec<String>,
    pub conditions: Vec<Condition>,
    pub joins: Vec<JoinSpec>,
    pub sorting: Vec<String>,
    pub offset: u64,
    /// `None` (or zero) means unbounded.
    pub limit: Option<u64>,
    pub group_by: Option<String>,
    pub on_conflict: Option<ConflictSpec>,
    pub paginated: bool,
    pub first: Option<First>,
}

impl Statement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Whether rows carry the window-function total.
    pub fn has_window_total(&self) -> bool {
        self.paginated && self.first.is_none() && matches!(self.command, Command::Select)
    }
}

/// Key lists: `["a", "b"]` or `"a, b"`.
pub trait IntoKeys {
    fn into_keys(self) -> Vec<String>;
}

fn split_keys(keys: &str) -> Vec<String> {
    keys.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a `column:alias` key at its last single `:`; `::` casts are not
/// alias separators.
pub(crate) fn split_alias(key: &str) -> Option<(&str, &str)> {
    let bytes = key.as_bytes();
    let at = (1..bytes.len()).rev().find(|&i| {
        bytes[i] == b':' && bytes[i - 1] != b':' && bytes.get(i + 1) != Some(&b':')
    })?;
    Some((&key[..at], &key[at + 1..]))
}

impl IntoKeys for &str {
    fn into_keys(self) -> Vec<String> {
        split_keys(self)
    }
}

impl IntoKeys for String {
    fn into_keys(self) -> Vec<String> {
        split_keys(&self)
    }
}

impl IntoKeys for Vec<String> {
    fn into_keys(self) -> Vec<String> {
        self
    }
}

impl IntoKeys for Vec<&str> {
    fn into_keys(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl<const N: usize> IntoKeys for [&str; N] {
    fn into_keys(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

/// Join input: typed specs or the JSON form (one object or an array).
pub trait IntoJoins {
    fn into_joins(self) -> Result<Vec<JoinSpec>, BuildError>;
}

impl IntoJoins for JoinSpec {
    fn into_joins(self) -> Result<Vec<JoinSpec>, BuildError> {
        Ok(vec![self])
    }
}

impl IntoJoins for Vec<JoinSpec> {
    fn into_joins(self) -> Result<Vec<JoinSpec>, BuildError> {
        Ok(self)
    }
}

impl IntoJoins for &serde_json::Value {
    fn into_joins(self) -> Result<Vec<JoinSpec>, BuildError> {
        match self {
            // Null entries are skipped.
            serde_json::Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(JoinSpec::from_json)
                .collect(),
            serde_json::Value::Null => Ok(Vec::new()),
            single => Ok(vec![JoinSpec::from_json(single)?]),
        }
    }
}

impl IntoJoins for serde_json::Value {
    fn into_joins(self) -> Result<Vec<JoinSpec>, BuildError> {
        (&self).into_joins()
    }
}

/// INSERT/UPDATE payloads.
pub trait IntoKeyValues {
    fn into_key_values(self) -> Result<Vec<Assignment>, BuildError>;
}

pub(crate) fn parse_key_values(input: &serde_json::Value) -> Result<Vec<Assignment>, BuildError> {
    match input {
        serde_json::Value::Null => Err(BuildError::MissingKeyValues),
        serde_json::Value::Object(map) => Ok(map
            .iter()
            .map(|(key, value)| Assignment::new(key.as_str(), Value::from_json(value.clone())))
            .collect()),
        other => Err(BuildError::InvalidKeyValuesType(
            json_type_name(other).to_string(),
        )),
    }
}

impl IntoKeyValues for serde_json::Value {
    fn into_key_values(self) -> Result<Vec<Assignment>, BuildError> {
        parse_key_values(&self)
    }
}

impl IntoKeyValues for &serde_json::Value {
    fn into_key_values(self) -> Result<Vec<Assignment>, BuildError> {
        parse_key_values(self)
    }
}

impl IntoKeyValues for Vec<Assignment> {
    fn into_key_values(self) -> Result<Vec<Assignment>, BuildError> {
        Ok(self)
    }
}

impl<K: Into<String>, V: Into<Value>> IntoKeyValues for Vec<(K, V)> {
    fn into_key_values(self) -> Result<Vec<Assignment>, BuildError> {
        Ok(self
            .into_iter()
            .map(|(k, v)| Assignment::new(k, v))
            .collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> IntoKeyValues for [(K, V); N] {
    fn into_key_values(self) -> Result<Vec<Assignment>, BuildError> {
        Ok(self
            .into_iter()
            .map(|(k, v)| Assignment::new(k, v))
            .collect())
    }
}

/// Conflict actions: typed, or `{}` / `{ "nothing": true }` /
/// `{ "update": { ... } }`.
pub trait IntoConflictAction {
    fn into_conflict_action(self) -> Result<ConflictAction, BuildError>;
}

impl IntoConflictAction for ConflictAction {
    fn into_conflict_action(self) -> Result<ConflictAction, BuildError> {
        Ok(self)
    }
}

impl IntoConflictAction for &serde_json::Value {
    fn into_conflict_action(self) -> Result<ConflictAction, BuildError> {
        let map = match self {
            serde_json::Value::Null => return Ok(ConflictAction::DoNothing),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(BuildError::UnsupportedConflictAction(
                    json_type_name(other).to_string(),
                ));
            }
        };
        // Only the first key names the action.
        match map.iter().next() {
            None => Ok(ConflictAction::DoNothing),
            Some((key, _)) if key == "nothing" => Ok(ConflictAction::DoNothing),
            Some((key, payload)) if key == "update" => {
                let assignments = parse_key_values(payload)?;
                if assignments.is_empty() {
                    return Err(BuildError::MissingKeyValues);
                }
                Ok(ConflictAction::DoUpdate(assignments))
            }
            Some((key, _)) => Err(BuildError::UnsupportedConflictAction(key.clone())),
        }
    }
}

impl IntoConflictAction for serde_json::Value {
    fn into_conflict_action(self) -> Result<ConflictAction, BuildError> {
        (&self).into_conflict_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignment_classifies_values() {
        assert_eq!(Assignment::new("a", Value::Null).value, AssignValue::Null);
        assert_eq!(
            Assignment::new("a", ":now()").value,
            AssignValue::Raw("now()".into())
        );
        assert_eq!(
            Assignment::new("a", 3).value,
            AssignValue::Bind(Value::Int(3))
        );
    }

    #[test]
    fn keys_split_on_commas() {
        assert_eq!("id, name,email".into_keys(), vec!["id", "name", "email"]);
    }

    #[test]
    fn split_alias_skips_casts() {
        assert_eq!(split_alias("firstName:name"), Some(("firstName", "name")));
        assert_eq!(split_alias("price::numeric"), None);
        assert_eq!(
            split_alias("price::numeric:amount"),
            Some(("price::numeric", "amount"))
        );
    }

    #[test]
    fn join_from_json_defaults() {
        let join = JoinSpec::from_json(&json!({ "table": "posts" })).unwrap();
        assert_eq!(join, JoinSpec::new("posts"));
    }

    #[test]
    fn join_from_json_with_keys_and_mode() {
        let join = JoinSpec::from_json(&json!({
            "table": "posts",
            "local": "authorId",
            "required": "local",
        }))
        .unwrap();
        assert_eq!(join, JoinSpec::new("posts").local("authorId").required(RequiredMode::Local));
    }

    #[test]
    fn join_from_json_errors() {
        assert_eq!(
            JoinSpec::from_json(&json!({ "required": "both" })),
            Err(BuildError::MissingJoinTable)
        );
        assert_eq!(
            JoinSpec::from_json(&json!({ "table": "t", "required": "left" })),
            Err(BuildError::InvalidJoinRequiredMode("left".into()))
        );
        assert_eq!(
            JoinSpec::from_json(&json!("posts")),
            Err(BuildError::InvalidJoinSpec("string".into()))
        );
    }

    #[test]
    fn join_arrays_skip_nulls() {
        let joins = json!([{ "table": "a" }, null, { "table": "b", "cross": true }])
            .into_joins()
            .unwrap();
        assert_eq!(joins, vec![JoinSpec::new("a"), JoinSpec::cross("b")]);
    }

    #[test]
    fn conflict_actions() {
        assert_eq!(
            json!({}).into_conflict_action(),
            Ok(ConflictAction::DoNothing)
        );
        assert_eq!(
            json!({ "nothing": true }).into_conflict_action(),
            Ok(ConflictAction::DoNothing)
        );
        assert_eq!(
            json!({ "update": { "name": "x" } }).into_conflict_action(),
            Ok(ConflictAction::DoUpdate(vec![Assignment::new("name", "x")]))
        );
        assert_eq!(
            json!({ "merge": true }).into_conflict_action(),
            Err(BuildError::UnsupportedConflictAction("merge".into()))
        );
    }

    #[test]
    fn key_values_reject_non_objects() {
        assert_eq!(
            json!(null).into_key_values(),
            Err(BuildError::MissingKeyValues)
        );
        assert_eq!(
            json!([1]).into_key_values(),
            Err(BuildError::InvalidKeyValuesType("array".into()))
        );
    }

    #[test]
    fn pagination_accepts_count_alias() {
        let page: Pagination = serde_json::from_value(json!({ "offset": 20, "count": 10 })).unwrap();
        assert_eq!(page, Pagination::new(20, 10));
    }
}
