//! Error types for pgqb

use crate::condition::Comparer;
use thiserror::Error;

/// Result type alias for pgqb operations
pub type QbResult<T> = Result<T, QbError>;

/// Validation failures raised while a statement is being described or compiled.
///
/// These are programmer errors: they are reported before anything is sent to the
/// database and are never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Condition input was absent (`null`).
    #[error("Conditions must be provided")]
    MissingConditions,

    /// Condition input was neither a mapping nor an array of mappings.
    #[error("Conditions must be an object or an array of objects, got {0}")]
    InvalidConditionsType(String),

    /// A `$`-prefixed key that is not a logical or comparison modifier.
    #[error("Unknown modifier {0}")]
    UnknownModifier(String),

    /// A `null` value compared with something other than `$eq` / `$ne`.
    #[error("Modifier {0} is not usable with null values")]
    UnsupportedNullComparer(Comparer),

    /// Join spec without a table.
    #[error("Missing table in join")]
    MissingJoinTable,

    /// Join entry that is not a mapping.
    #[error("Join spec must be an object, got {0}")]
    InvalidJoinSpec(String),

    /// `required` outside of `none`, `local`, `foreign`, `both`.
    #[error("Invalid join required mode `{0}`; expected one of none, local, foreign, both")]
    InvalidJoinRequiredMode(String),

    /// `on_conflict` on anything but an INSERT.
    #[error("on_conflict is only available when inserting")]
    OnConflictRequiresInsert,

    /// Conflict action other than `nothing` / `update`.
    #[error("Unsupported conflict action `{0}`; expected `nothing` or `update`")]
    UnsupportedConflictAction(String),

    /// `DO UPDATE` without conflict target columns.
    #[error("on_conflict update needs at least one target key")]
    MissingConflictTarget,

    /// INSERT/UPDATE payload was absent (or UPDATE had nothing to set).
    #[error("Keys and values must be provided")]
    MissingKeyValues,

    /// INSERT/UPDATE payload was not a mapping.
    #[error("Keys and values must be an object, got {0}")]
    InvalidKeyValuesType(String),
}

/// Error types for building and executing statements
#[derive(Debug, Error)]
pub enum QbError {
    /// Statement description or compilation error
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Failure reported by a custom executor, passed through untouched
    #[error("Executor error: {0}")]
    Executor(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl QbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary executor failure
    pub fn executor(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Executor(err.into())
    }

    /// The validation error, if this is one.
    pub fn as_build_error(&self) -> Option<&BuildError> {
        match self {
            Self::Build(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this error was raised before anything reached the database
    pub fn is_build_error(&self) -> bool {
        matches!(self, Self::Build(_))
    }
}

/// Short JSON type name used in validation messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
