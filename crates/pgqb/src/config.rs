//! Builder configuration.
//!
//! A [`QbConfig`] is created once, wrapped in an `Arc` and shared by every
//! builder made from it. It is never mutated after construction; each field
//! keeps its default unless it is set explicitly.

use crate::builder::QueryBuilder;
use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::Deserialize;
use std::sync::Arc;

/// A naming convention for identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `created_at`
    #[default]
    Snake,
    /// `createdAt`
    Camel,
    /// `CreatedAt`
    Pascal,
    /// `created-at`
    Kebab,
    /// `CREATED_AT`
    ScreamingSnake,
    /// Leave names untouched.
    Preserve,
}

impl NamingConvention {
    /// Convert a single word-like name into this convention.
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Snake => name.to_snake_case(),
            Self::Camel => name.to_lower_camel_case(),
            Self::Pascal => name.to_upper_camel_case(),
            Self::Kebab => name.to_kebab_case(),
            Self::ScreamingSnake => name.to_shouty_snake_case(),
            Self::Preserve => name.to_string(),
        }
    }
}

/// Configuration shared by query builders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QbConfig {
    /// Convention of identifiers as stored in the database.
    pub db_case: NamingConvention,
    /// Convention callers use for keys, applied to returned rows by
    /// [`CasedExecutor`](crate::CasedExecutor).
    pub external_case: NamingConvention,
    /// Column used when a join does not name its keys.
    pub default_primary_key: String,
}

impl Default for QbConfig {
    fn default() -> Self {
        Self {
            db_case: NamingConvention::Snake,
            external_case: NamingConvention::Camel,
            default_primary_key: "id".to_string(),
        }
    }
}

impl QbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database naming convention.
    pub fn db_case(mut self, convention: NamingConvention) -> Self {
        self.db_case = convention;
        self
    }

    /// Set the caller-facing naming convention.
    pub fn external_case(mut self, convention: NamingConvention) -> Self {
        self.external_case = convention;
        self
    }

    /// Set the default primary key used by joins.
    pub fn default_primary_key(mut self, key: impl Into<String>) -> Self {
        self.default_primary_key = key.into();
        self
    }

    /// Freeze this configuration for sharing between builders.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Start a builder for `table` that uses this configuration.
    ///
    /// # Example
    /// ```ignore
    /// let config = QbConfig::new().default_primary_key("uid").shared();
    /// let users = config.table("users").filter(json!({ "active": true }));
    /// ```
    pub fn table(self: &Arc<Self>, table: &str) -> QueryBuilder {
        QueryBuilder::with_config(table, Arc::clone(self))
    }
}
