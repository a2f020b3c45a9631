//! The fluent statement builder.
//!
//! Builder methods consume and return the builder. They never fail mid-chain:
//! the first invalid input is remembered and reported by [`QueryBuilder::build`]
//! or the execution methods, before anything reaches the executor.
//!
//! # Example
//! ```ignore
//! use pgqb::{Pagination, table};
//! use serde_json::json;
//!
//! let page = table("users")
//!     .select("id, firstName, email")
//!     .filter(json!({ "active": true, "$gte": { "createdAt": "2024-01-01T00:00:00Z" } }))
//!     .sorted("-createdAt")
//!     .paginated(Pagination::new(0, 20))
//!     .fetch_page(&client)
//!     .await?;
//! ```

use crate::compile::{CompiledQuery, compile};
use crate::condition::IntoConditions;
use crate::config::QbConfig;
use crate::error::{BuildError, QbResult};
use crate::executor::{Executor, Row};
use crate::ident::Caser;
use crate::log::log_statement;
use crate::paginate::{self, Page};
use crate::statement::{
    Command, ConflictAction, ConflictSpec, First, IntoConflictAction, IntoJoins, IntoKeyValues, IntoKeys,
    Pagination, Statement, split_alias,
};
use serde::Serialize;
use std::sync::Arc;

/// Start a builder for `table` with the default configuration.
pub fn table(name: &str) -> QueryBuilder {
    QueryBuilder::new(name)
}

/// What an executed statement resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// Every returned row.
    Rows(Vec<Row>),
    /// `first()`, `insert` and `update`.
    Row(Option<Row>),
    /// `first_value(key)` and `count`.
    Value(Option<serde_json::Value>),
    /// `paginated(..)`.
    Page(Page),
}

/// Accumulates one statement against one table.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: Arc<QbConfig>,
    statement: Statement,
    build_error: Option<BuildError>,
}

impl QueryBuilder {
    /// Create a builder with the default configuration.
    pub fn new(table: &str) -> Self {
        Self::with_config(table, Arc::new(QbConfig::default()))
    }

    /// Create a builder sharing `config`.
    pub fn with_config(table: &str, config: Arc<QbConfig>) -> Self {
        Self {
            config,
            statement: Statement::new(table),
            build_error: None,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn config(&self) -> &QbConfig {
        &self.config
    }

    /// The first recorded input error, if any.
    pub fn error(&self) -> Option<&BuildError> {
        self.build_error.as_ref()
    }

    fn record<T>(&mut self, result: Result<T, BuildError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                if self.build_error.is_none() {
                    self.build_error = Some(e);
                }
                None
            }
        }
    }

    // ==================== Projection ====================

    /// Append projection (or RETURNING) keys.
    ///
    /// `:expr` is written verbatim, `column:alias` renders `"column" AS alias`.
    pub fn select(mut self, keys: impl IntoKeys) -> Self {
        self.statement.keys.extend(keys.into_keys());
        self
    }

    /// Resolve to the number of rows matching, counting `key` (`*` for all rows).
    pub fn count(mut self, key: &str) -> Self {
        let projection = if key == "*" {
            ":count(*) AS count".to_string()
        } else {
            let caser = Caser::new(&self.config);
            format!(
                ":count({}.{}) AS count",
                caser.cased(&self.statement.table, false),
                caser.cased(key, false)
            )
        };
        self.statement.keys = vec![projection];
        self.statement.limit = Some(1);
        self.statement.first = Some(First::Value("count".to_string()));
        self
    }

    /// Resolve to the first row.
    pub fn first(mut self) -> Self {
        self.statement.limit = Some(1);
        self.statement.first = Some(First::Row);
        self
    }

    /// Select `key` and resolve to its value in the first row.
    pub fn first_value(mut self, key: &str) -> Self {
        self.statement.keys.push(key.to_string());
        self.statement.limit = Some(1);
        self.statement.first = Some(First::Value(key.to_string()));
        self
    }

    // ==================== Commands ====================

    /// Turn this into an UPDATE resolving to the first updated row.
    pub fn update(mut self, values: impl IntoKeyValues) -> Self {
        let assignments = match values.into_key_values() {
            Ok(a) if a.is_empty() => Err(BuildError::MissingKeyValues),
            other => other,
        };
        if let Some(assignments) = self.record(assignments) {
            self.statement.command = Command::Update(assignments);
        }
        self.statement.first = Some(First::Row);
        self
    }

    /// Turn this into an INSERT resolving to the inserted row.
    ///
    /// An empty payload inserts `DEFAULT VALUES`.
    pub fn insert(mut self, values: impl IntoKeyValues) -> Self {
        if let Some(assignments) = self.record(values.into_key_values()) {
            self.statement.command = Command::Insert(assignments);
        }
        self.statement.first = Some(First::Row);
        self
    }

    /// Turn this into a DELETE.
    pub fn delete(mut self) -> Self {
        self.statement.command = Command::Delete;
        self
    }

    /// Add `ON CONFLICT (keys) DO ...`; only valid after [`insert`](Self::insert).
    ///
    /// `DO NOTHING` may omit the target keys, `DO UPDATE` may not.
    pub fn on_conflict(mut self, keys: impl IntoKeys, action: impl IntoConflictAction) -> Self {
        if !self.statement.command.is_insert() {
            self.record::<()>(Err(BuildError::OnConflictRequiresInsert));
            return self;
        }
        let keys = keys.into_keys();
        let spec = action.into_conflict_action().and_then(|action| match action {
            ConflictAction::DoUpdate(_) if keys.is_empty() => {
                Err(BuildError::MissingConflictTarget)
            }
            action => Ok(ConflictSpec { keys, action }),
        });
        if let Some(spec) = self.record(spec) {
            self.statement.on_conflict = Some(spec);
        }
        self
    }

    // ==================== Filtering ====================

    /// Append WHERE conditions (ANDed with earlier ones).
    pub fn filter(mut self, conditions: impl IntoConditions) -> Self {
        if let Some(conditions) = self.record(conditions.into_conditions()) {
            self.statement.conditions.extend(conditions);
        }
        self
    }

    /// Append joins.
    pub fn join(mut self, joins: impl IntoJoins) -> Self {
        if let Some(joins) = self.record(joins.into_joins()) {
            self.statement.joins.extend(joins);
        }
        self
    }

    pub fn group_by(mut self, key: impl Into<String>) -> Self {
        self.statement.group_by = Some(key.into());
        self
    }

    // ==================== Ordering / paging ====================

    /// Replace the sort keys. `-key` sorts descending, `:expr` is raw.
    pub fn sorted(mut self, keys: impl IntoKeys) -> Self {
        self.statement.sorting = keys.into_keys();
        self
    }

    pub fn offset_by(mut self, offset: u64) -> Self {
        self.statement.offset = offset;
        self
    }

    /// Limit the row count; `0` means unbounded.
    pub fn limit_to(mut self, limit: u64) -> Self {
        self.statement.limit = Some(limit);
        self
    }

    /// Page through results; execution resolves to a [`Page`].
    pub fn paginated(mut self, page: Pagination) -> Self {
        self.statement.offset = page.offset;
        self.statement.limit = page.limit;
        self.statement.paginated = true;
        self
    }

    // ==================== Build / execute ====================

    /// Compile to SQL and parameters.
    pub fn build(&self) -> QbResult<CompiledQuery> {
        if let Some(err) = &self.build_error {
            return Err(err.clone().into());
        }
        Ok(compile(&self.statement, &self.config)?)
    }

    async fn run<E: Executor>(&self, executor: &E) -> QbResult<Vec<Row>> {
        let compiled = self.build()?;
        log_statement(self.statement.command.name(), &compiled);
        executor.query(&compiled.sql, &compiled.params).await
    }

    /// Execute and resolve according to the builder state.
    pub async fn exec<E: Executor>(self, executor: &E) -> QbResult<QueryOutput> {
        let rows = self.run(executor).await?;
        if self.statement.has_window_total() {
            let page = paginate::complete(&self.statement, &self.config, executor, rows).await?;
            return Ok(QueryOutput::Page(page));
        }
        Ok(match &self.statement.first {
            None => QueryOutput::Rows(rows),
            Some(First::Row) => QueryOutput::Row(rows.into_iter().next()),
            Some(First::Value(key)) => {
                QueryOutput::Value(rows.first().and_then(|row| self.lookup(row, key)))
            }
        })
    }

    /// Execute and return every row (window totals stripped).
    pub async fn fetch_all<E: Executor>(self, executor: &E) -> QbResult<Vec<Row>> {
        let rows = self.run(executor).await?;
        if self.statement.has_window_total() {
            let page = paginate::complete(&self.statement, &self.config, executor, rows).await?;
            return Ok(page.items);
        }
        Ok(rows)
    }

    /// Execute and return the first row, if any.
    pub async fn fetch_first<E: Executor>(self, executor: &E) -> QbResult<Option<Row>> {
        Ok(self.fetch_all(executor).await?.into_iter().next())
    }

    /// Execute and return one value of the first row: the `first_value`/`count`
    /// key, or else the only column (ignoring a paginated statement's window
    /// total).
    pub async fn fetch_value<E: Executor>(
        self,
        executor: &E,
    ) -> QbResult<Option<serde_json::Value>> {
        let mut rows = self.run(executor).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        if self.statement.has_window_total() {
            rows = paginate::complete(&self.statement, &self.config, executor, rows)
                .await?
                .items;
        }
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        Ok(match &self.statement.first {
            Some(First::Value(key)) => self.lookup(row, key),
            _ if row.len() == 1 => row.values().next().cloned(),
            _ => None,
        })
    }

    /// Execute and return a [`Page`]. Unpaginated statements report all rows.
    pub async fn fetch_page<E: Executor>(self, executor: &E) -> QbResult<Page> {
        let rows = self.run(executor).await?;
        if self.statement.has_window_total() {
            return paginate::complete(&self.statement, &self.config, executor, rows).await;
        }
        Ok(Page {
            total: i64::try_from(rows.len()).unwrap_or(i64::MAX),
            items: rows,
        })
    }

    /// Find `key` in a row under its written, database and caller names.
    fn lookup(&self, row: &Row, key: &str) -> Option<serde_json::Value> {
        let key = key.strip_prefix(':').unwrap_or(key);
        let name = split_alias(key).map_or(key, |(_, alias)| alias);
        let name = name.split("::").next().unwrap_or(name);
        let name = name.rsplit('.').next().unwrap_or(name);

        let caser = Caser::new(&self.config);
        let db = caser.cased(name, false);
        let external = caser.external(&db);
        [name, db.as_str(), external.as_str()]
            .into_iter()
            .find_map(|candidate| row.get(candidate).cloned())
            .or_else(|| (row.len() == 1).then(|| row.values().next().cloned()).flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_error_wins() {
        let qb = table("users")
            .filter(json!(null))
            .join(json!({ "required": "both" }));
        assert_eq!(qb.error(), Some(&BuildError::MissingConditions));
        assert!(qb.build().unwrap_err().is_build_error());
    }

    #[test]
    fn on_conflict_requires_insert() {
        let qb = table("users").on_conflict("email", json!({}));
        assert_eq!(qb.error(), Some(&BuildError::OnConflictRequiresInsert));
    }

    #[test]
    fn update_requires_values() {
        let qb = table("users").update(json!({}));
        assert_eq!(qb.error(), Some(&BuildError::MissingKeyValues));
    }

    #[test]
    fn lookup_tries_cased_names() {
        let qb = table("users");
        let row = json!({ "created_at": 1 }).as_object().cloned().unwrap_or_default();
        assert_eq!(qb.lookup(&row, "createdAt"), Some(json!(1)));

        let row = json!({ "createdAt": 2 }).as_object().cloned().unwrap_or_default();
        assert_eq!(qb.lookup(&row, "users.createdAt"), Some(json!(2)));
    }

    #[test]
    fn build_is_repeatable() {
        let qb = table("users").filter(json!({ "a": 1 })).sorted("-a");
        assert_eq!(qb.build().unwrap(), qb.build().unwrap());
    }
}
