//! Statement assembly.
//!
//! Every clause of one statement shares a single [`ParamList`], so placeholders
//! are numbered in the order they appear in the SQL text.

use super::conditions::ConditionCompiler;
use super::joins::JoinCompiler;
use super::param::ParamList;
use super::CompiledQuery;
use crate::config::QbConfig;
use crate::error::BuildError;
use crate::ident::Caser;
use crate::statement::{
    AssignValue, Assignment, Command, ConflictAction, Statement, split_alias,
};

/// Window column added to paginated selects.
const WINDOW_TOTAL: &str = "COUNT(*) OVER() AS total";

pub(crate) struct ClauseAssembler<'a> {
    statement: &'a Statement,
    config: &'a QbConfig,
    caser: Caser,
    table: String,
    params: ParamList,
}

impl<'a> ClauseAssembler<'a> {
    pub(crate) fn new(statement: &'a Statement, config: &'a QbConfig) -> Self {
        let caser = Caser::new(config);
        let table = caser.cased(&statement.table, false);
        Self {
            statement,
            config,
            caser,
            table,
            params: ParamList::new(),
        }
    }

    pub(crate) fn assemble(mut self) -> Result<CompiledQuery, BuildError> {
        let statement = self.statement;
        if statement.on_conflict.is_some() && !statement.command.is_insert() {
            return Err(BuildError::OnConflictRequiresInsert);
        }

        let parts = match &statement.command {
            Command::Select => self.select()?,
            Command::Update(assignments) => self.update(assignments)?,
            Command::Insert(assignments) => self.insert(assignments)?,
            Command::Delete => self.delete()?,
        };
        Ok(self.finish(parts))
    }

    /// Count-only form: same table, joins and WHERE; no paging or sorting.
    pub(crate) fn assemble_count(mut self) -> Result<CompiledQuery, BuildError> {
        let joins = self.joins()?;
        let filter = self.where_clause()?;

        let parts = match self.group_by() {
            Some(group) => {
                let inner = join_parts(vec![
                    "SELECT 1 FROM".to_string(),
                    self.table.clone(),
                    joins,
                    filter,
                    group,
                ]);
                vec![format!("SELECT count(*) AS count FROM ({inner}) AS t")]
            }
            None => vec![
                "SELECT count(*) AS count FROM".to_string(),
                self.table.clone(),
                joins,
                filter,
            ],
        };
        Ok(self.finish(parts))
    }

    fn finish(self, parts: Vec<String>) -> CompiledQuery {
        CompiledQuery {
            sql: join_parts(parts),
            params: self.params.into_vec(),
        }
    }

    fn select(&mut self) -> Result<Vec<String>, BuildError> {
        let keys = self.keys(self.statement.has_window_total());
        let joins = self.joins()?;
        let filter = self.where_clause()?;
        Ok(vec![
            "SELECT".to_string(),
            keys,
            "FROM".to_string(),
            self.table.clone(),
            joins,
            filter,
            self.group_by().unwrap_or_default(),
            self.sorting(),
            self.offset(),
            self.limit(),
        ])
    }

    fn update(&mut self, assignments: &[Assignment]) -> Result<Vec<String>, BuildError> {
        if assignments.is_empty() {
            return Err(BuildError::MissingKeyValues);
        }
        let set = self.set_list(assignments);
        let filter = self.where_clause()?;
        Ok(vec![
            "UPDATE".to_string(),
            self.table.clone(),
            set,
            filter,
            "RETURNING".to_string(),
            self.keys(false),
        ])
    }

    fn insert(&mut self, assignments: &[Assignment]) -> Result<Vec<String>, BuildError> {
        let values = if assignments.is_empty() {
            "DEFAULT VALUES".to_string()
        } else {
            let columns: Vec<String> = assignments
                .iter()
                .map(|a| self.caser.cased(&a.column, true))
                .collect();
            let values: Vec<String> = assignments
                .iter()
                .map(|a| self.assign_value(&a.value))
                .collect();
            format!("({}) VALUES ({})", columns.join(", "), values.join(", "))
        };
        let conflict = self.on_conflict()?;
        Ok(vec![
            "INSERT INTO".to_string(),
            self.table.clone(),
            values,
            conflict,
            "RETURNING".to_string(),
            self.keys(false),
        ])
    }

    fn delete(&mut self) -> Result<Vec<String>, BuildError> {
        let filter = self.where_clause()?;
        Ok(vec!["DELETE FROM".to_string(), self.table.clone(), filter])
    }

    /// Projection or RETURNING list.
    fn keys(&self, window_total: bool) -> String {
        let mut keys: Vec<String> = if self.statement.keys.is_empty() {
            vec!["*".to_string()]
        } else {
            self.statement.keys.iter().map(|k| self.key(k)).collect()
        };
        if window_total {
            keys.push(WINDOW_TOTAL.to_string());
        }
        keys.join(", ")
    }

    fn key(&self, key: &str) -> String {
        if let Some(raw) = key.strip_prefix(':') {
            return raw.to_string();
        }
        let (expr, alias) = match split_alias(key) {
            Some((expr, alias)) => (expr, Some(alias)),
            None => (key, None),
        };
        let column = match expr.split_once("::") {
            Some((column, cast)) => format!("{}::{cast}", self.caser.cased(column, true)),
            None => self.caser.cased(expr, true),
        };
        match alias {
            Some(alias) => format!("{column} AS {}", self.caser.cased(alias, false)),
            None => column,
        }
    }

    fn joins(&mut self) -> Result<String, BuildError> {
        JoinCompiler::new(self.config, &self.caser, &self.table)
            .compile(&self.statement.joins, &mut self.params)
    }

    fn where_clause(&mut self) -> Result<String, BuildError> {
        if self.statement.conditions.is_empty() {
            return Ok(String::new());
        }
        let sql = ConditionCompiler::new(&self.caser, &mut self.params)
            .compile_root(&self.statement.conditions)?;
        if sql.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!("WHERE {sql}"))
        }
    }

    fn group_by(&self) -> Option<String> {
        self.statement
            .group_by
            .as_deref()
            .map(|key| format!("GROUP BY {}", self.sort_key(key)))
    }

    fn sorting(&self) -> String {
        if self.statement.sorting.is_empty() {
            return String::new();
        }
        let keys: Vec<String> = self
            .statement
            .sorting
            .iter()
            .map(|key| match key.strip_prefix('-') {
                Some(desc) => format!("{} DESC", self.sort_key(desc)),
                None => self.sort_key(key),
            })
            .collect();
        format!("ORDER BY {}", keys.join(", "))
    }

    fn sort_key(&self, key: &str) -> String {
        match key.strip_prefix(':') {
            Some(raw) => raw.to_string(),
            None => self.caser.cased(key, true),
        }
    }

    fn offset(&self) -> String {
        match self.statement.offset {
            0 => String::new(),
            n => format!("OFFSET {n}"),
        }
    }

    fn limit(&self) -> String {
        match self.statement.limit {
            None | Some(0) => String::new(),
            Some(n) => format!("LIMIT {n}"),
        }
    }

    fn set_list(&mut self, assignments: &[Assignment]) -> String {
        let pairs: Vec<String> = assignments
            .iter()
            .map(|a| {
                let column = self.caser.cased(&a.column, true);
                format!("{column} = {}", self.assign_value(&a.value))
            })
            .collect();
        format!("SET {}", pairs.join(", "))
    }

    fn assign_value(&mut self, value: &AssignValue) -> String {
        match value {
            AssignValue::Null => "NULL".to_string(),
            AssignValue::Raw(sql) => sql.clone(),
            AssignValue::Bind(v) => self.params.placeholder(v.clone()),
        }
    }

    fn on_conflict(&mut self) -> Result<String, BuildError> {
        let statement = self.statement;
        let Some(spec) = &statement.on_conflict else {
            return Ok(String::new());
        };
        let target = if spec.keys.is_empty() {
            String::new()
        } else {
            let keys: Vec<String> = spec.keys.iter().map(|k| self.caser.cased(k, true)).collect();
            format!(" ({})", keys.join(", "))
        };
        match &spec.action {
            ConflictAction::DoNothing => Ok(format!("ON CONFLICT{target} DO NOTHING")),
            ConflictAction::DoUpdate(_) if spec.keys.is_empty() => {
                Err(BuildError::MissingConflictTarget)
            }
            ConflictAction::DoUpdate(assignments) => Ok(format!(
                "ON CONFLICT{target} DO UPDATE {}",
                self.set_list(assignments)
            )),
        }
    }
}

/// Space-join the non-empty parts.
fn join_parts(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
