//! Join specs to JOIN clauses.

use super::conditions::ConditionCompiler;
use super::param::ParamList;
use crate::config::QbConfig;
use crate::error::BuildError;
use crate::ident::Caser;
use crate::statement::{JoinOn, JoinSpec};

/// Compiles the join list of a statement whose (cased) table is `table`.
pub struct JoinCompiler<'a> {
    config: &'a QbConfig,
    caser: &'a Caser,
    table: &'a str,
}

impl<'a> JoinCompiler<'a> {
    pub fn new(config: &'a QbConfig, caser: &'a Caser, table: &'a str) -> Self {
        Self {
            config,
            caser,
            table,
        }
    }

    /// All joins, space separated, in declaration order.
    pub fn compile(&self, joins: &[JoinSpec], params: &mut ParamList) -> Result<String, BuildError> {
        let mut parts = Vec::with_capacity(joins.len());
        for join in joins {
            parts.push(self.compile_one(join, params)?);
        }
        Ok(parts.join(" "))
    }

    fn compile_one(&self, join: &JoinSpec, params: &mut ParamList) -> Result<String, BuildError> {
        if join.table.is_empty() {
            return Err(BuildError::MissingJoinTable);
        }
        let table = self.caser.cased(&join.table, false);

        let on = match &join.on {
            JoinOn::Cross => return Ok(format!("CROSS JOIN {table}")),
            JoinOn::Conditions(conditions) => {
                let sql = ConditionCompiler::new(self.caser, params).compile_root(conditions)?;
                if sql.is_empty() { "TRUE".to_string() } else { sql }
            }
            JoinOn::Keys { local, foreign } => {
                let local = local.as_deref().unwrap_or(&self.config.default_primary_key);
                let foreign = foreign.as_deref().unwrap_or(&self.config.default_primary_key);
                let lhs = match local.strip_prefix(':') {
                    Some(raw) => raw.to_string(),
                    None => format!("{}.{}", self.table, self.caser.cased(local, false)),
                };
                let rhs = match foreign.strip_prefix(':') {
                    Some(raw) => raw.to_string(),
                    None => format!("{table}.{}", self.caser.cased(foreign, false)),
                };
                format!("{lhs} = {rhs}")
            }
        };

        Ok(format!("{} {table} ON {on}", join.required.join_keyword()))
    }
}
