//! Statement compilation.
//!
//! [`compile`] turns a [`Statement`] into SQL text plus its ordered
//! parameters. It is pure: compiling the same statement with the same
//! configuration always yields byte-identical output.
//!
//! ```ignore
//! let compiled = compile(&statement, &QbConfig::default())?;
//! client.query(&compiled.sql, &compiled.params_ref()).await?;
//! ```

mod clauses;
mod conditions;
mod joins;
mod param;


pub use conditions::ConditionCompiler;
pub use joins::JoinCompiler;
pub use param::ParamList;

use crate::config::QbConfig;
use crate::error::BuildError;
use crate::statement::Statement;
use crate::value::Value;
use clauses::ClauseAssembler;
use tokio_postgres::types::ToSql;

/// SQL text and the values for its `$n` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    /// Parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Compile a full statement.
pub fn compile(statement: &Statement, config: &QbConfig) -> Result<CompiledQuery, BuildError> {
    ClauseAssembler::new(statement, config).assemble()
}

/// Compile the count-only companion of a select: same table, joins, WHERE and
/// grouping; no projection, sorting or paging.
pub fn compile_count(statement: &Statement, config: &QbConfig) -> Result<CompiledQuery, BuildError> {
    ClauseAssembler::new(statement, config).assemble_count()
}
