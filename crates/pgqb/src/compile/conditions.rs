//! Condition trees to boolean SQL.

use super::param::ParamList;
use crate::condition::{Comparer, Condition, LogicalOp, Modifier};
use crate::error::BuildError;
use crate::ident::Caser;
use crate::value::Value;

/// Compiles condition trees, pushing bound values into a shared [`ParamList`].
pub struct ConditionCompiler<'a> {
    caser: &'a Caser,
    params: &'a mut ParamList,
}

impl<'a> ConditionCompiler<'a> {
    pub fn new(caser: &'a Caser, params: &'a mut ParamList) -> Self {
        Self { caser, params }
    }

    /// Compile a top-level sequence (WHERE / ON): ANDed, equality, unwrapped.
    pub fn compile_root(&mut self, conditions: &[Condition]) -> Result<String, BuildError> {
        self.compile(conditions, LogicalOp::And, Comparer::Eq, false)
    }

    /// Compile `conditions` joined by `operator`, comparing leaves with
    /// `comparer`. Empty fragments are dropped; a non-empty result is
    /// parenthesized when `wrap` is set.
    pub fn compile(
        &mut self,
        conditions: &[Condition],
        operator: LogicalOp,
        comparer: Comparer,
        wrap: bool,
    ) -> Result<String, BuildError> {
        let mut parts = Vec::with_capacity(conditions.len());

        for condition in conditions {
            let sql = match condition {
                Condition::Group {
                    modifier: Modifier::Logical(op),
                    children,
                } => self.compile(children, *op, comparer, *op != operator)?,
                Condition::Group {
                    modifier: Modifier::Compare(inner),
                    children,
                } => self.compile(children, operator, *inner, false)?,
                Condition::Raw { expr, value } => self.raw(expr, value, comparer)?,
                Condition::Leaf { key, value } => {
                    let column = self.column(key);
                    self.leaf(&column, value, comparer)?
                }
            };
            if !sql.is_empty() {
                parts.push(sql);
            }
        }

        let sep = format!(" {} ", operator.keyword());
        let joined = parts.join(&sep);
        if wrap && !joined.is_empty() {
            Ok(format!("({joined})"))
        } else {
            Ok(joined)
        }
    }

    /// Qualified keys are cased as a path; bare keys are quoted unless marked
    /// with `!`.
    fn column(&self, key: &str) -> String {
        if key.contains('.') {
            self.caser.cased(key, false)
        } else if let Some(bare) = key.strip_prefix('!') {
            self.caser.cased(bare, false)
        } else {
            self.caser.cased(key, true)
        }
    }

    fn leaf(&mut self, column: &str, value: &Value, comparer: Comparer) -> Result<String, BuildError> {
        if value.is_null() {
            return null_check(column, comparer);
        }
        let idx = self.params.push(value.clone());
        Ok(format!("{column} {} ${idx}", comparer.symbol()))
    }

    fn raw(&mut self, expr: &str, value: &Value, comparer: Comparer) -> Result<String, BuildError> {
        if value.is_null() {
            return null_check(expr, comparer);
        }
        Ok(format!(
            "{expr} {} {}",
            comparer.symbol(),
            value.to_sql_literal(self.caser)
        ))
    }
}

fn null_check(lhs: &str, comparer: Comparer) -> Result<String, BuildError> {
    match comparer {
        Comparer::Eq => Ok(format!("{lhs} IS NULL")),
        Comparer::Ne => Ok(format!("{lhs} IS NOT NULL")),
        other => Err(BuildError::UnsupportedNullComparer(other)),
    }
}
