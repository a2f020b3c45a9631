//! Ordered parameter storage shared by every clause of one statement.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Bound values in placeholder order: `$k` refers to the `k`-th pushed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: impl Into<Value>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    /// Add a value and return its `$n` placeholder.
    pub fn placeholder(&mut self, value: impl Into<Value>) -> String {
        format!("${}", self.push(value))
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.params
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_one_based_index() {
        let mut params = ParamList::new();
        assert_eq!(params.push(10), 1);
        assert_eq!(params.placeholder("x"), "$2");
        assert_eq!(params.len(), 2);
        assert_eq!(params.as_slice()[1], Value::Text("x".into()));
    }
}
