//! Shared helpers for integration tests.

#![allow(dead_code)]

use pgqb::{Executor, QbError, QbResult, Row, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a row from a JSON object literal.
pub fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

/// A recorded executor call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Replays canned responses in order and records every statement it receives.
///
/// Once the script runs out, further calls return no rows.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<Vec<Row>, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next call.
    pub fn respond(self, rows: Vec<Row>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    /// Queue a failure for the next call.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for ScriptedExecutor {
    async fn query(&self, sql: &str, params: &[Value]) -> QbResult<Vec<Row>> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(QbError::executor(message)),
            None => Ok(Vec::new()),
        }
    }
}
