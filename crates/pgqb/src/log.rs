//! Statement logging.
//!
//! Statements are reported as `tracing` events on the `pgqb.sql` target just
//! before they are handed to an executor. Installing a subscriber is left to
//! the application.

use crate::compile::CompiledQuery;
use std::borrow::Cow;

/// SQL longer than this (in bytes) is cut in log events.
pub const MAX_LOGGED_SQL: usize = 200;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn log_statement(command: &str, query: &CompiledQuery) {
    let sql = if query.sql.len() > MAX_LOGGED_SQL {
        Cow::Owned(format!(
            "{}...",
            truncate_sql_bytes(&query.sql, MAX_LOGGED_SQL)
        ))
    } else {
        Cow::Borrowed(query.sql.as_str())
    };
    tracing::debug!(
        target: "pgqb.sql",
        command,
        param_count = query.params.len(),
        sql = %sql,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("abc", 10), "abc");
        assert_eq!(truncate_sql_bytes("abcdef", 3), "abc");
        // 'é' is two bytes; cutting inside it backs off.
        assert_eq!(truncate_sql_bytes("aé", 2), "a");
    }
}
