//! Paginated results with a total count.
//!
//! A paginated select carries `COUNT(*) OVER() AS total` in its projection, so
//! a non-empty page reports the total in every row. An empty page (an offset
//! past the last match, or no matches at all) has no row to read the total
//! from; a second count-only statement is then run to obtain it.

use crate::compile::compile_count;
use crate::config::QbConfig;
use crate::error::{QbError, QbResult};
use crate::executor::{Executor, Row};
use crate::ident::Caser;
use crate::log::log_statement;
use crate::statement::Statement;
use serde::Serialize;
use tracing::{debug, trace};

/// Column holding the window-function total.
pub const TOTAL_COLUMN: &str = "total";

/// Column read back from the fallback count statement.
pub const COUNT_COLUMN: &str = "count";

/// One page of rows plus the number of rows matching overall.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Page {
    pub total: i64,
    pub items: Vec<Row>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Reconcile the rows of a paginated select into a [`Page`].
///
/// Non-empty pages take the total from the first row and strip the total
/// column from every row. Empty pages run the fallback count after the first
/// round trip has completed.
pub(crate) async fn complete<E: Executor>(
    statement: &Statement,
    config: &QbConfig,
    executor: &E,
    mut rows: Vec<Row>,
) -> QbResult<Page> {
    let caser = Caser::new(config);
    if rows.is_empty() {
        let count = compile_count(statement, config)?;
        debug!(
            target: "pgqb.page",
            offset = statement.offset,
            limit = ?statement.limit,
            "empty page; counting matches"
        );
        log_statement("select", &count);
        let counted = executor.query(&count.sql, &count.params).await?;
        let total = match counted.first() {
            Some(row) => {
                let key = find_column(row, &caser, COUNT_COLUMN)
                    .ok_or_else(|| QbError::decode(COUNT_COLUMN, "column missing from count row"))?;
                read_total(&key, &row[&key])?
            }
            None => 0,
        };
        trace!(target: "pgqb.page", total, "fallback total");
        return Ok(Page { total, items: rows });
    }

    let key = find_column(&rows[0], &caser, TOTAL_COLUMN)
        .ok_or_else(|| QbError::decode(TOTAL_COLUMN, "window total missing from row"))?;
    let total = read_total(&key, &rows[0][&key])?;
    for row in &mut rows {
        row.shift_remove(&key);
    }
    trace!(target: "pgqb.page", total, items = rows.len(), "page complete");
    Ok(Page { total, items: rows })
}

/// The key `column` arrived under: as written, database-cased, or recased for
/// the caller by [`CasedExecutor`](crate::executor::CasedExecutor).
pub(crate) fn find_column(row: &Row, caser: &Caser, column: &str) -> Option<String> {
    let db = caser.cased(column, false);
    let external = caser.external(&db);
    [column.to_string(), db, external]
        .into_iter()
        .find(|key| row.contains_key(key))
}

/// Totals arrive as numbers, or as strings from drivers that render bigint as text.
pub(crate) fn read_total(column: &str, value: &serde_json::Value) -> QbResult<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| QbError::decode(column, format!("expected an integer, got {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| QbError::decode(column, format!("expected an integer, got {s:?}"))),
        serde_json::Value::Null => Ok(0),
        other => Err(QbError::decode(
            column,
            format!("expected an integer, got {other}"),
        )),
    }
}
