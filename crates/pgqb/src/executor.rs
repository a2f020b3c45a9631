//! Statement execution.
//!
//! An [`Executor`] sends SQL plus bound values to a store and returns rows as
//! JSON maps. It is implemented for `tokio_postgres::Client` and
//! `tokio_postgres::Transaction`; tests and other stores can provide their own.

use crate::config::QbConfig;
use crate::error::{QbError, QbResult};
use crate::ident::Caser;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::fmt::Write;
use tokio_postgres::types::{FromSql, ToSql, Type};
use uuid::Uuid;

/// A returned row, keyed by column name in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Runs compiled statements.
pub trait Executor: Send + Sync {
    /// Execute `sql` with `params` bound to `$1..$n` and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send;
}

impl<E: Executor> Executor for &E {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> QbResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &param_refs(params)).await?;
        rows.iter().map(decode_row).collect()
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> QbResult<Vec<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &param_refs(params)).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Recases the keys of returned rows into the caller convention.
///
/// ```ignore
/// let config = QbConfig::default().shared();
/// let db = CasedExecutor::new(client, &config);
/// // { "created_at": .. } comes back as { "createdAt": .. }
/// ```
#[derive(Debug, Clone)]
pub struct CasedExecutor<E> {
    inner: E,
    caser: Caser,
}

impl<E> CasedExecutor<E> {
    pub fn new(inner: E, config: &QbConfig) -> Self {
        Self {
            inner,
            caser: Caser::new(config),
        }
    }

    pub fn get_ref(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Executor> Executor for CasedExecutor<E> {
    async fn query(&self, sql: &str, params: &[Value]) -> QbResult<Vec<Row>> {
        let rows = self.inner.query(sql, params).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(key, value)| (self.caser.external(&key), value))
                    .collect()
            })
            .collect())
    }
}

fn get<'a, T: FromSql<'a>>(
    row: &'a tokio_postgres::Row,
    idx: usize,
    column: &str,
) -> QbResult<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| QbError::decode(column, e.to_string()))
}

fn float(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// `bytea` in PostgreSQL's hex output format.
fn hex(bytes: &[u8]) -> serde_json::Value {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out.into()
}

/// Decode a driver row into a JSON map.
pub fn decode_row(row: &tokio_postgres::Row) -> QbResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = match *column.type_() {
            Type::BOOL => get::<bool>(row, idx, name)?.map(serde_json::Value::from),
            Type::INT2 => get::<i16>(row, idx, name)?.map(serde_json::Value::from),
            Type::INT4 => get::<i32>(row, idx, name)?.map(serde_json::Value::from),
            Type::INT8 => get::<i64>(row, idx, name)?.map(serde_json::Value::from),
            Type::OID => get::<u32>(row, idx, name)?.map(serde_json::Value::from),
            Type::FLOAT4 => get::<f32>(row, idx, name)?.map(|v| float(f64::from(v))),
            Type::FLOAT8 => get::<f64>(row, idx, name)?.map(float),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                get::<String>(row, idx, name)?.map(serde_json::Value::from)
            }
            // Text keeps the full precision of `numeric`.
            Type::NUMERIC => get::<Decimal>(row, idx, name)?.map(|v| v.to_string().into()),
            Type::BYTEA => get::<Vec<u8>>(row, idx, name)?.map(|v| hex(&v)),
            Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, name)?,
            Type::UUID => get::<Uuid>(row, idx, name)?.map(|v| v.to_string().into()),
            Type::TIMESTAMPTZ => {
                get::<DateTime<Utc>>(row, idx, name)?.map(|v| v.to_rfc3339().into())
            }
            Type::TIMESTAMP => get::<NaiveDateTime>(row, idx, name)?
                .map(|v| v.format("%Y-%m-%dT%H:%M:%S%.f").to_string().into()),
            Type::DATE => get::<NaiveDate>(row, idx, name)?.map(|v| v.to_string().into()),
            Type::TIME => get::<NaiveTime>(row, idx, name)?.map(|v| v.to_string().into()),
            ref other => {
                return Err(QbError::decode(
                    name,
                    format!("unsupported column type {other}; cast it to text in the projection"),
                ));
            }
        };
        out.insert(name.to_string(), value.unwrap_or(serde_json::Value::Null));
    }
    Ok(out)
}
