//! # pgqb
//!
//! Compile object-shaped condition trees into parameterized PostgreSQL
//! statements, and run them through any executor.
//!
//! ## Features
//!
//! - **Condition DSL**: `$and` / `$or`, `$eq` .. `$regexp`, `null` checks and
//!   raw `:expr` keys, from `serde_json::json!` or typed constructors
//! - **Placeholders in text order**: `$k` always refers to `params[k - 1]`
//! - **Identifier casing**: callers write `createdAt`, the database sees
//!   `"created_at"`
//! - **Pagination with totals**: one round trip per page, plus a count-only
//!   statement when the page is empty
//! - **Driver independent**: compile to `(sql, params)`, or execute through
//!   the [`Executor`] trait (implemented for `tokio_postgres::Client`)
//!
//! ## Example
//!
//! ```ignore
//! use pgqb::{Pagination, table};
//! use serde_json::json;
//!
//! // SELECT
//! let compiled = table("users")
//!     .filter(json!({ "$or": [{ "role": "admin" }, { "role": "owner" }], "active": true }))
//!     .sorted(["-createdAt", "name"])
//!     .build()?;
//! assert_eq!(
//!     compiled.sql,
//!     r#"SELECT * FROM users WHERE ("role" = $1 OR "role" = $2) AND "active" = $3 ORDER BY "created_at" DESC, "name""#
//! );
//!
//! // INSERT .. ON CONFLICT
//! let user = table("users")
//!     .insert(json!({ "email": "a@example.com", "createdAt": ":now()" }))
//!     .on_conflict("email", json!({ "update": { "updatedAt": ":now()" } }))
//!     .fetch_first(&client)
//!     .await?;
//!
//! // Paginated SELECT
//! let page = table("users")
//!     .paginated(Pagination::new(20, 10))
//!     .fetch_page(&client)
//!     .await?;
//! println!("{} of {}", page.items.len(), page.total);
//! ```

pub mod builder;
pub mod compile;
pub mod condition;
pub mod config;
pub mod error;
pub mod executor;
pub mod ident;
pub mod log;
pub mod paginate;
pub mod prelude;
pub mod statement;
pub mod value;

pub use builder::{QueryBuilder, QueryOutput, table};
pub use compile::{CompiledQuery, ParamList, compile, compile_count};
pub use condition::{Comparer, Condition, IntoConditions, LogicalOp, Modifier, parse_conditions};
pub use config::{NamingConvention, QbConfig};
pub use error::{BuildError, QbError, QbResult};
pub use executor::{CasedExecutor, Executor, Row, decode_row};
pub use ident::{Caser, quote_ident};
pub use paginate::Page;
pub use statement::{
    AssignValue, Assignment, Command, ConflictAction, ConflictSpec, First, IntoConflictAction,
    IntoJoins, IntoKeyValues, IntoKeys, JoinOn, JoinSpec, Pagination, RequiredMode, Statement,
};
pub use value::Value;
