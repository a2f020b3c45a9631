//! Convenient imports for typical `pgqb` usage.
//!
//! ```ignore
//! use pgqb::prelude::*;
//! ```

pub use crate::{
    CasedExecutor, Condition, Executor, JoinSpec, Pagination, QbConfig, QbError, QbResult,
    QueryBuilder, RequiredMode, Row, Value, table,
};
