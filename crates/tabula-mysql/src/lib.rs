//! # tabula-mysql
//!
//! MySQL driver for tabula-core: implements the [`Execute`] and
//! [`Introspect`] traits on a `sqlx` connection pool.
//!
//! # What the driver owns
//!
//! - **Connection acquisition retries**: transient acquisition failures
//!   are retried with exponential backoff; only exhaustion surfaces as
//!   [`ExecError::Connection`].
//! - **Per-statement timeout**: every statement runs under a fixed budget
//!   (40 s by default); the core never re-issues a timed-out statement.
//! - **Introspection**: live column metadata comes from
//!   `INFORMATION_SCHEMA.COLUMNS` joined with `STATISTICS` (for index
//!   types), the engine from `INFORMATION_SCHEMA.TABLES` — both
//!   parameter-bound.
//! - **Row decoding**: result rows are decoded generically into
//!   [`tabula_core::Record`] keyed on each column's reported type.
//!
//! Query-level failures are never retried here; they propagate to the
//! core as [`ExecError::Query`].
//!
//! ## Example
//!
//! ```ignore
//! use tabula_core::{Table, TableSpec};
//! use tabula_mysql::MySqlExecutor;
//!
//! let executor = MySqlExecutor::connect("mysql://app@localhost/app").await?;
//! let articles = Table::new(executor, TableSpec::new("app", "articles")
//!     .field("title", "VARCHAR(255) NOT NULL"));
//! articles.create().await?;
//! articles.sync().await?;
//! ```
//!
//! [`Execute`]: tabula_core::Execute
//! [`Introspect`]: tabula_core::Introspect
//! [`ExecError::Connection`]: tabula_core::ExecError::Connection
//! [`ExecError::Query`]: tabula_core::ExecError::Query

mod decode;
mod executor;

pub use executor::MySqlExecutor;
