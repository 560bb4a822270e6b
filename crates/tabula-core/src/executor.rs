//! The executor boundary.
//!
//! The core never talks to a database directly. It produces [`Statement`]s
//! and hands them to an implementation of [`Execute`]; schema metadata
//! arrives through [`Introspect`]. Driver crates (tabula-mysql) implement
//! both so the core stays driver-agnostic.

use std::time::Duration;

use crate::sync::descriptor::ColumnDescriptor;
use crate::value::{Record, Value};

/// A SQL statement plus its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Values bound to the placeholders.
    pub params: Vec<Value>,
}

impl Statement {
    /// Creates a statement without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a statement with parameters.
    #[must_use]
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Result of executing one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Result rows, for row-returning statements.
    pub rows: Vec<Record>,
    /// Last insert id, when the statement inserted.
    pub insert_id: u64,
    /// Rows matched by the statement.
    pub affected_rows: u64,
    /// Rows actually changed.
    pub changed_rows: u64,
}

impl Outcome {
    /// An outcome with no rows and zero counters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Failures reported by an executor implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecError {
    /// The statement was rejected or failed server-side. Never retried.
    #[error("query failed: {message}")]
    Query {
        /// Driver-reported failure text.
        message: String,
    },

    /// Connection acquisition failed after the driver's retries.
    #[error("connection unavailable: {message}")]
    Connection {
        /// Driver-reported failure text.
        message: String,
    },

    /// The statement exceeded its timeout budget.
    #[error("statement timed out after {budget:?}")]
    Timeout {
        /// The per-statement budget that was exhausted.
        budget: Duration,
    },
}

/// Executes statements against a database.
///
/// Implementations manage their own connection acquisition, retry policy
/// for transient connection failures, and per-statement timeout. Query
/// failures are reported, never retried.
#[allow(async_fn_in_trait)]
pub trait Execute {
    /// Runs one statement, returning rows and mutation counters.
    async fn execute(&self, statement: &Statement) -> Result<Outcome, ExecError>;
}

/// Reads live schema metadata.
#[allow(async_fn_in_trait)]
pub trait Introspect {
    /// Returns the live column descriptors for `database`.`table`, in
    /// ordinal order. An absent table yields an empty list.
    async fn columns(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, ExecError>;

    /// Returns the table's storage engine, or `None` when the table does
    /// not exist.
    async fn engine(&self, database: &str, table: &str) -> Result<Option<String>, ExecError>;
}
