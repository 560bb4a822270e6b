//! Error types for the data access layer.
//!
//! Validation failures (undeclared filter keys) are absorbed locally by
//! [`crate::validate::validate`] and only logged; everything that mutates
//! data or schema surfaces here as a typed failure carrying the
//! originating intent or statement.

use crate::executor::ExecError;
use crate::sync::SyncOp;

/// Errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A DDL intent failed; the remaining plan was aborted.
    #[error("schema sync aborted at {op}: {source}")]
    SchemaSync {
        /// The intent that failed.
        op: SyncOp,
        /// The executor failure.
        source: ExecError,
    },

    /// A live column cannot be reconciled without losing data.
    #[error(
        "column `{column}` cannot be reconciled: live `{live}` vs declared `{declared}` \
         (set allow_lossy to force)"
    )]
    SchemaAmbiguity {
        /// Column name.
        column: String,
        /// Live canonical signature.
        live: String,
        /// Declared descriptor.
        declared: String,
    },

    /// Schema metadata could not be read.
    #[error("introspection failed for `{table}`: {source}")]
    Introspection {
        /// Table name.
        table: String,
        /// The executor failure.
        source: ExecError,
    },

    /// A query failed; carries the offending statement for diagnosis.
    #[error("query failed: {source} (statement: {statement})")]
    Execution {
        /// The SQL text that failed.
        statement: String,
        /// The executor failure.
        source: ExecError,
    },

    /// An aggregate or projection named a field the spec does not declare.
    #[error("field `{0}` is not declared")]
    UnknownField(String),

    /// An update was issued with no values to set.
    #[error("update with no values to set")]
    EmptyUpdate,

    /// An insert was issued with an empty record.
    #[error("insert with an empty record")]
    EmptyRecord,

    /// A mutation's filter validated down to nothing; refusing to touch
    /// every row.
    #[error("mutation filter is empty after validation")]
    EmptyFilter,
}

/// Result alias for data access operations.
pub type Result<T> = std::result::Result<T, Error>;
