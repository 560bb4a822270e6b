//! # tabula-core
//!
//! A declarative-schema data access layer: describe a table once and
//! tabula reconciles the live table to match it, then compiles structured
//! filter maps into SQL predicates without callers writing SQL.
//!
//! The core is pure and driver-agnostic: statements are produced with `?`
//! placeholders and bound [`Value`] lists, and handed to an implementation
//! of the [`Execute`]/[`Introspect`] traits (see the tabula-mysql crate).
//!
//! ## Declaring and synchronizing a table
//!
//! ```ignore
//! use tabula_core::{Table, TableSpec};
//!
//! let spec = TableSpec::new("app", "articles")
//!     .field("title", "VARCHAR(255) NOT NULL")
//!     .field("body", "TEXT")
//!     .field("fulltext", "title, body");
//!
//! let articles = Table::new(executor, spec);
//! articles.create().await?;
//! articles.sync().await?;
//! ```
//!
//! ## Filtering
//!
//! Filters are built from untrusted JSON; operator semantics come from
//! value shape, resolved once at construction:
//!
//! ```
//! use tabula_core::{predicate, Filter};
//!
//! let filter = Filter::from_json(&serde_json::json!({
//!     "status": ["open", "closed"],   // IN (?, ?)
//!     "age": [18, 30],                // BETWEEN ? AND ?
//!     "/name": "%Jo%",                // OR `name` LIKE ?
//! }));
//! let (sql, params) = predicate::where_clause(&filter);
//! assert!(sql.starts_with("WHERE ("));
//! assert_eq!(params.len(), 5);
//! ```

pub mod assemble;
pub mod error;
pub mod executor;
pub mod filter;
pub mod predicate;
pub mod sanitize;
pub mod spec;
pub mod sync;
pub mod table;
pub mod validate;
pub mod value;

pub use assemble::{build_query, Limit, Target};
pub use error::{Error, Result};
pub use executor::{ExecError, Execute, Introspect, Outcome, Statement};
pub use filter::{Filter, FilterKey, FilterValue};
pub use predicate::{Direction, OrderBy};
pub use spec::{FieldSpec, TableSpec};
pub use sync::{ColumnDescriptor, PlanOptions, SyncOp, SyncPlan};
pub use table::{SyncReport, Table};
pub use validate::validate;
pub use value::{Record, ToValue, Value};
