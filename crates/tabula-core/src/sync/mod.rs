//! Schema synchronization: introspected metadata, diff planning, and DDL
//! rendering. Application lives on [`crate::table::Table`].

pub mod ddl;
pub mod descriptor;
pub mod plan;

pub use descriptor::ColumnDescriptor;
pub use plan::{plan, PlanOptions, SyncOp, SyncPlan};
