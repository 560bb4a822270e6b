//! Schema diff engine.
//!
//! Compares a [`TableSpec`] against live column metadata and produces the
//! ordered DDL intents needed to reconcile the table. Planning is pure;
//! applying the plan is the access object's job.
//!
//! Operation ordering: drops precede adds and modifies so a rename modeled
//! as drop+add never collides on name; full-text reconciliation happens in
//! the same pass to avoid a second introspection round trip; an engine
//! change comes last.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::spec::TableSpec;

use super::descriptor::ColumnDescriptor;

/// One schema-altering intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOp {
    /// Drop a live column absent from the spec.
    DropColumn {
        /// Column name.
        column: String,
    },
    /// Add a declared column missing live.
    AddColumn {
        /// Column name.
        column: String,
        /// Declared descriptor.
        descriptor: String,
    },
    /// Rewrite a live column whose signature diverged.
    ModifyColumn {
        /// Column name.
        column: String,
        /// Declared descriptor.
        descriptor: String,
    },
    /// Add a full-text index on a declared full-text column.
    AddFulltext {
        /// Column name.
        column: String,
    },
    /// Drop a full-text index no longer declared.
    DropFulltext {
        /// Index name (MySQL defaults it to the column name).
        index: String,
    },
    /// Change the table's storage engine.
    AlterEngine {
        /// Target engine.
        engine: String,
    },
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropColumn { column } => write!(f, "drop column `{column}`"),
            Self::AddColumn { column, .. } => write!(f, "add column `{column}`"),
            Self::ModifyColumn { column, .. } => write!(f, "modify column `{column}`"),
            Self::AddFulltext { column } => write!(f, "add fulltext on `{column}`"),
            Self::DropFulltext { index } => write!(f, "drop fulltext index `{index}`"),
            Self::AlterEngine { engine } => write!(f, "alter engine to {engine}"),
        }
    }
}

/// The ordered reconciliation plan for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Intents, in application order.
    pub ops: Vec<SyncOp>,
}

impl SyncPlan {
    /// `true` when the table already matches the spec.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of intents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Planning knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    /// Permit modifications that cross type families in a lossy direction
    /// (see [`is_lossy_change`]). Off by default; such changes surface
    /// [`Error::SchemaAmbiguity`] instead of being forced.
    pub allow_lossy: bool,
}

/// Computes the plan reconciling `live` columns to `spec`.
///
/// `live_engine` is the table's current storage engine, `None` when the
/// table does not exist yet (no engine change is planned then).
pub fn plan(
    spec: &TableSpec,
    live: &[ColumnDescriptor],
    live_engine: Option<&str>,
    options: PlanOptions,
) -> Result<SyncPlan, Error> {
    let mut drops = Vec::new();
    let mut changes = Vec::new();

    for column in live {
        if !spec.has_field(&column.name) {
            drops.push(SyncOp::DropColumn {
                column: column.name.clone(),
            });
        }
    }

    for field in &spec.fields {
        match live.iter().find(|c| c.name == field.name) {
            None => {
                changes.push(SyncOp::AddColumn {
                    column: field.name.clone(),
                    descriptor: field.descriptor.clone(),
                });
                if spec.is_fulltext(&field.name) {
                    changes.push(SyncOp::AddFulltext {
                        column: field.name.clone(),
                    });
                }
            }
            Some(column) => {
                if !column.matches(&field.descriptor) {
                    if !options.allow_lossy
                        && is_lossy_change(&column.column_type, &field.descriptor)
                    {
                        return Err(Error::SchemaAmbiguity {
                            column: field.name.clone(),
                            live: column.canonical_signature(),
                            declared: field.descriptor.clone(),
                        });
                    }
                    changes.push(SyncOp::ModifyColumn {
                        column: field.name.clone(),
                        descriptor: field.descriptor.clone(),
                    });
                }
                if spec.is_fulltext(&field.name) && !column.has_fulltext() {
                    changes.push(SyncOp::AddFulltext {
                        column: field.name.clone(),
                    });
                } else if !spec.is_fulltext(&field.name) && column.has_fulltext() {
                    changes.push(SyncOp::DropFulltext {
                        index: field.name.clone(),
                    });
                }
            }
        }
    }

    let mut ops = drops;
    ops.extend(changes);

    if let Some(engine) = live_engine {
        if !engine.eq_ignore_ascii_case(&spec.engine) {
            ops.push(SyncOp::AlterEngine {
                engine: spec.engine.clone(),
            });
        }
    }

    Ok(SyncPlan { ops })
}

/// Broad type families used for the lossy-change check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFamily {
    Numeric,
    Temporal,
    Text,
    Binary,
    Other,
}

fn type_family(descriptor: &str) -> TypeFamily {
    let base: String = descriptor
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    match base.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "decimal"
        | "numeric" | "float" | "double" | "bit" => TypeFamily::Numeric,
        "date" | "datetime" | "timestamp" | "time" | "year" => TypeFamily::Temporal,
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set"
        | "json" => TypeFamily::Text,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            TypeFamily::Binary
        }
        _ => TypeFamily::Other,
    }
}

/// A change is lossy when a textual or binary live column would be forced
/// into a numeric type, or a binary column into a non-binary one.
fn is_lossy_change(live_type: &str, declared: &str) -> bool {
    let live = type_family(live_type);
    let wanted = type_family(declared);
    match live {
        TypeFamily::Text => wanted == TypeFamily::Numeric,
        TypeFamily::Binary => wanted != TypeFamily::Binary,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TableSpec {
        let mut spec = TableSpec::new("app", "articles")
            .field("title", "VARCHAR(255) NOT NULL")
            .field("body", "TEXT");
        spec.normalize();
        spec
    }

    /// Live columns exactly matching `spec()`.
    fn reconciled() -> Vec<ColumnDescriptor> {
        let mut id = ColumnDescriptor::new("id", "int(11)", false);
        id.extra = String::from("auto_increment");
        vec![
            ColumnDescriptor::new("title", "varchar(255)", false),
            ColumnDescriptor::new("body", "text", true),
            id,
            ColumnDescriptor::new("date_created", "datetime", false),
            ColumnDescriptor::new("date_modified", "datetime", false),
        ]
    }

    #[test]
    fn reconciled_table_plans_nothing() {
        let plan = plan(&spec(), &reconciled(), Some("InnoDB"), PlanOptions::default()).unwrap();
        assert!(plan.is_empty(), "unexpected ops: {:?}", plan.ops);
    }

    #[test]
    fn missing_table_plans_all_columns() {
        let plan = plan(&spec(), &[], None, PlanOptions::default()).unwrap();
        assert_eq!(plan.len(), 5);
        assert!(plan.ops.iter().all(|op| matches!(op, SyncOp::AddColumn { .. })));
    }

    #[test]
    fn stray_live_column_is_dropped_first() {
        let mut live = reconciled();
        live.push(ColumnDescriptor::new("legacy", "varchar(64)", true));
        // A missing declared column forces an add after the drop.
        let mut spec = spec();
        spec.fields.push(crate::spec::FieldSpec {
            name: String::from("slug"),
            descriptor: String::from("VARCHAR(64) NOT NULL"),
        });

        let plan = plan(&spec, &live, Some("InnoDB"), PlanOptions::default()).unwrap();
        assert_eq!(
            plan.ops,
            vec![
                SyncOp::DropColumn {
                    column: String::from("legacy")
                },
                SyncOp::AddColumn {
                    column: String::from("slug"),
                    descriptor: String::from("VARCHAR(64) NOT NULL")
                },
            ]
        );
    }

    #[test]
    fn diverged_signature_is_modified() {
        let mut live = reconciled();
        live[0].column_type = String::from("varchar(100)");
        let plan = plan(&spec(), &live, Some("InnoDB"), PlanOptions::default()).unwrap();
        assert_eq!(
            plan.ops,
            vec![SyncOp::ModifyColumn {
                column: String::from("title"),
                descriptor: String::from("VARCHAR(255) NOT NULL")
            }]
        );
    }

    #[test]
    fn signature_comparison_ignores_case() {
        let mut live = reconciled();
        live[0].column_type = String::from("VARCHAR(255)");
        let plan = plan(&spec(), &live, Some("InnoDB"), PlanOptions::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn fulltext_added_for_declared_column() {
        let mut spec = spec();
        spec.fulltext = vec![String::from("body")];
        let plan = plan(&spec, &reconciled(), Some("InnoDB"), PlanOptions::default()).unwrap();
        assert_eq!(
            plan.ops,
            vec![SyncOp::AddFulltext {
                column: String::from("body")
            }]
        );
    }

    #[test]
    fn fulltext_not_duplicated_when_live() {
        let mut spec = spec();
        spec.fulltext = vec![String::from("body")];
        let mut live = reconciled();
        live[1].index_type = Some(String::from("FULLTEXT"));
        let plan = plan(&spec, &live, Some("InnoDB"), PlanOptions::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn undeclared_fulltext_is_dropped() {
        let mut live = reconciled();
        live[1].index_type = Some(String::from("FULLTEXT"));
        let plan = plan(&spec(), &live, Some("InnoDB"), PlanOptions::default()).unwrap();
        assert_eq!(
            plan.ops,
            vec![SyncOp::DropFulltext {
                index: String::from("body")
            }]
        );
    }

    #[test]
    fn engine_change_comes_last() {
        let mut live = reconciled();
        live.push(ColumnDescriptor::new("legacy", "varchar(64)", true));
        let plan = plan(&spec(), &live, Some("MyISAM"), PlanOptions::default()).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(matches!(plan.ops.last(), Some(SyncOp::AlterEngine { engine }) if engine == "InnoDB"));
    }

    #[test]
    fn engine_comparison_ignores_case() {
        let plan = plan(&spec(), &reconciled(), Some("innodb"), PlanOptions::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn lossy_change_surfaces_ambiguity() {
        let mut spec = spec();
        spec.fields[0].descriptor = String::from("INT(11) NOT NULL");
        let err = plan(&spec, &reconciled(), Some("InnoDB"), PlanOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaAmbiguity { ref column, .. } if column == "title"));
    }

    #[test]
    fn lossy_change_allowed_when_opted_in() {
        let mut spec = spec();
        spec.fields[0].descriptor = String::from("INT(11) NOT NULL");
        let plan = plan(
            &spec,
            &reconciled(),
            Some("InnoDB"),
            PlanOptions { allow_lossy: true },
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn widening_text_change_is_not_lossy() {
        let mut live = reconciled();
        live[0].column_type = String::from("varchar(100)");
        assert!(!is_lossy_change("varchar(100)", "TEXT"));
        let plan = plan(&spec(), &live, Some("InnoDB"), PlanOptions::default()).unwrap();
        assert_eq!(plan.len(), 1);
    }
}
