//! Shared mock executor for integration tests.
//!
//! Records every statement it receives, serves canned introspection
//! metadata, and can be told to fail statements matching a substring —
//! once (simulating a lost DDL race) or persistently.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use tabula_core::{
    ColumnDescriptor, ExecError, Execute, Introspect, Outcome, Record, Statement, TableSpec, Value,
};

/// A one-shot failure trigger. When a statement matching `pattern` arrives
/// the trigger clears itself, optionally replacing the live columns (as a
/// concurrent writer would have).
pub struct FailOnce {
    pub pattern: String,
    pub columns_after: Option<Vec<ColumnDescriptor>>,
}

#[derive(Default)]
pub struct MockDb {
    pub statements: Mutex<Vec<Statement>>,
    pub columns: Mutex<Vec<ColumnDescriptor>>,
    pub engine: Mutex<Option<String>>,
    pub existing_ids: Mutex<HashSet<u64>>,
    pub fail_contains: Mutex<Option<String>>,
    pub fail_once: Mutex<Option<FailOnce>>,
}

impl MockDb {
    pub fn with_schema(columns: Vec<ColumnDescriptor>, engine: &str) -> Self {
        let db = Self::default();
        *db.columns.lock().unwrap() = columns;
        *db.engine.lock().unwrap() = Some(engine.to_string());
        db
    }

    pub fn recorded_sql(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    pub fn recorded(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.statements.lock().unwrap().clear();
    }

    pub fn set_columns(&self, columns: Vec<ColumnDescriptor>) {
        *self.columns.lock().unwrap() = columns;
    }

    pub fn mark_existing(&self, id: u64) {
        self.existing_ids.lock().unwrap().insert(id);
    }

    /// Number of recorded DDL statements.
    pub fn ddl_count(&self) -> usize {
        self.recorded_sql()
            .iter()
            .filter(|sql| sql.starts_with("ALTER") || sql.starts_with("CREATE"))
            .count()
    }
}

impl Execute for &MockDb {
    async fn execute(&self, statement: &Statement) -> Result<Outcome, ExecError> {
        self.statements.lock().unwrap().push(statement.clone());

        {
            let mut guard = self.fail_once.lock().unwrap();
            if guard
                .as_ref()
                .is_some_and(|f| statement.sql.contains(&f.pattern))
            {
                let trigger = guard.take().unwrap();
                drop(guard);
                if let Some(columns) = trigger.columns_after {
                    self.set_columns(columns);
                }
                return Err(ExecError::Query {
                    message: String::from("lock wait timeout: concurrent DDL"),
                });
            }
        }
        if let Some(pattern) = self.fail_contains.lock().unwrap().clone() {
            if statement.sql.contains(&pattern) {
                return Err(ExecError::Query {
                    message: String::from("forced failure"),
                });
            }
        }

        if statement.sql.starts_with("SELECT") {
            if statement.sql.contains("COUNT(*) AS count") {
                let mut row = Record::new();
                row.insert(String::from("count"), Value::Int(3));
                return Ok(Outcome {
                    rows: vec![row],
                    ..Outcome::empty()
                });
            }
            if statement.sql.contains("WHERE `id` = ?") {
                if let Some(id) = statement.params.first().and_then(Value::as_u64) {
                    if self.existing_ids.lock().unwrap().contains(&id) {
                        let mut row = Record::new();
                        row.insert(String::from("id"), Value::Uint(id));
                        return Ok(Outcome {
                            rows: vec![row],
                            ..Outcome::empty()
                        });
                    }
                }
            }
            return Ok(Outcome::empty());
        }

        Ok(Outcome {
            rows: Vec::new(),
            insert_id: 1,
            affected_rows: 1,
            changed_rows: 1,
        })
    }
}

impl Introspect for &MockDb {
    async fn columns(
        &self,
        _database: &str,
        _table: &str,
    ) -> Result<Vec<ColumnDescriptor>, ExecError> {
        Ok(self.columns.lock().unwrap().clone())
    }

    async fn engine(&self, _database: &str, _table: &str) -> Result<Option<String>, ExecError> {
        Ok(self.engine.lock().unwrap().clone())
    }
}

/// The spec most tests use.
pub fn article_spec() -> TableSpec {
    TableSpec::new("app", "articles")
        .field("title", "VARCHAR(255) NOT NULL")
        .field("body", "TEXT")
}

pub fn col(name: &str, column_type: &str, nullable: bool) -> ColumnDescriptor {
    ColumnDescriptor::new(name, column_type, nullable)
}

/// Live columns exactly matching the normalized [`article_spec`].
pub fn reconciled_columns() -> Vec<ColumnDescriptor> {
    let mut id = col("id", "int(11)", false);
    id.extra = String::from("auto_increment");
    vec![
        col("title", "varchar(255)", false),
        col("body", "text", true),
        id,
        col("date_created", "datetime", false),
        col("date_modified", "datetime", false),
    ]
}
