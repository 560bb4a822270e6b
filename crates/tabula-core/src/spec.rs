//! Declarative table specifications.
//!
//! A [`TableSpec`] describes a table's columns, key, full-text set, storage
//! engine, and seed rows. The `key` and `fulltext` pseudo-fields accepted by
//! [`TableSpec::field`] are extracted into their own slots at construction
//! and never stored as ordinary columns.

use serde::{Deserialize, Serialize};

use crate::value::Record;

/// Default storage engine.
pub const DEFAULT_ENGINE: &str = "InnoDB";

/// Descriptor injected for a missing `id` column.
pub const ID_DESCRIPTOR: &str = "INT(11) NOT NULL AUTO_INCREMENT";

/// Descriptor injected for missing timestamp columns.
pub const TIMESTAMP_DESCRIPTOR: &str = "DATETIME NOT NULL";

/// One declared column: name plus raw column-type descriptor, e.g.
/// `("title", "VARCHAR(255) NOT NULL")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name.
    pub name: String,
    /// Raw column-type descriptor, emitted verbatim into DDL.
    pub descriptor: String,
}

/// Declarative description of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Database (schema) name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Storage engine.
    pub engine: String,
    /// Declared columns, in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Composite/primary key clause, emitted verbatim at create time.
    pub key: Option<String>,
    /// Columns carrying a full-text index.
    pub fulltext: Vec<String>,
    /// Seed rows upserted by identity after synchronization.
    pub seed: Vec<Record>,
}

impl TableSpec {
    /// Creates a spec for `database`.`table` with the default engine.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            engine: String::from(DEFAULT_ENGINE),
            fields: Vec::new(),
            key: None,
            fulltext: Vec::new(),
            seed: Vec::new(),
        }
    }

    /// Declares a column.
    ///
    /// The names `key` and `fulltext` are pseudo-fields: `key` stores its
    /// descriptor as the verbatim key clause, `fulltext` is split on commas
    /// into the full-text column set. Neither becomes a column.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        let name = name.into();
        let descriptor = descriptor.into();
        match name.as_str() {
            "key" => self.key = Some(descriptor),
            "fulltext" => {
                self.fulltext = descriptor
                    .split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect();
            }
            _ => self.fields.push(FieldSpec { name, descriptor }),
        }
        self
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Sets the verbatim key clause.
    #[must_use]
    pub fn key(mut self, clause: impl Into<String>) -> Self {
        self.key = Some(clause.into());
        self
    }

    /// Adds a seed row.
    #[must_use]
    pub fn seed_row(mut self, record: Record) -> Self {
        self.seed.push(record);
        self
    }

    /// Injects the always-present columns when absent: `id`,
    /// `date_created`, `date_modified`, appended in that order.
    pub fn normalize(&mut self) {
        for (name, descriptor) in [
            ("id", ID_DESCRIPTOR),
            ("date_created", TIMESTAMP_DESCRIPTOR),
            ("date_modified", TIMESTAMP_DESCRIPTOR),
        ] {
            if !self.has_field(name) {
                self.fields.push(FieldSpec {
                    name: String::from(name),
                    descriptor: String::from(descriptor),
                });
            }
        }
    }

    /// `true` if `name` is a declared column.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Looks up a declared column.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared column names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// `true` if `column` belongs to the full-text set.
    #[must_use]
    pub fn is_fulltext(&self, column: &str) -> bool {
        self.fulltext.iter().any(|c| c == column)
    }

    /// The backtick-quoted `database`.`table` reference.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}",
            crate::sanitize::quote(&self.database),
            crate::sanitize::quote(&self.table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_injects_missing_columns() {
        let mut spec = TableSpec::new("app", "articles").field("title", "VARCHAR(255) NOT NULL");
        spec.normalize();

        let names: Vec<&str> = spec.field_names().collect();
        assert_eq!(names, vec!["title", "id", "date_created", "date_modified"]);
        assert_eq!(spec.get_field("id").unwrap().descriptor, ID_DESCRIPTOR);
    }

    #[test]
    fn normalize_keeps_declared_columns() {
        let mut spec = TableSpec::new("app", "articles")
            .field("id", "BIGINT(20) NOT NULL AUTO_INCREMENT")
            .field("title", "VARCHAR(255) NOT NULL");
        spec.normalize();

        assert_eq!(
            spec.get_field("id").unwrap().descriptor,
            "BIGINT(20) NOT NULL AUTO_INCREMENT"
        );
        // id stays where it was declared.
        assert_eq!(spec.field_names().next(), Some("id"));
    }

    #[test]
    fn pseudo_fields_never_become_columns() {
        let spec = TableSpec::new("app", "articles")
            .field("title", "VARCHAR(255) NOT NULL")
            .field("key", "PRIMARY KEY (`id`)")
            .field("fulltext", "title, body");

        assert!(!spec.has_field("key"));
        assert!(!spec.has_field("fulltext"));
        assert_eq!(spec.key.as_deref(), Some("PRIMARY KEY (`id`)"));
        assert_eq!(spec.fulltext, vec!["title", "body"]);
        assert!(spec.is_fulltext("body"));
    }

    #[test]
    fn qualified_name_is_quoted() {
        let spec = TableSpec::new("app", "articles");
        assert_eq!(spec.qualified_name(), "`app`.`articles`");
    }

    #[test]
    fn default_engine() {
        assert_eq!(TableSpec::new("a", "t").engine, "InnoDB");
        assert_eq!(TableSpec::new("a", "t").engine("MyISAM").engine, "MyISAM");
    }
}
