//! Introspected column metadata.

use serde::{Deserialize, Serialize};

/// One live column, as reported by the database's information schema.
/// Never cached beyond a single synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Reported column type, e.g. `varchar(255)`.
    pub column_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Reported default value, if any.
    pub default: Option<String>,
    /// Extra attributes, e.g. `auto_increment`.
    pub extra: String,
    /// Index type covering the column, e.g. `FULLTEXT`.
    pub index_type: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a descriptor with no default, extra, or index.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable,
            default: None,
            extra: String::new(),
            index_type: None,
        }
    }

    /// Normalizes the live metadata into the canonical signature
    /// `TYPE[ NOT NULL][ DEFAULT 'value'][ EXTRA]` that declared
    /// descriptors are compared against.
    #[must_use]
    pub fn canonical_signature(&self) -> String {
        let mut signature = self.column_type.clone();
        if !self.nullable {
            signature.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            signature.push_str(" DEFAULT '");
            signature.push_str(default);
            signature.push('\'');
        }
        if !self.extra.is_empty() {
            signature.push(' ');
            signature.push_str(&self.extra);
        }
        signature
    }

    /// Case-insensitive comparison against a declared descriptor string.
    #[must_use]
    pub fn matches(&self, declared: &str) -> bool {
        self.canonical_signature().eq_ignore_ascii_case(declared)
    }

    /// `true` when the column carries a full-text index.
    #[must_use]
    pub fn has_fulltext(&self) -> bool {
        self.index_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("FULLTEXT"))
    }
}
