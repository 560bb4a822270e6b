//! DDL rendering.
//!
//! MySQL does not accept bound parameters in DDL positions, so these
//! statements embed declared descriptors verbatim. Descriptors come from
//! the trusted [`TableSpec`], never from caller filters; identifiers are
//! quoted at every site.

use crate::executor::Statement;
use crate::sanitize::quote;
use crate::spec::TableSpec;

use super::plan::SyncOp;

/// Renders `CREATE TABLE IF NOT EXISTS` for the spec: columns in
/// declaration order, the verbatim key clause, a `FULLTEXT (…)` clause for
/// the declared full-text set, and the engine.
#[must_use]
pub fn create_table(spec: &TableSpec) -> Statement {
    let mut clauses: Vec<String> = spec
        .fields
        .iter()
        .map(|f| format!("{} {}", quote(&f.name), f.descriptor))
        .collect();

    if let Some(key) = &spec.key {
        clauses.push(key.clone());
    }
    if !spec.fulltext.is_empty() {
        let columns: Vec<String> = spec.fulltext.iter().map(|c| quote(c)).collect();
        clauses.push(format!("FULLTEXT ({})", columns.join(", ")));
    }

    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE={}",
        spec.qualified_name(),
        clauses.join(", "),
        spec.engine
    ))
}

/// Renders the ALTER statement for one reconciliation intent.
#[must_use]
pub fn alter_statement(spec: &TableSpec, op: &SyncOp) -> Statement {
    let table = spec.qualified_name();
    let sql = match op {
        SyncOp::DropColumn { column } => {
            format!("ALTER TABLE {table} DROP COLUMN {}", quote(column))
        }
        SyncOp::AddColumn { column, descriptor } => {
            format!("ALTER TABLE {table} ADD COLUMN {} {descriptor}", quote(column))
        }
        SyncOp::ModifyColumn { column, descriptor } => {
            format!("ALTER TABLE {table} MODIFY COLUMN {} {descriptor}", quote(column))
        }
        SyncOp::AddFulltext { column } => {
            format!("ALTER TABLE {table} ADD FULLTEXT ({})", quote(column))
        }
        SyncOp::DropFulltext { index } => {
            format!("ALTER TABLE {table} DROP INDEX {}", quote(index))
        }
        SyncOp::AlterEngine { engine } => format!("ALTER TABLE {table} ENGINE={engine}"),
    };
    Statement::new(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TableSpec {
        let mut spec = TableSpec::new("app", "articles")
            .field("title", "VARCHAR(255) NOT NULL")
            .field("body", "TEXT")
            .field("fulltext", "title, body")
            .field("key", "PRIMARY KEY (`id`)");
        spec.normalize();
        spec
    }

    #[test]
    fn create_table_emits_all_clauses() {
        let stmt = create_table(&spec());
        assert_eq!(
            stmt.sql,
            "CREATE TABLE IF NOT EXISTS `app`.`articles` (\
             `title` VARCHAR(255) NOT NULL, \
             `body` TEXT, \
             `id` INT(11) NOT NULL AUTO_INCREMENT, \
             `date_created` DATETIME NOT NULL, \
             `date_modified` DATETIME NOT NULL, \
             PRIMARY KEY (`id`), \
             FULLTEXT (`title`, `body`)\
             ) ENGINE=InnoDB"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn alter_statements() {
        let spec = spec();
        let cases = [
            (
                SyncOp::DropColumn {
                    column: String::from("legacy"),
                },
                "ALTER TABLE `app`.`articles` DROP COLUMN `legacy`",
            ),
            (
                SyncOp::AddColumn {
                    column: String::from("slug"),
                    descriptor: String::from("VARCHAR(64) NOT NULL"),
                },
                "ALTER TABLE `app`.`articles` ADD COLUMN `slug` VARCHAR(64) NOT NULL",
            ),
            (
                SyncOp::ModifyColumn {
                    column: String::from("title"),
                    descriptor: String::from("VARCHAR(300) NOT NULL"),
                },
                "ALTER TABLE `app`.`articles` MODIFY COLUMN `title` VARCHAR(300) NOT NULL",
            ),
            (
                SyncOp::AddFulltext {
                    column: String::from("body"),
                },
                "ALTER TABLE `app`.`articles` ADD FULLTEXT (`body`)",
            ),
            (
                SyncOp::DropFulltext {
                    index: String::from("body"),
                },
                "ALTER TABLE `app`.`articles` DROP INDEX `body`",
            ),
            (
                SyncOp::AlterEngine {
                    engine: String::from("MyISAM"),
                },
                "ALTER TABLE `app`.`articles` ENGINE=MyISAM",
            ),
        ];
        for (op, expected) in cases {
            assert_eq!(alter_statement(&spec, &op).sql, expected);
        }
    }
}
