//! Predicate compiler: filters to SQL boolean expressions.
//!
//! Compilation is pure and synchronous. Every literal becomes a `?`
//! placeholder with its value appended to the returned parameter list;
//! only identifiers are embedded in the SQL text, always quoted.

use std::fmt;

use crate::filter::{Filter, FilterValue};
use crate::sanitize::{placeholders, quote_path};
use crate::value::Value;

/// Collation appended to case-insensitive pattern clauses.
pub const CI_COLLATION: &str = "utf8mb4_general_ci";

/// Compiles one filter entry into a boolean expression fragment.
///
/// Returns the SQL fragment and the values bound by it, in placeholder
/// order. `key` is the already-stripped column path.
#[must_use]
pub fn compile(key: &str, value: &FilterValue) -> (String, Vec<Value>) {
    let column = quote_path(key);
    match value {
        FilterValue::Scalar(v) => (format!("{column} = ?"), vec![v.clone()]),
        FilterValue::Compare(op, v) => (format!("{column} {op} ?"), vec![v.clone()]),
        FilterValue::MatchText(text) => (
            format!("MATCH ({column}) AGAINST (? IN NATURAL LANGUAGE MODE)"),
            vec![Value::Text(text.clone())],
        ),
        FilterValue::Like {
            patterns,
            case_insensitive,
        } => compile_like(&column, patterns, *case_insensitive),
        FilterValue::Range(low, high) => (
            format!("{column} BETWEEN ? AND ?"),
            vec![low.clone(), high.clone()],
        ),
        FilterValue::Membership(values) => (
            format!("{column} IN ({})", placeholders(values.len())),
            values.clone(),
        ),
        FilterValue::Group(inner) => compile_group(key, inner),
    }
}

fn compile_like(column: &str, patterns: &[String], case_insensitive: bool) -> (String, Vec<Value>) {
    let collate = if case_insensitive {
        format!(" COLLATE {CI_COLLATION}")
    } else {
        String::new()
    };
    let clauses: Vec<String> = patterns
        .iter()
        .map(|_| format!("{column} LIKE ?{collate}"))
        .collect();
    let params: Vec<Value> = patterns.iter().map(|p| Value::Text(p.clone())).collect();

    let sql = if clauses.len() > 1 {
        format!("({})", clauses.join(" OR "))
    } else {
        clauses.join("")
    };
    (sql, params)
}

/// A group entry with an empty key inherits the enclosing key; each
/// entry's connective comes from its own key marker.
fn compile_group(enclosing: &str, inner: &Filter) -> (String, Vec<Value>) {
    let mut sql = String::from("(");
    let mut params = Vec::new();
    for (i, (key, value)) in inner.iter().enumerate() {
        if i > 0 {
            sql.push_str(if key.is_disjunctive() { " OR " } else { " AND " });
        }
        let effective = if key.column().is_empty() {
            enclosing
        } else {
            key.column()
        };
        let (clause, values) = compile(effective, value);
        sql.push_str(&clause);
        params.extend(values);
    }
    sql.push(')');
    (sql, params)
}

/// Compiles a whole filter into a `WHERE …` clause.
///
/// Top-level entries compose with `AND`, or `OR` where the key carried the
/// disjunction marker. An empty filter yields an empty string.
#[must_use]
pub fn where_clause(filter: &Filter) -> (String, Vec<Value>) {
    if filter.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut sql = String::from("WHERE (");
    let mut params = Vec::new();
    for (i, (key, value)) in filter.iter().enumerate() {
        if i > 0 {
            sql.push_str(if key.is_disjunctive() { " OR " } else { " AND " });
        }
        let (clause, values) = compile(key.column(), value);
        sql.push_str(&clause);
        params.extend(values);
    }
    sql.push(')');
    (sql, params)
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// Ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// Per-column directions, emitted in order.
    Columns(Vec<(String, Direction)>),
    /// Several columns sharing one direction.
    Fields(Vec<String>, Direction),
    /// A bare column, ascending.
    Single(String),
}

impl OrderBy {
    /// Convenience constructor for a single descending column.
    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self::Columns(vec![(column.into(), Direction::Desc)])
    }

    /// Convenience constructor for a single ascending column.
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self::Columns(vec![(column.into(), Direction::Asc)])
    }
}

/// Renders an `ORDER BY …` clause, or an empty string for `None`.
#[must_use]
pub fn order_clause(order: Option<&OrderBy>) -> String {
    let Some(order) = order else {
        return String::new();
    };
    match order {
        OrderBy::Columns(columns) => {
            if columns.is_empty() {
                return String::new();
            }
            let parts: Vec<String> = columns
                .iter()
                .map(|(column, dir)| format!("{} {dir}", quote_path(column)))
                .collect();
            format!("ORDER BY {}", parts.join(", "))
        }
        OrderBy::Fields(fields, dir) => {
            if fields.is_empty() {
                return String::new();
            }
            let quoted: Vec<String> = fields.iter().map(|f| quote_path(f)).collect();
            format!("ORDER BY {} {dir}", quoted.join(", "))
        }
        OrderBy::Single(field) => format!("ORDER BY {}", quote_path(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_json(filter: serde_json::Value) -> (String, Vec<Value>) {
        where_clause(&Filter::from_json(&filter))
    }

    #[test]
    fn scalars_conjoin_by_default() {
        let (sql, params) = compile_json(json!({"a": 1, "b": 2}));
        assert_eq!(sql, "WHERE (`a` = ? AND `b` = ?)");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn marker_switches_to_or() {
        let (sql, params) = compile_json(json!({"a": 1, "/b": 2}));
        assert_eq!(sql, "WHERE (`a` = ? OR `b` = ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn numeric_pair_is_between() {
        let (sql, params) = compile_json(json!({"age": [18, 30]}));
        assert_eq!(sql, "WHERE (`age` BETWEEN ? AND ?)");
        assert_eq!(params, vec![Value::Int(18), Value::Int(30)]);
    }

    #[test]
    fn wrapped_string_is_like() {
        let (sql, params) = compile_json(json!({"name": "%Jo%"}));
        assert_eq!(sql, "WHERE (`name` LIKE ?)");
        assert_eq!(params, vec![Value::Text(String::from("%Jo%"))]);
    }

    #[test]
    fn double_wrapped_adds_collation() {
        let (sql, params) = compile_json(json!({"name": "%%Jo%%"}));
        assert_eq!(sql, format!("WHERE (`name` LIKE ? COLLATE {CI_COLLATION})"));
        assert_eq!(params, vec![Value::Text(String::from("Jo"))]);
    }

    #[test]
    fn pattern_list_is_or_joined() {
        let (sql, params) = compile_json(json!({"name": ["%Jo%", "Al%"]}));
        assert_eq!(sql, "WHERE ((`name` LIKE ? OR `name` LIKE ?))");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn plain_list_is_membership() {
        let (sql, params) = compile_json(json!({"status": ["open", "closed"]}));
        assert_eq!(sql, "WHERE (`status` IN (?, ?))");
        assert_eq!(
            params,
            vec![
                Value::Text(String::from("open")),
                Value::Text(String::from("closed")),
            ]
        );
    }

    #[test]
    fn match_marker_compiles_to_fulltext() {
        let (sql, params) = compile_json(json!({"body": "MATCH needle"}));
        assert_eq!(
            sql,
            "WHERE (MATCH (`body`) AGAINST (? IN NATURAL LANGUAGE MODE))"
        );
        assert_eq!(params, vec![Value::Text(String::from("needle"))]);
    }

    #[test]
    fn comparison_markers() {
        let (sql, _) = compile_json(json!({"age": "gt;18", "score": "lt;5"}));
        assert_eq!(sql, "WHERE (`age` >= ? AND `score` <= ?)");
    }

    #[test]
    fn groups_parenthesize_and_inherit_key() {
        let (sql, params) = compile_json(json!({"age": {"": "gt;18", "/score": 5}}));
        assert_eq!(sql, "WHERE ((`age` >= ? OR `score` = ?))");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn alias_keys_quote_both_parts() {
        let (sql, _) = compile_json(json!({"users.name": "x"}));
        assert_eq!(sql, "WHERE (`users`.`name` = ?)");
    }

    #[test]
    fn empty_filter_yields_no_clause() {
        let (sql, params) = compile_json(json!({}));
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn order_variants() {
        assert_eq!(order_clause(None), "");
        assert_eq!(
            order_clause(Some(&OrderBy::desc("date_created"))),
            "ORDER BY `date_created` DESC"
        );
        assert_eq!(
            order_clause(Some(&OrderBy::Columns(vec![
                (String::from("a"), Direction::Asc),
                (String::from("b"), Direction::Desc),
            ]))),
            "ORDER BY `a` ASC, `b` DESC"
        );
        assert_eq!(
            order_clause(Some(&OrderBy::Fields(
                vec![String::from("a"), String::from("b")],
                Direction::Desc
            ))),
            "ORDER BY `a`, `b` DESC"
        );
        assert_eq!(
            order_clause(Some(&OrderBy::Single(String::from("name")))),
            "ORDER BY `name`"
        );
    }
}
