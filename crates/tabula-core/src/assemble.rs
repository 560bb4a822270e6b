//! Query assembly.
//!
//! Composes a base statement with a validated filter (or an id shortcut),
//! ordering, and pagination into one executable [`Statement`].

use crate::executor::Statement;
use crate::filter::Filter;
use crate::predicate::{order_clause, where_clause, OrderBy};
use crate::spec::TableSpec;
use crate::validate::validate;
use crate::value::Value;

/// What a statement applies to: one row by identity, or a filtered set.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A single row by `id`; assembles to `WHERE \`id\` = ? LIMIT 1`.
    Id(u64),
    /// A filter map, validated against the spec before compilation.
    Where(Filter),
}

impl From<u64> for Target {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<Filter> for Target {
    fn from(filter: Filter) -> Self {
        Self::Where(filter)
    }
}

/// Pagination. `None` at the call sites means no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most `n` rows.
    Count(u64),
    /// `n` rows starting at `offset`.
    OffsetCount(u64, u64),
}

/// Renders a `LIMIT …` clause, or an empty string for `None`.
#[must_use]
pub fn limit_clause(limit: Option<&Limit>) -> String {
    match limit {
        None => String::new(),
        Some(Limit::Count(n)) => format!("LIMIT {n}"),
        Some(Limit::OffsetCount(offset, n)) => format!("LIMIT {offset}, {n}"),
    }
}

/// Assembles `base` with the target, ordering, and pagination.
///
/// Filters are safelist-validated against `spec` before compilation; the
/// id shortcut bypasses ordering and pagination entirely.
#[must_use]
pub fn build_query(
    base: &str,
    target: Target,
    order: Option<&OrderBy>,
    limit: Option<&Limit>,
    spec: &TableSpec,
) -> Statement {
    match target {
        Target::Id(id) => Statement::with_params(
            format!("{base} WHERE `id` = ? LIMIT 1"),
            vec![Value::Uint(id)],
        ),
        Target::Where(filter) => {
            let validated = validate(filter, spec);
            let (where_sql, params) = where_clause(&validated);

            let mut sql = String::from(base);
            for clause in [
                where_sql,
                order_clause(order),
                limit_clause(limit),
            ] {
                if !clause.is_empty() {
                    sql.push(' ');
                    sql.push_str(&clause);
                }
            }
            Statement::with_params(sql, params)
        }
    }
}
