//! Structured filters.
//!
//! A [`Filter`] is an ordered map of field paths to [`FilterValue`]s.
//! Operator semantics are resolved from value shape exactly once, when the
//! filter is constructed from untrusted JSON; the predicate compiler then
//! dispatches on the resulting tagged variants and never re-probes types.
//!
//! Shape rules, in precedence order:
//!
//! - object            → [`FilterValue::Group`]
//! - 2-element array of numbers, or of strings that parse as dates
//!                     → [`FilterValue::Range`] (numeric checked first)
//! - array with any `%`-wrapped element → [`FilterValue::Like`]
//! - other arrays      → [`FilterValue::Membership`]
//! - `%`-wrapped string → [`FilterValue::Like`]; a `%%…%%` wrapping strips
//!   both marker layers and makes the match case-insensitive
//! - `MATCH ` prefix   → [`FilterValue::MatchText`]
//! - `gt;` / `lt;` prefix → [`FilterValue::Compare`]
//! - everything else   → [`FilterValue::Scalar`]

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::value::Value;

/// Key prefix that switches an entry's connective from `AND` to `OR`.
pub const OR_MARKER: char = '/';

/// Scalar prefix selecting a natural-language full-text match.
pub const MATCH_MARKER: &str = "MATCH ";

/// Scalar prefix selecting a `>=` comparison.
pub const GTE_MARKER: &str = "gt;";

/// Scalar prefix selecting a `<=` comparison.
pub const LTE_MARKER: &str = "lt;";

/// A parsed filter key: the column path plus its connective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey {
    column: String,
    disjunctive: bool,
}

impl FilterKey {
    /// Parses a raw key, stripping any leading disjunction markers.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let disjunctive = raw.starts_with(OR_MARKER);
        let column = raw.trim_start_matches(OR_MARKER).to_string();
        Self { column, disjunctive }
    }

    /// Builds a key with the default (`AND`) connective.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            disjunctive: false,
        }
    }

    /// The column path, marker already stripped.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// `true` when the entry composes with `OR`.
    #[must_use]
    pub fn is_disjunctive(&self) -> bool {
        self.disjunctive
    }

    /// Splits a `table.column` alias into its two parts.
    #[must_use]
    pub fn alias(&self) -> Option<(&str, &str)> {
        let (table, column) = self.column.split_once('.')?;
        if column.contains('.') {
            return None;
        }
        Some((table, column))
    }
}

/// Comparison operators expressible through scalar markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Greater than or equal (`>=`).
    Gte,
    /// Less than or equal (`<=`).
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gte => write!(f, ">="),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// A filter entry's operator and operand, resolved at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Equality against a single value.
    Scalar(Value),
    /// `>=` / `<=` comparison.
    Compare(CompareOp, Value),
    /// Natural-language full-text match.
    MatchText(String),
    /// One or more LIKE patterns, OR-joined.
    Like {
        /// Patterns bound as-is (wildcards included).
        patterns: Vec<String>,
        /// Adds a case-insensitive collation to every pattern clause.
        case_insensitive: bool,
    },
    /// Inclusive range (`BETWEEN`).
    Range(Value, Value),
    /// Membership (`IN`).
    Membership(Vec<Value>),
    /// Parenthesized nested filter.
    Group(Filter),
}

/// An ordered filter: field path to resolved value shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    entries: Vec<(FilterKey, FilterValue)>,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from untrusted JSON. Non-object input yields an
    /// empty filter.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self::from_map(map),
            _ => Self::new(),
        }
    }

    fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut filter = Self::new();
        for (raw_key, raw_value) in map {
            filter.push(FilterKey::parse(raw_key), infer(raw_value));
        }
        filter
    }

    /// Appends an entry, preserving order.
    pub fn push(&mut self, key: FilterKey, value: FilterValue) {
        self.entries.push((key, value));
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn with(mut self, key: FilterKey, value: FilterValue) -> Self {
        self.push(key, value);
        self
    }

    /// `true` when the filter has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(FilterKey, FilterValue)> {
        self.entries.iter()
    }

    /// Retains only the entries the predicate accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(&FilterKey) -> bool) {
        self.entries.retain(|(key, _)| keep(key));
    }
}

impl FromIterator<(FilterKey, FilterValue)> for Filter {
    fn from_iter<I: IntoIterator<Item = (FilterKey, FilterValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Resolves a JSON value into its operator shape.
fn infer(value: &serde_json::Value) -> FilterValue {
    match value {
        serde_json::Value::Object(map) => FilterValue::Group(Filter::from_map(map)),
        serde_json::Value::Array(items) => infer_list(items),
        serde_json::Value::String(s) => infer_text(s),
        other => FilterValue::Scalar(Value::from_json(other).unwrap_or(Value::Null)),
    }
}

fn infer_text(s: &str) -> FilterValue {
    if let Some(inner) = strip_double_wrap(s) {
        return FilterValue::Like {
            patterns: vec![inner.to_string()],
            case_insensitive: true,
        };
    }
    if is_pattern(s) {
        return FilterValue::Like {
            patterns: vec![s.to_string()],
            case_insensitive: false,
        };
    }
    if let Some(rest) = s.strip_prefix(MATCH_MARKER) {
        return FilterValue::MatchText(rest.to_string());
    }
    if let Some(rest) = s.strip_prefix(GTE_MARKER) {
        return FilterValue::Compare(CompareOp::Gte, Value::Text(rest.to_string()));
    }
    if let Some(rest) = s.strip_prefix(LTE_MARKER) {
        return FilterValue::Compare(CompareOp::Lte, Value::Text(rest.to_string()));
    }
    FilterValue::Scalar(Value::Text(s.to_string()))
}

fn infer_list(items: &[serde_json::Value]) -> FilterValue {
    if items.len() == 2 && (both_numeric(items) || both_dates(items)) {
        return FilterValue::Range(scalar_of(&items[0]), scalar_of(&items[1]));
    }

    let any_pattern = items
        .iter()
        .any(|v| v.as_str().is_some_and(|s| strip_double_wrap(s).is_some() || is_pattern(s)));
    if any_pattern {
        let case_insensitive = items
            .iter()
            .any(|v| v.as_str().is_some_and(|s| strip_double_wrap(s).is_some()));
        let patterns = items
            .iter()
            .map(|v| match v.as_str() {
                Some(s) => strip_double_wrap(s).unwrap_or(s).to_string(),
                None => scalar_of(v).to_inline(),
            })
            .collect();
        return FilterValue::Like {
            patterns,
            case_insensitive,
        };
    }

    FilterValue::Membership(items.iter().map(scalar_of).collect())
}

fn scalar_of(v: &serde_json::Value) -> Value {
    Value::from_json(v).unwrap_or_else(|| Value::Text(v.to_string()))
}

/// Numeric means a JSON number; numeric-looking strings are not promoted.
fn both_numeric(items: &[serde_json::Value]) -> bool {
    items.iter().all(serde_json::Value::is_number)
}

fn both_dates(items: &[serde_json::Value]) -> bool {
    items
        .iter()
        .all(|v| v.as_str().is_some_and(parses_as_date))
}

/// Accepted date shapes: `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`.
fn parses_as_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
}

fn is_pattern(s: &str) -> bool {
    !s.is_empty() && (s.starts_with('%') || s.ends_with('%'))
}

/// Strips `%%…%%` down to the inner text, or returns `None` when the value
/// is not doubly wrapped.
fn strip_double_wrap(s: &str) -> Option<&str> {
    if s.len() >= 4 && s.starts_with("%%") && s.ends_with("%%") {
        Some(&s[2..s.len() - 2])
    } else {
        None
    }
}
