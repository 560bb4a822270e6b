//! Safelist validation of untrusted filters.
//!
//! Filter keys become SQL identifiers, so any key that is not a declared
//! field must be dropped before compilation. This is the boundary that
//! keeps caller-supplied filter maps from naming arbitrary columns.

use tracing::debug;

use crate::filter::Filter;
use crate::sanitize::is_safe_ident;
use crate::spec::TableSpec;

/// Retains only entries whose key is a declared field or a safe two-part
/// `table.column` alias; everything else is silently dropped (and logged
/// at debug level for diagnostics).
///
/// Disjunction markers were already stripped during key parsing, so a
/// `/status` entry validates against the declared `status` field.
#[must_use]
pub fn validate(mut filter: Filter, spec: &TableSpec) -> Filter {
    filter.retain(|key| {
        if spec.has_field(key.column()) {
            return true;
        }
        if let Some((table, column)) = key.alias() {
            if is_safe_ident(table) && is_safe_ident(column) {
                return true;
            }
        }
        debug!(
            table = %spec.table,
            key = %key.column(),
            "dropping filter key not in declared fields"
        );
        false
    });
    filter
}
