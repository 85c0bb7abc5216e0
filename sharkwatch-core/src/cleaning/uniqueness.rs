//! Row-level de-duplication.
//!
//! Rows are compared on every retained column using
//! [`Value::grouping_key`](crate::table::Value::grouping_key), so nulls
//! compare equal to each other and `Integer(1)` never equals `Text("1")`.

use std::collections::HashSet;

use crate::error::Result;
use crate::table::{Record, Table};

use super::config::CleaningOptions;
use super::models::DeduplicateReport;

/// Removes exact duplicate rows, keeping the first occurrence.
pub fn deduplicate_rows(
    mut table: Table,
    _options: &CleaningOptions,
) -> Result<(Table, DeduplicateReport)> {
    let rows_before = table.row_count() as u64;
    let keep = first_occurrences(table.rows());
    let rows_removed = keep.iter().filter(|k| !**k).count() as u64;

    if rows_removed > 0 {
        tracing::debug!("Removing {} duplicate rows of {}", rows_removed, rows_before);
        table.retain_rows(&keep);
    }

    Ok((
        table,
        DeduplicateReport {
            rows_before,
            rows_removed,
        },
    ))
}

/// Flags each row true if no identical row precedes it.
fn first_occurrences(rows: &[Record]) -> Vec<bool> {
    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(rows.len());
    rows.iter()
        .map(|row| seen.insert(row.iter().map(|v| v.grouping_key()).collect()))
        .collect()
}
