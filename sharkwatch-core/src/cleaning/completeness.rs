//! Completeness steps: pruning empty columns and the missing-value policy.
//!
//! Missing means `Null` or blank text, as defined by [`Value::is_missing`].

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::table::{Table, Value};

use super::config::CleaningOptions;
use super::lookups::{MISSING_PLACEHOLDERS, is_protected_column};
use super::models::{ColumnMissing, DropColumnsReport, DropReason, DroppedColumn, MissingValueReport};

fn anonymous_column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:unnamed(?::?\s*\d+)?|index|level_\d+|\d+)?$")
            .expect("Invalid anonymous column pattern")
    })
}

/// Returns true for headers that carry no meaning (blank, `Unnamed: 3`,
/// `index`, `level_0`, bare numbers).
pub fn is_anonymous_column(name: &str) -> bool {
    anonymous_column_pattern().is_match(name.trim())
}

/// Drops anonymous columns and columns whose missing fraction exceeds
/// `options.missing_threshold`.
///
/// Columns that later steps depend on (see
/// [`is_protected_column`](super::lookups::is_protected_column)) are kept
/// even when sparse.
pub fn drop_empty_columns(
    mut table: Table,
    options: &CleaningOptions,
) -> Result<(Table, DropColumnsReport)> {
    let mut dropped = Vec::new();
    let mut indices = Vec::new();

    for (index, name) in table.columns().iter().enumerate() {
        let missing_fraction = table.missing_fraction_at(index);
        let reason = if is_anonymous_column(name) {
            Some(DropReason::Anonymous)
        } else if missing_fraction > options.missing_threshold {
            if is_protected_column(name) {
                tracing::warn!(
                    "Keeping sparse column '{}' ({:.1}% missing); later steps require it",
                    name,
                    missing_fraction * 100.0
                );
                None
            } else {
                Some(DropReason::Sparse)
            }
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::debug!(
                "Dropping column '{}' ({:?}, {:.1}% missing)",
                name,
                reason,
                missing_fraction * 100.0
            );
            indices.push(index);
            dropped.push(DroppedColumn {
                name: name.clone(),
                missing_fraction,
                reason,
            });
        }
    }

    table.drop_columns(&indices);

    Ok((
        table,
        DropColumnsReport {
            threshold: options.missing_threshold,
            dropped,
        },
    ))
}

fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || MISSING_PLACEHOLDERS.contains(&trimmed.to_uppercase().as_str())
}

/// Applies the missing-value policy.
///
/// Placeholder tokens become null; nothing is imputed and no row or column
/// is removed. The report lists the remaining missing fraction per column
/// and the number of rows above `options.row_missing_threshold`.
pub fn handle_missing(
    mut table: Table,
    options: &CleaningOptions,
) -> Result<(Table, MissingValueReport)> {
    let mut placeholders_nulled: u64 = 0;

    for row in table.rows_mut() {
        for value in row.iter_mut() {
            if let Value::Text(text) = value
                && is_placeholder(text)
            {
                *value = Value::Null;
                placeholders_nulled = placeholders_nulled.saturating_add(1);
            }
        }
    }

    let column_missing = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| ColumnMissing {
            column: column.clone(),
            missing_fraction: table.missing_fraction_at(index),
        })
        .collect();

    let column_count = table.column_count();
    let sparse_rows = if column_count == 0 {
        0
    } else {
        table
            .rows()
            .iter()
            .filter(|row| {
                let missing = row.iter().filter(|v| v.is_missing()).count();
                missing as f64 / column_count as f64 > options.row_missing_threshold
            })
            .count() as u64
    };

    Ok((
        table,
        MissingValueReport {
            placeholders_nulled,
            column_missing,
            row_missing_threshold: options.row_missing_threshold,
            sparse_rows,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse_table(missing: usize, total: usize) -> Table {
        let mut rows: Vec<Vec<&str>> = Vec::new();
        for i in 0..total {
            rows.push(vec!["USA", if i < missing { "" } else { "x" }]);
        }
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        Table::from_raw_rows(&["Country", "Href"], &rows).unwrap()
    }

    #[test]
    fn test_anonymous_columns() {
        assert!(is_anonymous_column(""));
        assert!(is_anonymous_column("  "));
        assert!(is_anonymous_column("Unnamed: 22"));
        assert!(is_anonymous_column("unnamed:0"));
        assert!(is_anonymous_column("index"));
        assert!(is_anonymous_column("level_0"));
        assert!(is_anonymous_column("7"));
        assert!(!is_anonymous_column("Country"));
        assert!(!is_anonymous_column("Unnamed Beach"));
        assert!(!is_anonymous_column("Case Number"));
    }

    #[test]
    fn test_drops_column_above_threshold() {
        // 96% missing against a 95% threshold
        let table = sparse_table(96, 100);
        let (table, report) = drop_empty_columns(table, &CleaningOptions::default()).unwrap();

        assert_eq!(table.columns(), &["Country".to_string()]);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].name, "Href");
        assert_eq!(report.dropped[0].reason, DropReason::Sparse);
        assert!((report.dropped[0].missing_fraction - 0.96).abs() < 1e-9);
    }

    #[test]
    fn test_keeps_column_at_threshold() {
        // Exactly 95% is not "exceeding"
        let table = sparse_table(95, 100);
        let (table, report) = drop_empty_columns(table, &CleaningOptions::default()).unwrap();

        assert_eq!(table.column_count(), 2);
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn test_drops_anonymous_even_when_populated() {
        let table =
            Table::from_raw_rows(&["Country", "Unnamed: 21"], &[&["USA", "1"], &["RSA", "2"]])
                .unwrap();
        let (table, report) = drop_empty_columns(table, &CleaningOptions::default()).unwrap();

        assert_eq!(table.column_count(), 1);
        assert_eq!(report.dropped[0].reason, DropReason::Anonymous);
        assert_eq!(report.dropped_names(), vec!["Unnamed: 21"]);
    }

    #[test]
    fn test_keeps_sparse_required_columns() {
        let mut rows: Vec<Vec<&str>> = vec![vec!["USA", "1 Jan 2000", "x"]];
        rows.extend((0..99).map(|_| vec!["", "", ""]));
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        let table = Table::from_raw_rows(&["Country", "Date", "Notes"], &rows).unwrap();
        let (table, report) = drop_empty_columns(table, &CleaningOptions::default()).unwrap();

        assert_eq!(table.columns(), &["Country".to_string(), "Date".to_string()]);
        assert_eq!(report.dropped_names(), vec!["Notes"]);
    }

    #[test]
    fn test_drop_is_idempotent() {
        let table = sparse_table(99, 100);
        let options = CleaningOptions::default();
        let (table, _) = drop_empty_columns(table, &options).unwrap();
        let (again, report) = drop_empty_columns(table.clone(), &options).unwrap();

        assert_eq!(table, again);
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn test_handle_missing_nulls_placeholders_only() {
        let table = Table::from_raw_rows(
            &["Name", "Injury"],
            &[&["nan", "Laceration"], &["N/A", "  "], &["Nan Madol", "?"]],
        )
        .unwrap();
        let (table, report) = handle_missing(table, &CleaningOptions::default()).unwrap();

        assert_eq!(report.placeholders_nulled, 4);
        assert!(table.get(0, "Name").unwrap().is_null());
        assert_eq!(
            table.get(2, "Name"),
            Some(&Value::Text("Nan Madol".to_string()))
        );
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_handle_missing_reports_fractions_and_sparse_rows() {
        let table = Table::from_raw_rows(
            &["A", "B", "C", "D"],
            &[&["1", "", "", ""], &["1", "2", "3", ""], &["1", "2", "3", "4"]],
        )
        .unwrap();
        let (table, report) = handle_missing(table, &CleaningOptions::default()).unwrap();

        // Row 0 is 75% missing, above the 70% default
        assert_eq!(report.sparse_rows, 1);
        assert_eq!(table.row_count(), 3);
        let d = report
            .column_missing
            .iter()
            .find(|c| c.column == "D")
            .unwrap();
        assert!((d.missing_fraction - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.placeholders_nulled, 0);
    }
}
