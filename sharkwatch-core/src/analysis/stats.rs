//! Small descriptive-statistics helpers over table columns.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SharkwatchError};
use crate::table::Table;

use super::models::CategoryCount;

/// Position of a column the analysis cannot do without.
pub(crate) fn require_column(table: &Table, column: &str, context: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| SharkwatchError::schema(context, column))
}

/// Counts non-missing labels in a column, most frequent first.
///
/// Ties are ordered by label so results are stable across runs.
pub fn value_counts(table: &Table, column: &str, context: &str) -> Result<Vec<CategoryCount>> {
    let index = require_column(table, column, context)?;
    let mut counts: HashMap<String, u64> = HashMap::new();
    for row in table.rows() {
        let value = &row[index];
        if !value.is_missing() {
            *counts.entry(value.to_cell()).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount::new(label, count))
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    Ok(counts)
}

/// `part / whole * 100`, or 0 for an empty whole.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Rounds to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

/// Most frequent value, smallest first on ties.
pub fn mode(values: &[i64]) -> Option<i64> {
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, and max_by_key keeps the last maximum,
    // so iterate in reverse to keep the smallest.
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value)
}
