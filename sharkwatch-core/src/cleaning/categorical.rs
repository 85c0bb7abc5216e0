//! Collapsing small-cardinality columns onto fixed canonical sets.

use std::collections::BTreeMap;

use crate::error::{Result, SharkwatchError};
use crate::table::{Table, Value};

use super::config::CleaningOptions;
use super::lookups::{CATEGORICAL_COLUMNS, CategoricalRule, resolve_column};
use super::models::{CategoricalMapping, CategoricalReport, ColumnRename, StepName};

/// Maps a raw value to its canonical token.
///
/// Matching is case-insensitive on the trimmed value: an exact variant
/// match wins, otherwise the longest variant that prefixes the value at a
/// word boundary. `None` means no variant matched.
pub fn match_category(rule: &CategoricalRule, raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_uppercase();
    if key.is_empty() {
        return None;
    }

    for (token, variants) in rule.variants {
        if variants.contains(&key.as_str()) {
            return Some(*token);
        }
    }

    rule.variants
        .iter()
        .flat_map(|(token, variants)| variants.iter().map(move |v| (*token, *v)))
        .filter(|(_, variant)| {
            key.strip_prefix(*variant)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|next| !next.is_alphanumeric())
        })
        .max_by_key(|(_, variant)| variant.len())
        .map(|(token, _)| token)
}

fn normalize_column(table: &mut Table, index: usize, rule: &CategoricalRule) -> CategoricalMapping {
    let mut canonical_counts: BTreeMap<String, u64> = rule
        .canonical_set()
        .into_iter()
        .map(|token| (token.to_string(), 0))
        .collect();
    let mut nulled: u64 = 0;
    let mut already_null: u64 = 0;
    let mut values_changed: u64 = 0;

    for row in table.rows_mut() {
        let value = &row[index];
        let updated = if value.is_missing() {
            already_null = already_null.saturating_add(1);
            Value::Null
        } else {
            match match_category(rule, &value.to_cell()) {
                Some(token) => {
                    if let Some(count) = canonical_counts.get_mut(token) {
                        *count = count.saturating_add(1);
                    }
                    Value::Text(token.to_string())
                }
                None => {
                    nulled = nulled.saturating_add(1);
                    Value::Null
                }
            }
        };
        if updated != row[index] {
            values_changed = values_changed.saturating_add(1);
            row[index] = updated;
        }
    }

    CategoricalMapping {
        column: rule.column.to_string(),
        canonical_counts,
        nulled,
        already_null,
        values_changed,
        renamed: None,
    }
}

/// Normalizes `Sex` to {M, F} and `Fatal` to {Y, N}; anything else
/// becomes null. The raw `Fatal Y/N` header is renamed to `Fatal`.
pub fn normalize_categoricals(
    mut table: Table,
    _options: &CleaningOptions,
) -> Result<(Table, CategoricalReport)> {
    let mut resolved = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
    for rule in CATEGORICAL_COLUMNS {
        let (index, alias) = resolve_column(table.columns(), rule.column, rule.aliases)
            .ok_or_else(|| {
                SharkwatchError::schema(StepName::NormalizeCategoricals.as_str(), rule.column)
            })?;
        resolved.push((rule, index, alias.map(str::to_string)));
    }

    let mut report = CategoricalReport::default();
    for (rule, index, alias) in resolved {
        let mut mapping = normalize_column(&mut table, index, rule);
        if let Some(from) = alias {
            tracing::debug!("Renaming column '{}' to '{}'", from, rule.column);
            table.rename_column(index, rule.column);
            mapping.renamed = Some(ColumnRename {
                from,
                to: rule.column.to_string(),
            });
        }
        tracing::debug!(
            "Normalized '{}': {:?}, {} nulled",
            mapping.column,
            mapping.canonical_counts,
            mapping.nulled
        );
        report.columns.push(mapping);
    }

    Ok((table, report))
}
