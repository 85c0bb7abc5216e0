//! Free-text normalization for the designated text columns.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SharkwatchError};
use crate::table::{Table, Value};

use super::config::CleaningOptions;
use super::lookups::{CaseConvention, TEXT_COLUMNS, TextColumnRule, resolve_column};
use super::models::{ColumnRename, ColumnStandardization, StandardizeReport, StepName};

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace pattern"))
}

/// Trims and collapses internal whitespace runs to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_pattern().replace_all(text.trim(), " ").into_owned()
}

/// Title-cases a string: a letter is upper-cased when it follows a
/// non-letter (or starts the string) and lower-cased otherwise.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Normalizes a single text value under a column rule.
///
/// Returns `None` when the value is blank or one of the rule's invalid
/// markers.
pub fn normalize_text(rule: &TextColumnRule, raw: &str) -> Option<String> {
    let collapsed = collapse_whitespace(raw);
    if collapsed.is_empty() {
        return None;
    }

    let key = collapsed.to_uppercase();
    if rule.invalid_markers.contains(&key.as_str()) {
        return None;
    }
    if let Some((_, canonical)) = rule.synonyms.iter().find(|(variant, _)| *variant == key) {
        return Some((*canonical).to_string());
    }

    Some(match rule.case {
        CaseConvention::Preserve => collapsed,
        CaseConvention::Upper => key,
        CaseConvention::Title => title_case(&collapsed),
    })
}

fn distinct_non_missing(table: &Table, index: usize) -> u64 {
    table
        .rows()
        .iter()
        .map(|row| &row[index])
        .filter(|v| !v.is_missing())
        .map(Value::grouping_key)
        .collect::<HashSet<_>>()
        .len() as u64
}

fn standardize_column(table: &mut Table, index: usize, rule: &TextColumnRule) -> ColumnStandardization {
    let unique_before = distinct_non_missing(table, index);
    let mut values_changed: u64 = 0;
    let mut values_nulled: u64 = 0;

    for row in table.rows_mut() {
        let Value::Text(raw) = &row[index] else {
            continue;
        };
        let updated = match normalize_text(rule, raw) {
            Some(text) => Value::Text(text),
            None => {
                values_nulled = values_nulled.saturating_add(1);
                Value::Null
            }
        };
        if updated != row[index] {
            values_changed = values_changed.saturating_add(1);
            row[index] = updated;
        }
    }

    ColumnStandardization {
        column: rule.column.to_string(),
        unique_before,
        unique_after: distinct_non_missing(table, index),
        values_changed,
        values_nulled,
        renamed: None,
    }
}

/// Normalizes every designated text column present in the table.
///
/// `Country` is required; the other designated columns are skipped when
/// absent and listed in the report. Non-text cells are left untouched.
pub fn standardize_strings(
    mut table: Table,
    _options: &CleaningOptions,
) -> Result<(Table, StandardizeReport)> {
    let mut report = StandardizeReport::default();

    // Resolve everything first so a missing required column leaves the
    // table untouched.
    let mut resolved = Vec::with_capacity(TEXT_COLUMNS.len());
    for rule in TEXT_COLUMNS {
        match resolve_column(table.columns(), rule.column, rule.aliases) {
            Some((index, alias)) => resolved.push((rule, index, alias.map(str::to_string))),
            None if rule.required => {
                return Err(SharkwatchError::schema(
                    StepName::StandardizeStrings.as_str(),
                    rule.column,
                ));
            }
            None => report.skipped.push(rule.column.to_string()),
        }
    }

    for (rule, index, alias) in resolved {
        let mut column = standardize_column(&mut table, index, rule);
        if let Some(from) = alias {
            tracing::debug!("Renaming column '{}' to '{}'", from, rule.column);
            table.rename_column(index, rule.column);
            column.renamed = Some(ColumnRename {
                from,
                to: rule.column.to_string(),
            });
        }
        tracing::debug!(
            "Standardized '{}': {} -> {} unique values, {} changed",
            column.column,
            column.unique_before,
            column.unique_after,
            column.values_changed
        );
        report.columns.push(column);
    }

    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(column: &str) -> &'static TextColumnRule {
        TEXT_COLUMNS
            .iter()
            .find(|r| r.column == column)
            .unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Cape   Town \t"), "Cape Town");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("SURFING"), "Surfing");
        assert_eq!(title_case("spearfishing / diving"), "Spearfishing / Diving");
        assert_eq!(title_case("o'brien"), "O'Brien");
        assert_eq!(title_case("tiger shark, 3m"), "Tiger Shark, 3M");
        assert_eq!(title_case(&title_case("bOdY bOaRdInG")), "Body Boarding");
    }

    #[test]
    fn test_country_synonyms_and_case() {
        let country = rule("Country");
        assert_eq!(normalize_text(country, " us ").as_deref(), Some("USA"));
        assert_eq!(normalize_text(country, "United  States").as_deref(), Some("USA"));
        assert_eq!(normalize_text(country, "rsa").as_deref(), Some("SOUTH AFRICA"));
        assert_eq!(normalize_text(country, "Australia").as_deref(), Some("AUSTRALIA"));
        assert_eq!(normalize_text(country, "unknown"), None);
    }

    #[test]
    fn test_species_markers_and_synonyms() {
        let species = rule("Species");
        assert_eq!(normalize_text(species, "great white shark").as_deref(), Some("White Shark"));
        assert_eq!(normalize_text(species, "Not stated"), None);
        assert_eq!(
            normalize_text(species, "Tiger shark, 3m").as_deref(),
            Some("Tiger Shark, 3M")
        );
    }

    #[test]
    fn test_preserve_case_only_trims() {
        let location = rule("Location");
        assert_eq!(
            normalize_text(location, "  Bondi   Beach, NSW ").as_deref(),
            Some("Bondi Beach, NSW")
        );
    }

    #[test]
    fn test_standardize_strings_renames_and_reports() {
        let table = Table::from_raw_rows(
            &["Country", "Species ", "Activity"],
            &[
                &["us", "white shark", "surfing"],
                &["USA", "White Shark", "Surfing"],
                &["england", "Unknown", "  swimming "],
            ],
        )
        .unwrap();
        let (table, report) = standardize_strings(table, &CleaningOptions::default()).unwrap();

        assert!(table.has_column("Species"));
        assert!(!table.has_column("Species "));
        assert_eq!(table.get(0, "Country"), Some(&Value::from("USA")));
        assert_eq!(table.get(2, "Country"), Some(&Value::from("UNITED KINGDOM")));
        assert!(table.get(2, "Species").unwrap().is_null());

        let country = &report.columns[0];
        assert_eq!(country.column, "Country");
        assert_eq!(country.unique_before, 3);
        assert_eq!(country.unique_after, 2);

        let species = report.columns.iter().find(|c| c.column == "Species").unwrap();
        assert_eq!(species.values_nulled, 1);
        assert_eq!(
            species.renamed,
            Some(ColumnRename {
                from: "Species ".to_string(),
                to: "Species".to_string()
            })
        );
        assert!(report.skipped.contains(&"Injury".to_string()));
    }

    #[test]
    fn test_standardize_requires_country() {
        let table = Table::from_raw_rows(&["Activity"], &[&["Surfing"]]).unwrap();
        let err = standardize_strings(table, &CleaningOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SharkwatchError::Schema { ref step, ref column }
                if step == "standardize_strings" && column == "Country"
        ));
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let table = Table::from_raw_rows(
            &["Country", "Type"],
            &[&[" south  africa", "unprovoked"], &["RSA", "Invalid"]],
        )
        .unwrap();
        let options = CleaningOptions::default();
        let (once, _) = standardize_strings(table, &options).unwrap();
        let (twice, report) = standardize_strings(once.clone(), &options).unwrap();

        assert_eq!(once, twice);
        assert!(report.columns.iter().all(|c| c.values_changed == 0 && c.renamed.is_none()));
    }
}
