//! Age extraction from the free-form `Age` column.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SharkwatchError, ValueError};
use crate::table::{Table, Value};

use super::config::{AgeBounds, CleaningOptions};
use super::lookups::{AGE_COLUMN, AGE_TERMS};
use super::models::{AgeExtractionReport, StepName};

/// Pre-compiled age patterns, tried in this order after the plain-integer
/// check: months, range, decade, embedded number.
pub struct AgePatterns {
    plain: Regex,
    months: Regex,
    range: Regex,
    decade: Regex,
    number: Regex,
}

impl AgePatterns {
    /// Gets the singleton instance of the compiled patterns.
    pub fn instance() -> &'static Self {
        static PATTERNS: OnceLock<AgePatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        Self {
            plain: Regex::new(r"^\d{1,3}$").expect("Invalid plain age pattern"),
            months: Regex::new(r"(?i)\b\d+\s*(?:months?|mos?)\b").expect("Invalid month age pattern"),
            range: Regex::new(r"(?i)\b(\d{1,3})\s*(?:-|to|or|&)\s*(\d{1,3})\b")
                .expect("Invalid age range pattern"),
            decade: Regex::new(r"(?i)\b(\d{1,2}0)'?s\b").expect("Invalid decade pattern"),
            number: Regex::new(r"(?:^|\D)(\d+)").expect("Invalid embedded number pattern"),
        }
    }

    /// Interprets an age string, without applying bounds.
    pub fn parse(&self, text: &str) -> Option<i64> {
        let text = text.trim();

        if self.plain.is_match(text) {
            return text.parse().ok();
        }
        if self.months.is_match(text) {
            return Some(0);
        }
        if let Some(caps) = self.range.captures(text) {
            let low: i64 = caps.get(1)?.as_str().parse().ok()?;
            let high: i64 = caps.get(2)?.as_str().parse().ok()?;
            return Some(low.saturating_add(high).div_euclid(2));
        }
        if let Some(caps) = self.decade.captures(text) {
            return caps.get(1)?.as_str().parse().ok();
        }
        if let Some(caps) = self.number.captures(text) {
            return caps.get(1)?.as_str().parse().ok();
        }

        let lower = text.to_lowercase();
        AGE_TERMS
            .iter()
            .find(|(term, _)| lower.contains(term))
            .map(|(_, age)| *age)
    }
}

/// Parses one `Age` cell into a whole age within `bounds`.
///
/// Returns `Ok(None)` for a missing value.
pub fn parse_age(value: &Value, bounds: AgeBounds) -> std::result::Result<Option<i64>, ValueError> {
    let age = match value {
        v if v.is_missing() => return Ok(None),
        Value::Integer(i) => *i,
        Value::Float(f) if f.is_finite() => f.floor() as i64,
        Value::Text(text) => AgePatterns::instance()
            .parse(text)
            .ok_or_else(|| ValueError::Unparseable(text.clone()))?,
        other => return Err(ValueError::Unparseable(other.to_cell())),
    };

    if bounds.contains(age) {
        Ok(Some(age))
    } else {
        Err(ValueError::OutOfBounds {
            value: age,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

/// Rewrites `Age` in place as whole numbers; anything unparseable or out
/// of bounds becomes null.
pub fn extract_ages(
    mut table: Table,
    options: &CleaningOptions,
) -> Result<(Table, AgeExtractionReport)> {
    let index = table
        .column_index(AGE_COLUMN)
        .ok_or_else(|| SharkwatchError::schema(StepName::ExtractAges.as_str(), AGE_COLUMN))?;

    let mut report = AgeExtractionReport::default();
    for row in table.rows_mut() {
        let updated = match parse_age(&row[index], options.age_bounds) {
            Ok(Some(age)) => {
                report.parsed = report.parsed.saturating_add(1);
                Value::Integer(age)
            }
            Ok(None) => {
                report.missing = report.missing.saturating_add(1);
                Value::Null
            }
            Err(ValueError::OutOfBounds { .. }) => {
                report.out_of_range = report.out_of_range.saturating_add(1);
                Value::Null
            }
            Err(ValueError::Unparseable(_)) => {
                report.failed = report.failed.saturating_add(1);
                Value::Null
            }
        };
        if updated != row[index] {
            report.values_changed = report.values_changed.saturating_add(1);
            row[index] = updated;
        }
    }

    tracing::debug!(
        "Extracted {} ages ({} out of range, {} failed, {} missing)",
        report.parsed,
        report.out_of_range,
        report.failed,
        report.missing
    );

    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<i64> {
        AgePatterns::instance().parse(text)
    }

    #[test]
    fn test_formats() {
        assert_eq!(parse("25"), Some(25));
        assert_eq!(parse(" 7 "), Some(7));
        assert_eq!(parse("18 to 22"), Some(20));
        assert_eq!(parse("30 or 35"), Some(32));
        assert_eq!(parse("20s"), Some(20));
        assert_eq!(parse("60's"), Some(60));
        assert_eq!(parse("18 months"), Some(0));
        assert_eq!(parse("ca. 30"), Some(30));
        assert_eq!(parse("Teen"), Some(15));
        assert_eq!(parse("adult"), Some(30));
        assert_eq!(parse("elderly"), Some(70));
        assert_eq!(parse("unknown"), None);
    }

    #[test]
    fn test_tie_break_months_beat_range() {
        // A range of months is still an infant
        assert_eq!(parse("2 to 3 months"), Some(0));
    }

    #[test]
    fn test_tie_break_range_beats_embedded_number() {
        // The first number alone would give 20
        assert_eq!(parse("20 or 30"), Some(25));
    }

    #[test]
    fn test_tie_break_decade_beats_terms() {
        assert_eq!(parse("teen or 20s"), Some(20));
        assert_eq!(parse("30s or 40s"), Some(30));
    }

    #[test]
    fn test_fraction_is_not_a_range() {
        assert_eq!(parse("6 1/2"), Some(6));
        assert_eq!(parse("6 or 7 1/2"), Some(6));
    }

    #[test]
    fn test_embedded_number_is_whole() {
        assert_eq!(parse("1000 years"), Some(1000));
        assert_eq!(parse("45yrs"), Some(45));
        let bounds = AgeBounds::default();
        assert!(matches!(
            parse_age(&Value::from("1000 years"), bounds),
            Err(ValueError::OutOfBounds { value: 1000, .. })
        ));
    }

    #[test]
    fn test_tie_break_number_beats_terms() {
        assert_eq!(parse("adult, 45"), Some(45));
    }

    #[test]
    fn test_parse_age_bounds() {
        let bounds = AgeBounds::default();
        assert_eq!(parse_age(&Value::Integer(120), bounds), Ok(Some(120)));
        assert_eq!(parse_age(&Value::Integer(0), bounds), Ok(Some(0)));
        assert_eq!(
            parse_age(&Value::Integer(121), bounds),
            Err(ValueError::OutOfBounds {
                value: 121,
                min: 0,
                max: 120
            })
        );
        assert_eq!(parse_age(&Value::Float(31.5), bounds), Ok(Some(31)));
        assert_eq!(parse_age(&Value::Null, bounds), Ok(None));
        assert!(matches!(
            parse_age(&Value::from("?"), bounds),
            Err(ValueError::Unparseable(_))
        ));
    }

    #[test]
    fn test_extract_ages_rewrites_in_place() {
        let table = Table::from_raw_rows(
            &["Age"],
            &[&["20s"], &["200"], &["unknown"], &[""], &["45"]],
        )
        .unwrap();
        let (table, report) = extract_ages(table, &CleaningOptions::default()).unwrap();

        assert_eq!(table.get(0, "Age"), Some(&Value::Integer(20)));
        assert!(table.get(1, "Age").unwrap().is_null());
        assert!(table.get(2, "Age").unwrap().is_null());
        assert_eq!(table.get(4, "Age"), Some(&Value::Integer(45)));
        assert_eq!(report.parsed, 2);
        assert_eq!(report.out_of_range, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.missing, 1);
        // "45" was already an integer
        assert_eq!(report.values_changed, 3);
    }

    #[test]
    fn test_extract_ages_custom_bounds() {
        let table = Table::from_raw_rows(&["Age"], &[&["5"], &["50"]]).unwrap();
        let options = CleaningOptions::new().with_age_bounds(10, 40);
        let (table, report) = extract_ages(table, &options).unwrap();

        assert!(table.get(0, "Age").unwrap().is_null());
        assert!(table.get(1, "Age").unwrap().is_null());
        assert_eq!(report.out_of_range, 2);
    }

    #[test]
    fn test_extract_ages_requires_age() {
        let table = Table::from_raw_rows(&["Sex"], &[&["M"]]).unwrap();
        assert!(matches!(
            extract_ages(table, &CleaningOptions::default()),
            Err(SharkwatchError::Schema { .. })
        ));
    }
}
