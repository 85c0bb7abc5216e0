//! Regex-based date extraction into the derived `Date_Parsed` column.
//!
//! Matchers are tried in a fixed order and the first whose pattern matches
//! claims the value. A claimed value that does not form a real calendar
//! date is a failure; later matchers are not consulted.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SharkwatchError, ValueError};
use crate::table::{Table, Value};

use super::config::CleaningOptions;
use super::lookups::{DATE_COLUMN, DATE_PARSED_COLUMN, YEAR_COLUMN};
use super::models::{DateExtractionReport, StepName};

/// The date matchers, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateMatcher {
    /// `27th November 2025`, `06-Sep-2017`, `5 March` (year from `Year`)
    OrdinalMonth,
    /// `2025-11-27`
    Iso,
    /// `11/27/2025` or `27/11/2025`
    Slash,
    /// `Before 1903`, `1960s`
    YearOnly,
}

impl DateMatcher {
    /// Name used in report counters.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateMatcher::OrdinalMonth => "ordinal_month",
            DateMatcher::Iso => "iso",
            DateMatcher::Slash => "slash",
            DateMatcher::YearOnly => "year_only",
        }
    }
}

/// Pre-compiled date patterns.
pub struct DatePatterns {
    ordinal_month: Regex,
    iso: Regex,
    slash: Regex,
    year_only: Regex,
}

impl DatePatterns {
    /// Gets the singleton instance of the compiled patterns.
    pub fn instance() -> &'static Self {
        static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        Self {
            ordinal_month: Regex::new(
                r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[\s\-]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:[\s,\-]+(\d{4}))?\b",
            )
            .expect("Invalid ordinal date pattern"),
            iso: Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("Invalid ISO date pattern"),
            slash: Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")
                .expect("Invalid slash date pattern"),
            year_only: Regex::new(r"\b(\d{4})s?\b").expect("Invalid year pattern"),
        }
    }

    /// Parses a date string, returning the claiming matcher with the date.
    ///
    /// `fallback_year` completes an ordinal-month date that carries no year.
    pub fn parse(
        &self,
        text: &str,
        fallback_year: Option<i64>,
    ) -> std::result::Result<(NaiveDate, DateMatcher), ValueError> {
        let unparseable = || ValueError::Unparseable(text.to_string());

        if let Some(caps) = self.ordinal_month.captures(text) {
            let day = capture_number(&caps, 1);
            let month = caps.get(2).and_then(|m| month_number(m.as_str()));
            let year = capture_number(&caps, 3).or(fallback_year.filter(|y| *y >= 1));
            return build_date(year, month, day)
                .map(|d| (d, DateMatcher::OrdinalMonth))
                .ok_or_else(unparseable);
        }

        if let Some(caps) = self.iso.captures(text) {
            let (year, month, day) = (
                capture_number(&caps, 1),
                capture_number(&caps, 2),
                capture_number(&caps, 3),
            );
            return build_date(year, month.and_then(to_u32), day)
                .map(|d| (d, DateMatcher::Iso))
                .ok_or_else(unparseable);
        }

        if let Some(caps) = self.slash.captures(text) {
            let (first, second, year) = (
                capture_number(&caps, 1),
                capture_number(&caps, 2),
                capture_number(&caps, 3),
            );
            // Day-first only when the first field cannot be a month.
            let (month, day) = match first {
                Some(f) if f > 12 => (second, first),
                _ => (first, second),
            };
            return build_date(year, month.and_then(to_u32), day)
                .map(|d| (d, DateMatcher::Slash))
                .ok_or_else(unparseable);
        }

        if let Some(caps) = self.year_only.captures(text) {
            return build_date(capture_number(&caps, 1), Some(1), Some(1))
                .map(|d| (d, DateMatcher::YearOnly))
                .ok_or_else(unparseable);
        }

        Err(unparseable())
    }
}

fn capture_number(caps: &Captures<'_>, group: usize) -> Option<i64> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn to_u32(n: i64) -> Option<u32> {
    u32::try_from(n).ok()
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn build_date(year: Option<i64>, month: Option<u32>, day: Option<i64>) -> Option<NaiveDate> {
    let year = i32::try_from(year?).ok().filter(|y| *y >= 1)?;
    let day = u32::try_from(day?).ok()?;
    NaiveDate::from_ymd_opt(year, month?, day)
}

/// Reads a year from a `Year` cell: integers, whole floats and digit text.
pub fn year_of(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Value::Text(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// Parses one `Date` cell.
///
/// Returns `Ok(None)` for a missing value and an error when no matcher
/// produces a valid date.
pub fn parse_date(
    value: &Value,
    fallback_year: Option<i64>,
) -> std::result::Result<Option<(NaiveDate, DateMatcher)>, ValueError> {
    match value {
        v if v.is_missing() => Ok(None),
        Value::Date(d) => Ok(Some((*d, DateMatcher::Iso))),
        other => DatePatterns::instance()
            .parse(&other.to_cell(), fallback_year)
            .map(Some),
    }
}

/// Parses `Date` into `Date_Parsed` and coerces `Year` to integers.
///
/// `Date` is required. `Date_Parsed` is created when absent; `Year` is
/// optional.
pub fn extract_dates(
    mut table: Table,
    _options: &CleaningOptions,
) -> Result<(Table, DateExtractionReport)> {
    let date_index = table
        .column_index(DATE_COLUMN)
        .ok_or_else(|| SharkwatchError::schema(StepName::ExtractDates.as_str(), DATE_COLUMN))?;
    let year_index = table.column_index(YEAR_COLUMN);

    let mut report = DateExtractionReport::default();
    let parsed_index = match table.column_index(DATE_PARSED_COLUMN) {
        Some(index) => index,
        None => {
            report.column_added = true;
            table.push_null_column(DATE_PARSED_COLUMN)
        }
    };

    let mut by_matcher: BTreeMap<String, u64> = BTreeMap::new();
    for row in table.rows_mut() {
        let fallback_year = year_index.and_then(|i| year_of(&row[i]));
        let parsed = match parse_date(&row[date_index], fallback_year) {
            Ok(Some((date, matcher))) => {
                report.parsed = report.parsed.saturating_add(1);
                let count = by_matcher.entry(matcher.as_str().to_string()).or_insert(0);
                *count = count.saturating_add(1);
                Value::Date(date)
            }
            Ok(None) => {
                report.missing = report.missing.saturating_add(1);
                Value::Null
            }
            Err(e) => {
                tracing::trace!("Date not parsed: {}", e);
                report.failed = report.failed.saturating_add(1);
                Value::Null
            }
        };
        if parsed != row[parsed_index] {
            report.values_changed = report.values_changed.saturating_add(1);
            row[parsed_index] = parsed;
        }

        if let Some(i) = year_index {
            let coerced = year_of(&row[i]).map_or(Value::Null, Value::Integer);
            if coerced != row[i] {
                report.year_values_coerced = report.year_values_coerced.saturating_add(1);
                row[i] = coerced;
            }
        }
    }
    report.by_matcher = by_matcher;

    tracing::debug!(
        "Parsed {} dates ({} failed, {} missing) by matcher {:?}",
        report.parsed,
        report.failed,
        report.missing,
        report.by_matcher
    );

    Ok((table, report))
}
