//! Cleaning report models.
//!
//! Every step returns a typed [`StepReport`]; the pipeline collects them in
//! order into a [`CleaningReport`]. Reports are plain data and serialize to
//! JSON for the `--report` output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the pipeline steps, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    DropEmptyColumns,
    DeduplicateRows,
    StandardizeStrings,
    NormalizeCategoricals,
    ExtractDates,
    ExtractAges,
    HandleMissing,
}

impl StepName {
    /// All steps in the order `run_all` applies them.
    pub const ALL: [StepName; 7] = [
        StepName::DropEmptyColumns,
        StepName::DeduplicateRows,
        StepName::StandardizeStrings,
        StepName::NormalizeCategoricals,
        StepName::ExtractDates,
        StepName::ExtractAges,
        StepName::HandleMissing,
    ];

    /// Snake-case name used in errors, logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::DropEmptyColumns => "drop_empty_columns",
            StepName::DeduplicateRows => "deduplicate_rows",
            StepName::StandardizeStrings => "standardize_strings",
            StepName::NormalizeCategoricals => "normalize_categoricals",
            StepName::ExtractDates => "extract_dates",
            StepName::ExtractAges => "extract_ages",
            StepName::HandleMissing => "handle_missing",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a column was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropReason {
    /// Missing fraction above the threshold
    Sparse,
    /// No semantic name (index or export artifact)
    Anonymous,
}

/// A column removed by `drop_empty_columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedColumn {
    /// Column name as it appeared in the input
    pub name: String,
    /// Missing fraction at the time of removal (0.0-1.0)
    pub missing_fraction: f64,
    /// Reason for removal
    pub reason: DropReason,
}

/// A column renamed to its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Name before the step
    pub from: String,
    /// Canonical name after the step
    pub to: String,
}

/// Outcome of `drop_empty_columns`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DropColumnsReport {
    /// Threshold applied
    pub threshold: f64,
    /// Columns removed, in their original order
    pub dropped: Vec<DroppedColumn>,
}

impl DropColumnsReport {
    /// Names of the dropped columns.
    pub fn dropped_names(&self) -> Vec<&str> {
        self.dropped.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Outcome of `deduplicate_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeduplicateReport {
    /// Rows seen
    pub rows_before: u64,
    /// Exact duplicates removed
    pub rows_removed: u64,
}

/// Per-column outcome of `standardize_strings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStandardization {
    /// Canonical column name
    pub column: String,
    /// Distinct non-missing values before the step
    pub unique_before: u64,
    /// Distinct non-missing values after the step
    pub unique_after: u64,
    /// Values rewritten (including those nulled)
    pub values_changed: u64,
    /// Values replaced by null as invalid markers
    pub values_nulled: u64,
    /// Rename applied to reach the canonical name
    pub renamed: Option<ColumnRename>,
}

/// Outcome of `standardize_strings`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StandardizeReport {
    /// Columns processed
    pub columns: Vec<ColumnStandardization>,
    /// Optional designated columns absent from the table
    pub skipped: Vec<String>,
}

/// Per-column outcome of `normalize_categoricals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalMapping {
    /// Canonical column name
    pub column: String,
    /// Count of values per canonical token after mapping
    pub canonical_counts: BTreeMap<String, u64>,
    /// Non-null values that matched no variant and became null
    pub nulled: u64,
    /// Values that were already null
    pub already_null: u64,
    /// Values rewritten
    pub values_changed: u64,
    /// Rename applied to reach the canonical name
    pub renamed: Option<ColumnRename>,
}

/// Outcome of `normalize_categoricals`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoricalReport {
    /// Columns processed
    pub columns: Vec<CategoricalMapping>,
}

/// Outcome of `extract_dates`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateExtractionReport {
    /// Values that produced a date
    pub parsed: u64,
    /// Non-missing values no matcher could turn into a date
    pub failed: u64,
    /// Missing source values
    pub missing: u64,
    /// Parsed count per matcher
    pub by_matcher: BTreeMap<String, u64>,
    /// `Date_Parsed` cells whose value changed
    pub values_changed: u64,
    /// Whether `Date_Parsed` was created by this run
    pub column_added: bool,
    /// `Year` cells rewritten as integers (or nulled)
    pub year_values_coerced: u64,
}

/// Outcome of `extract_ages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeExtractionReport {
    /// Values that produced an in-range age
    pub parsed: u64,
    /// Values that parsed but fell outside the bounds
    pub out_of_range: u64,
    /// Non-missing values that could not be parsed
    pub failed: u64,
    /// Missing source values
    pub missing: u64,
    /// Cells rewritten
    pub values_changed: u64,
}

/// Missing fraction of one column after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    /// Column name
    pub column: String,
    /// Missing fraction (0.0-1.0)
    pub missing_fraction: f64,
}

/// Outcome of `handle_missing`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MissingValueReport {
    /// Placeholder tokens replaced by null
    pub placeholders_nulled: u64,
    /// Remaining missing fraction per column, in column order
    pub column_missing: Vec<ColumnMissing>,
    /// Threshold used to flag sparse rows
    pub row_missing_threshold: f64,
    /// Rows above the threshold (flagged, never dropped)
    pub sparse_rows: u64,
}

/// Typed outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepReport {
    DropEmptyColumns(DropColumnsReport),
    DeduplicateRows(DeduplicateReport),
    StandardizeStrings(StandardizeReport),
    NormalizeCategoricals(CategoricalReport),
    ExtractDates(DateExtractionReport),
    ExtractAges(AgeExtractionReport),
    HandleMissing(MissingValueReport),
}

impl StepReport {
    /// The step that produced this report.
    pub fn step(&self) -> StepName {
        match self {
            StepReport::DropEmptyColumns(_) => StepName::DropEmptyColumns,
            StepReport::DeduplicateRows(_) => StepName::DeduplicateRows,
            StepReport::StandardizeStrings(_) => StepName::StandardizeStrings,
            StepReport::NormalizeCategoricals(_) => StepName::NormalizeCategoricals,
            StepReport::ExtractDates(_) => StepName::ExtractDates,
            StepReport::ExtractAges(_) => StepName::ExtractAges,
            StepReport::HandleMissing(_) => StepName::HandleMissing,
        }
    }

    /// Number of table modifications the step performed.
    ///
    /// Zero means the step was a no-op on its input.
    pub fn changes(&self) -> u64 {
        match self {
            StepReport::DropEmptyColumns(r) => r.dropped.len() as u64,
            StepReport::DeduplicateRows(r) => r.rows_removed,
            StepReport::StandardizeStrings(r) => r
                .columns
                .iter()
                .map(|c| c.values_changed.saturating_add(u64::from(c.renamed.is_some())))
                .sum(),
            StepReport::NormalizeCategoricals(r) => r
                .columns
                .iter()
                .map(|c| c.values_changed.saturating_add(u64::from(c.renamed.is_some())))
                .sum(),
            StepReport::ExtractDates(r) => r
                .values_changed
                .saturating_add(u64::from(r.column_added))
                .saturating_add(r.year_values_coerced),
            StepReport::ExtractAges(r) => r.values_changed,
            StepReport::HandleMissing(r) => r.placeholders_nulled,
        }
    }

    /// One-line human-readable summary, used for narration.
    pub fn summary(&self) -> String {
        match self {
            StepReport::DropEmptyColumns(r) => format!(
                "Removed {} empty/unnamed columns (threshold {:.0}%)",
                r.dropped.len(),
                r.threshold * 100.0
            ),
            StepReport::DeduplicateRows(r) => {
                format!("Removed {} duplicate rows", r.rows_removed)
            }
            StepReport::StandardizeStrings(r) => {
                let parts: Vec<String> = r
                    .columns
                    .iter()
                    .map(|c| format!("{} {}->{}", c.column, c.unique_before, c.unique_after))
                    .collect();
                format!("Standardized text columns (unique values: {})", parts.join(", "))
            }
            StepReport::NormalizeCategoricals(r) => {
                let parts: Vec<String> = r
                    .columns
                    .iter()
                    .map(|c| {
                        let counts: Vec<String> = c
                            .canonical_counts
                            .iter()
                            .map(|(k, v)| format!("{}={}", k, v))
                            .collect();
                        format!("{} [{}, null={}]", c.column, counts.join(" "), c.nulled)
                    })
                    .collect();
                format!("Normalized categoricals: {}", parts.join("; "))
            }
            StepReport::ExtractDates(r) => format!(
                "Parsed {} dates successfully ({} failed, {} missing)",
                r.parsed, r.failed, r.missing
            ),
            StepReport::ExtractAges(r) => format!(
                "Cleaned Age column - valid ages: {} ({} out of range, {} unparseable)",
                r.parsed, r.out_of_range, r.failed
            ),
            StepReport::HandleMissing(r) => format!(
                "Nulled {} placeholder values; {} rows above {:.0}% missing retained",
                r.placeholders_nulled,
                r.sparse_rows,
                r.row_missing_threshold * 100.0
            ),
        }
    }
}

macro_rules! impl_from_step_report {
    ($($report:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$report> for StepReport {
                fn from(report: $report) -> Self {
                    StepReport::$variant(report)
                }
            }
        )+
    };
}

impl_from_step_report! {
    DropColumnsReport => DropEmptyColumns,
    DeduplicateReport => DeduplicateRows,
    StandardizeReport => StandardizeStrings,
    CategoricalReport => NormalizeCategoricals,
    DateExtractionReport => ExtractDates,
    AgeExtractionReport => ExtractAges,
    MissingValueReport => HandleMissing,
}

/// Structured summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// (rows, columns) of the input
    pub initial_shape: (usize, usize),
    /// (rows, columns) of the output; `None` if the run did not complete
    pub final_shape: Option<(usize, usize)>,
    /// Step outcomes in pipeline order
    pub steps: Vec<StepReport>,
    /// Final column list; empty if the run did not complete
    pub columns: Vec<String>,
    /// Timestamp when the run started
    pub generated_at: DateTime<Utc>,
}

impl CleaningReport {
    /// Creates an empty report for an input of the given shape.
    pub fn new(initial_shape: (usize, usize)) -> Self {
        Self {
            initial_shape,
            final_shape: None,
            steps: Vec::new(),
            columns: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Appends a step outcome.
    pub fn with_step(mut self, step: StepReport) -> Self {
        self.steps.push(step);
        self
    }

    /// Folds a repeated run of a step into that step's existing outcome.
    ///
    /// Dropped columns and removed rows accumulate; missing-value
    /// statistics are replaced by the later measurement. A step that has
    /// not reported yet is appended instead.
    pub fn merge_step(mut self, later: StepReport) -> Self {
        let Some(existing) = self.steps.iter_mut().find(|s| s.step() == later.step()) else {
            self.steps.push(later);
            return self;
        };
        match (existing, later) {
            (StepReport::DropEmptyColumns(a), StepReport::DropEmptyColumns(b)) => {
                a.dropped.extend(b.dropped);
            }
            (StepReport::DeduplicateRows(a), StepReport::DeduplicateRows(b)) => {
                a.rows_removed = a.rows_removed.saturating_add(b.rows_removed);
            }
            (StepReport::HandleMissing(a), StepReport::HandleMissing(b)) => {
                a.placeholders_nulled = a.placeholders_nulled.saturating_add(b.placeholders_nulled);
                a.column_missing = b.column_missing;
                a.sparse_rows = b.sparse_rows;
            }
            (existing, later) => *existing = later,
        }
        self
    }

    /// Marks the run complete with the output shape and columns.
    pub fn finish(mut self, final_shape: (usize, usize), columns: Vec<String>) -> Self {
        self.final_shape = Some(final_shape);
        self.columns = columns;
        self
    }

    /// Returns the outcome of a step, if it ran.
    pub fn get(&self, step: StepName) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step() == step)
    }

    /// Returns true once every step has reported and the run finished.
    pub fn is_complete(&self) -> bool {
        self.final_shape.is_some() && self.steps.len() == StepName::ALL.len()
    }

    /// Sum of [`StepReport::changes`] over all steps.
    pub fn total_changes(&self) -> u64 {
        self.steps.iter().map(StepReport::changes).sum()
    }

    /// Narration lines for every step that ran.
    pub fn log(&self) -> Vec<String> {
        self.steps.iter().map(StepReport::summary).collect()
    }

    /// Outcome of `drop_empty_columns`, if it ran.
    pub fn dropped_columns(&self) -> Option<&DropColumnsReport> {
        match self.get(StepName::DropEmptyColumns) {
            Some(StepReport::DropEmptyColumns(r)) => Some(r),
            _ => None,
        }
    }

    /// Outcome of `deduplicate_rows`, if it ran.
    pub fn duplicates(&self) -> Option<&DeduplicateReport> {
        match self.get(StepName::DeduplicateRows) {
            Some(StepReport::DeduplicateRows(r)) => Some(r),
            _ => None,
        }
    }

    /// Outcome of `extract_dates`, if it ran.
    pub fn dates(&self) -> Option<&DateExtractionReport> {
        match self.get(StepName::ExtractDates) {
            Some(StepReport::ExtractDates(r)) => Some(r),
            _ => None,
        }
    }

    /// Outcome of `extract_ages`, if it ran.
    pub fn ages(&self) -> Option<&AgeExtractionReport> {
        match self.get(StepName::ExtractAges) {
            Some(StepReport::ExtractAges(r)) => Some(r),
            _ => None,
        }
    }

    /// Outcome of `handle_missing`, if it ran.
    pub fn missing(&self) -> Option<&MissingValueReport> {
        match self.get(StepName::HandleMissing) {
            Some(StepReport::HandleMissing(r)) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names_round_trip() {
        for step in StepName::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.as_str()));
        }
    }

    #[test]
    fn test_changes_counts() {
        let report = StepReport::ExtractDates(DateExtractionReport {
            parsed: 3,
            values_changed: 3,
            column_added: true,
            ..DateExtractionReport::default()
        });
        assert_eq!(report.changes(), 4);

        let report = StepReport::DeduplicateRows(DeduplicateReport {
            rows_before: 10,
            rows_removed: 0,
        });
        assert_eq!(report.changes(), 0);
    }

    #[test]
    fn test_report_builder_and_lookup() {
        let report = CleaningReport::new((10, 4))
            .with_step(StepReport::DeduplicateRows(DeduplicateReport {
                rows_before: 10,
                rows_removed: 2,
            }))
            .finish((8, 4), vec!["a".to_string()]);

        assert_eq!(report.duplicates().unwrap().rows_removed, 2);
        assert!(report.dates().is_none());
        assert_eq!(report.total_changes(), 2);
        // Only one step ran
        assert!(!report.is_complete());
        assert_eq!(report.log(), vec!["Removed 2 duplicate rows".to_string()]);
    }

    #[test]
    fn test_merge_step_accumulates() {
        let report = CleaningReport::new((10, 4))
            .with_step(StepReport::DeduplicateRows(DeduplicateReport {
                rows_before: 10,
                rows_removed: 2,
            }))
            .merge_step(StepReport::DeduplicateRows(DeduplicateReport {
                rows_before: 8,
                rows_removed: 1,
            }));

        assert_eq!(report.steps.len(), 1);
        assert_eq!(
            report.duplicates(),
            Some(&DeduplicateReport {
                rows_before: 10,
                rows_removed: 3
            })
        );

        let report = report.merge_step(StepReport::ExtractAges(AgeExtractionReport::default()));
        assert_eq!(report.steps.len(), 2);
    }

    #[test]
    fn test_step_report_serde_tagging() {
        let report = StepReport::ExtractAges(AgeExtractionReport {
            parsed: 5,
            ..AgeExtractionReport::default()
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["step"], "extract_ages");
        assert_eq!(json["parsed"], 5);

        let back: StepReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
