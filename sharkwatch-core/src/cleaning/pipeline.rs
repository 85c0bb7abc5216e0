//! Table cleaner facade.
//!
//! The pipeline is an ordered list of step functions folded over
//! `(Table, CleaningReport)`. The table is moved through each step, so a
//! failing step never leaves a half-cleaned table behind.

use std::io::Write;

use thiserror::Error;

use crate::error::{Result, SharkwatchError};
use crate::table::Table;

use super::ages::extract_ages;
use super::categorical::normalize_categoricals;
use super::completeness::{drop_empty_columns, handle_missing};
use super::config::CleaningOptions;
use super::dates::extract_dates;
use super::models::{CleaningReport, StepName, StepReport};
use super::text::standardize_strings;
use super::uniqueness::deduplicate_rows;

/// Uniform signature of a pipeline step.
pub type StepFn = fn(Table, &CleaningOptions) -> Result<(Table, StepReport)>;

fn lift<R: Into<StepReport>>(result: Result<(Table, R)>) -> Result<(Table, StepReport)> {
    result.map(|(table, report)| (table, report.into()))
}

/// The steps in the order `run_all` applies them.
pub fn steps() -> [(StepName, StepFn); 7] {
    [
        (StepName::DropEmptyColumns, |t, o| lift(drop_empty_columns(t, o))),
        (StepName::DeduplicateRows, |t, o| lift(deduplicate_rows(t, o))),
        (StepName::StandardizeStrings, |t, o| lift(standardize_strings(t, o))),
        (StepName::NormalizeCategoricals, |t, o| lift(normalize_categoricals(t, o))),
        (StepName::ExtractDates, |t, o| lift(extract_dates(t, o))),
        (StepName::ExtractAges, |t, o| lift(extract_ages(t, o))),
        (StepName::HandleMissing, |t, o| lift(handle_missing(t, o))),
    ]
}

/// A pipeline run that stopped early.
///
/// Carries the partial report accumulated before the failure. `step` is
/// `None` when the run was rejected before any step executed.
#[derive(Debug, Error)]
#[error("{}", match .step {
    Some(step) => format!("Cleaning failed in step '{}'", step),
    None => "Cleaning rejected before the first step".to_string(),
})]
pub struct PipelineFailure {
    /// Step that failed, if any ran
    pub step: Option<StepName>,
    /// Underlying error
    #[source]
    pub error: SharkwatchError,
    /// Outcomes of the steps that completed
    pub report: CleaningReport,
}

impl PipelineFailure {
    fn before_start(error: SharkwatchError, report: CleaningReport) -> Self {
        Self {
            step: None,
            error,
            report,
        }
    }
}

/// Runs the cleaning steps over a table.
///
/// # Example
///
/// ```rust
/// use sharkwatch_core::cleaning::{CleaningOptions, TableCleaner};
/// use sharkwatch_core::table::Table;
///
/// let raw = Table::from_raw_rows(
///     &["Date", "Year", "Country", "Sex", "Fatal Y/N", "Age"],
///     &[&["27th November 2025", "2025", "US", "m ", "y", "20s"]],
/// )?;
/// let (clean, report) = TableCleaner::with_defaults().run_all(raw)?;
/// assert_eq!(clean.get(0, "Country").and_then(|v| v.as_text()), Some("USA"));
/// assert!(report.is_complete());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableCleaner {
    options: CleaningOptions,
}

impl TableCleaner {
    /// Creates a cleaner with the given options.
    pub fn new(options: CleaningOptions) -> Self {
        Self { options }
    }

    /// Creates a cleaner with default options.
    pub fn with_defaults() -> Self {
        Self::new(CleaningOptions::default())
    }

    /// Returns a reference to the cleaner options.
    pub fn options(&self) -> &CleaningOptions {
        &self.options
    }

    /// Runs every step, narrating to standard output when `verbose` is set.
    pub fn run_all(&self, table: Table) -> std::result::Result<(Table, CleaningReport), PipelineFailure> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_all_with_writer(table, &mut out)
    }

    /// Runs every step, narrating to `out` when `verbose` is set.
    ///
    /// # Errors
    /// - `InvalidOptions` or `EmptyInput` before any step runs
    /// - the first step error, typically `Schema` for an absent required column
    pub fn run_all_with_writer<W: Write>(
        &self,
        table: Table,
        out: &mut W,
    ) -> std::result::Result<(Table, CleaningReport), PipelineFailure> {
        let report = CleaningReport::new(table.shape());

        if let Err(error) = self.options.validate() {
            return Err(PipelineFailure::before_start(error, report));
        }
        if table.is_empty() {
            let (rows, columns) = table.shape();
            return Err(PipelineFailure::before_start(
                SharkwatchError::empty_input(rows, columns),
                report,
            ));
        }

        tracing::info!(
            "Starting cleaning pipeline - initial shape: {:?}",
            report.initial_shape
        );

        let (table, report) = steps().into_iter().try_fold(
            (table, report),
            |(table, report), entry| {
                let name = entry.0;
                let (table, outcome, report) = self.apply(entry, table, report)?;

                if self.options.verbose
                    && let Err(e) = writeln!(out, "[{}] {}", name, outcome.summary())
                {
                    return Err(PipelineFailure {
                        step: Some(name),
                        error: SharkwatchError::io("Failed to write narration", e),
                        report,
                    });
                }

                Ok((table, report.with_step(outcome)))
            },
        )?;
        let (table, report) = self.settle(table, report)?;

        let report = report.finish(table.shape(), table.columns().to_vec());
        tracing::info!(
            "Cleaning complete - final shape: {:?}, {} changes",
            table.shape(),
            report.total_changes()
        );
        Ok((table, report))
    }

    fn apply(
        &self,
        (name, step): (StepName, StepFn),
        table: Table,
        report: CleaningReport,
    ) -> std::result::Result<(Table, StepReport, CleaningReport), PipelineFailure> {
        tracing::debug!("Running step '{}'", name);
        match step(table, &self.options) {
            Ok((table, outcome)) => Ok((table, outcome, report)),
            Err(error) => {
                tracing::error!("Step '{}' failed: {}", name, error);
                Err(PipelineFailure {
                    step: Some(name),
                    error,
                    report,
                })
            }
        }
    }

    /// Repeats column pruning and de-duplication until neither changes the
    /// table.
    ///
    /// Normalization can make rows identical or push a column over the
    /// missing threshold; folding those follow-up changes into the first
    /// run keeps a second run a no-op.
    fn settle(
        &self,
        mut table: Table,
        mut report: CleaningReport,
    ) -> std::result::Result<(Table, CleaningReport), PipelineFailure> {
        let structural: Vec<(StepName, StepFn)> = steps()
            .into_iter()
            .filter(|(name, _)| {
                matches!(name, StepName::DropEmptyColumns | StepName::DeduplicateRows)
            })
            .collect();

        let mut settled_any = false;
        loop {
            let mut changed = false;
            for entry in &structural {
                let (next, outcome, current) = self.apply(*entry, table, report)?;
                table = next;
                report = current;
                if outcome.changes() > 0 {
                    tracing::debug!("Settling: {}", outcome.summary());
                    changed = true;
                    report = report.merge_step(outcome);
                }
            }
            if !changed {
                break;
            }
            settled_any = true;
        }

        if settled_any {
            // Re-measure missing-value statistics on the final table.
            let remeasure: StepFn = |t, o| lift(handle_missing(t, o));
            let (next, outcome, current) =
                self.apply((StepName::HandleMissing, remeasure), table, report)?;
            table = next;
            report = current.merge_step(outcome);
        }

        Ok((table, report))
    }
}

/// Runs the full pipeline with the given options.
pub fn run_all(
    table: Table,
    options: &CleaningOptions,
) -> std::result::Result<(Table, CleaningReport), PipelineFailure> {
    TableCleaner::new(options.clone()).run_all(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn raw() -> Table {
        Table::from_raw_rows(
            &["Date", "Year", "Country", "Sex", "Fatal Y/N", "Age", "Unnamed: 11"],
            &[
                &["27th November 2025", "2025", "US", "m ", "y", "20s", ""],
                &["27th November 2025", "2025", "US", "m ", "y", "20s", ""],
                &["unknown", "2024", "rsa", "F", "N", "teen", ""],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_steps_in_order() {
        let names: Vec<StepName> = steps().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, StepName::ALL.to_vec());
    }

    #[test]
    fn test_run_all_complete_report() {
        let (table, report) = TableCleaner::with_defaults()
            .run_all_with_writer(raw(), &mut Vec::new())
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.initial_shape, (3, 7));
        assert_eq!(report.final_shape, Some((2, 7)));
        assert_eq!(report.duplicates().unwrap().rows_removed, 1);
        assert_eq!(report.dropped_columns().unwrap().dropped_names(), vec!["Unnamed: 11"]);
        assert_eq!(report.dates().unwrap().failed, 1);
        assert_eq!(table.get(1, "Age"), Some(&Value::Integer(15)));
        assert_eq!(report.columns, table.columns().to_vec());
    }

    #[test]
    fn test_narration_one_line_per_step() {
        let cleaner = TableCleaner::new(CleaningOptions::new().with_verbose(true));
        let mut out = Vec::new();
        cleaner.run_all_with_writer(raw(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), StepName::ALL.len());
        assert!(lines[1].starts_with("[deduplicate_rows] Removed 1 duplicate rows"));
    }

    #[test]
    fn test_quiet_by_default() {
        let mut out = Vec::new();
        TableCleaner::with_defaults()
            .run_all_with_writer(raw(), &mut out)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_input_rejected_before_any_step() {
        let table = Table::from_raw_rows(&["Date", "Country"], &[]).unwrap();
        let failure = TableCleaner::with_defaults()
            .run_all_with_writer(table, &mut Vec::new())
            .unwrap_err();

        assert!(failure.step.is_none());
        assert!(matches!(failure.error, SharkwatchError::EmptyInput { rows: 0, columns: 2 }));
        assert!(failure.report.steps.is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = CleaningOptions {
            row_missing_threshold: 7.0,
            ..CleaningOptions::default()
        };
        let failure = run_all(raw(), &options).unwrap_err();
        assert!(matches!(failure.error, SharkwatchError::InvalidOptions { .. }));
    }

    #[test]
    fn test_schema_failure_keeps_partial_report() {
        let table = Table::from_raw_rows(&["Country", "Sex"], &[&["USA", "M"]]).unwrap();
        let failure = TableCleaner::with_defaults()
            .run_all_with_writer(table, &mut Vec::new())
            .unwrap_err();

        assert_eq!(failure.step, Some(StepName::NormalizeCategoricals));
        assert!(matches!(failure.error, SharkwatchError::Schema { ref column, .. } if column == "Fatal"));
        assert_eq!(failure.report.steps.len(), 3);
        assert!(!failure.report.is_complete());
        assert_eq!(failure.to_string(), "Cleaning failed in step 'normalize_categoricals'");
    }

    #[test]
    fn test_rows_equal_after_normalization_are_settled() {
        let table = Table::from_raw_rows(
            &["Date", "Country", "Sex", "Fatal", "Age"],
            &[
                &["1 Jan 2000", "US", "m", "y", "20"],
                &["1 Jan 2000", "USA", "M", "Y", "20"],
            ],
        )
        .unwrap();
        let cleaner = TableCleaner::with_defaults();
        let (once, report) = cleaner.run_all_with_writer(table, &mut Vec::new()).unwrap();

        assert_eq!(once.row_count(), 1);
        assert_eq!(report.duplicates().unwrap().rows_removed, 1);
        assert_eq!(report.steps.len(), StepName::ALL.len());

        let (_, again) = cleaner.run_all_with_writer(once, &mut Vec::new()).unwrap();
        assert_eq!(again.total_changes(), 0);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let cleaner = TableCleaner::with_defaults();
        let (once, _) = cleaner.run_all_with_writer(raw(), &mut Vec::new()).unwrap();
        let (twice, report) = cleaner.run_all_with_writer(once.clone(), &mut Vec::new()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(report.total_changes(), 0);
    }
}
