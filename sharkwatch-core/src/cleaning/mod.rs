//! Table cleaning pipeline.
//!
//! This module turns the raw incident export into an analysis-ready table:
//! - **Completeness**: drop empty or anonymous columns, null placeholder tokens
//! - **Uniqueness**: remove exact duplicate rows
//! - **Text**: trim, re-case and map synonyms in the free-text columns
//! - **Categoricals**: collapse `Sex` and `Fatal` onto fixed token sets
//! - **Dates and ages**: ordered regex matchers producing typed values
//!
//! Every step is a free function `fn(Table, &CleaningOptions)` returning the
//! new table with a typed report, and is a no-op on its own output.
//!
//! # Example
//! ```rust,no_run
//! use std::path::Path;
//!
//! use sharkwatch_core::cleaning::{CleaningOptions, TableCleaner};
//! use sharkwatch_core::io::{CsvFormat, load_table};
//!
//! let raw = load_table(Path::new("data/GSAF5.csv"), CsvFormat::with_delimiter(b';'))?;
//! let cleaner = TableCleaner::new(CleaningOptions::new().with_verbose(true));
//! let (clean, report) = cleaner.run_all(raw)?;
//! println!("{} changes, final shape {:?}", report.total_changes(), clean.shape());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ages;
mod categorical;
mod completeness;
mod config;
mod dates;
pub mod lookups;
mod models;
mod pipeline;
mod text;
mod uniqueness;

// Re-export public API
pub use ages::{AgePatterns, extract_ages, parse_age};
pub use categorical::{match_category, normalize_categoricals};
pub use completeness::{drop_empty_columns, handle_missing, is_anonymous_column};
pub use config::{AgeBounds, CleaningOptions};
pub use dates::{DateMatcher, DatePatterns, extract_dates, parse_date, year_of};
pub use lookups::{AGE_COLUMN, DATE_COLUMN, DATE_PARSED_COLUMN, YEAR_COLUMN};
pub use models::{
    AgeExtractionReport, CategoricalMapping, CategoricalReport, CleaningReport, ColumnMissing,
    ColumnRename, ColumnStandardization, DateExtractionReport, DeduplicateReport,
    DropColumnsReport, DropReason, DroppedColumn, MissingValueReport, StandardizeReport,
    StepName, StepReport,
};
pub use pipeline::{PipelineFailure, StepFn, TableCleaner, run_all, steps};
pub use text::{collapse_whitespace, normalize_text, standardize_strings, title_case};
pub use uniqueness::deduplicate_rows;
