//! Core data structures and pipeline for Sharkwatch.
//!
//! This crate turns the raw global shark-attack incident export into an
//! analysis-ready table, then computes the hypothesis aggregates, charts
//! and report on top of it. The `sharkwatch` binary is a thin shell over
//! these modules.
//!
//! # Guarantees
//! - Deterministic cleaning: every mapping comes from static lookup tables
//! - Idempotent cleaning: running the pipeline on its own output changes nothing
//! - Offline operation: input and output are local files only
//!
//! # Architecture
//! - [`table`] holds the in-memory table and its typed cell values
//! - [`cleaning`] applies the ordered cleaning steps and builds the report
//! - [`analysis`] reads the clean table and never mutates it
//! - [`charts`] and [`report`] render analysis results to SVG and Markdown

pub mod analysis;
pub mod charts;
pub mod cleaning;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod table;

// Re-export commonly used types
pub use cleaning::{CleaningOptions, CleaningReport, PipelineFailure, StepName, TableCleaner};
pub use error::{Result, SharkwatchError, ValueError};
pub use io::{CsvFormat, load_table, save_table};
pub use table::{Table, Value};
