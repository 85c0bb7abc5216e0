//! Console and file output for command results.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sharkwatch_core::{
    CleaningReport, Table,
    analysis::{
        self, AgeDistribution, CategoryCount, FatalityRates, HypothesisResults, SurfRisk,
    },
    charts::ChartFile,
};

/// Everything the `analyze` and `run` commands compute.
#[derive(Debug, Serialize)]
pub struct AnalysisBundle {
    pub hypotheses: HypothesisResults,
    pub species: Vec<CategoryCount>,
    pub age_distribution: AgeDistribution,
    pub fatality: FatalityRates,
    pub surf_risk: Vec<SurfRisk>,
}

impl AnalysisBundle {
    /// Runs every analysis with its default parameters.
    pub fn compute(table: &Table) -> Result<Self> {
        Ok(Self {
            hypotheses: analysis::validate_all_hypotheses(table)?,
            species: analysis::analyze_species(table, 10)?,
            age_distribution: analysis::analyze_age_distribution(table)?,
            fatality: analysis::analyze_fatality_rates(table, 10)?,
            surf_risk: analysis::calculate_surf_risk_score(table, 5)?,
        })
    }
}

/// Writes to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

pub fn print_cleaning_summary(report: &CleaningReport) {
    let (rows, columns) = report.initial_shape;
    println!("Cleaning completed successfully");
    println!("Input: {} rows x {} columns", rows, columns);
    if let Some((rows, columns)) = report.final_shape {
        println!("Clean: {} rows x {} columns", rows, columns);
    }
    println!("Changes: {}", report.total_changes());
}

/// Lists the steps that finished before a failure.
pub fn print_partial_report(report: &CleaningReport) {
    eprintln!("Completed steps before the failure:");
    if report.steps.is_empty() {
        eprintln!("  (none)");
    }
    for line in report.log() {
        eprintln!("  {}", line);
    }
}

pub fn print_charts(charts: &[ChartFile]) {
    println!("Charts: {}", charts.len());
    for chart in charts {
        println!("  {}: {}", chart.title, chart.path.display());
    }
}
