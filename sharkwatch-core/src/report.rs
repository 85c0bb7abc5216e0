//! Markdown report of a cleaning run and its hypothesis results.

use std::path::Path;

use askama::Template;

use crate::analysis::{
    ActivityRisk, GenderDisparity, GeographicHotspots, HypothesisResults, SummaryStatistics,
    TemporalTrends,
};
use crate::charts::ChartFile;
use crate::cleaning::CleaningReport;
use crate::error::{Result, SharkwatchError};

struct StepRow {
    name: &'static str,
    changes: u64,
    summary: String,
}

struct ChartRow {
    title: String,
    file: String,
}

#[derive(Template)]
#[template(path = "report.md", escape = "none")]
struct ReportTemplate<'a> {
    generated_at: String,
    initial_rows: usize,
    initial_columns: usize,
    final_rows: String,
    final_columns: String,
    total_changes: u64,
    steps: Vec<StepRow>,
    summary: &'a SummaryStatistics,
    year_range: String,
    avg_age: String,
    median_age: String,
    top3_countries: String,
    geographic: &'a GeographicHotspots,
    activity: &'a ActivityRisk,
    gender: &'a GenderDisparity,
    temporal: &'a TemporalTrends,
    charts: Vec<ChartRow>,
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v))
}

/// Renders the report.
///
/// Chart links use bare file names, so the report is meant to be written
/// next to the charts.
pub fn render_markdown_report(
    cleaning: &CleaningReport,
    hypotheses: &HypothesisResults,
    charts: &[ChartFile],
) -> Result<String> {
    let (initial_rows, initial_columns) = cleaning.initial_shape;
    let (final_rows, final_columns) = cleaning.final_shape.map_or_else(
        || ("n/a".to_string(), "n/a".to_string()),
        |(rows, columns)| (rows.to_string(), columns.to_string()),
    );

    let summary = &hypotheses.summary;
    let template = ReportTemplate {
        generated_at: cleaning.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        initial_rows,
        initial_columns,
        final_rows,
        final_columns,
        total_changes: cleaning.total_changes(),
        steps: cleaning
            .steps
            .iter()
            .map(|step| StepRow {
                name: step.step().as_str(),
                changes: step.changes(),
                summary: step.summary(),
            })
            .collect(),
        summary,
        year_range: summary
            .year_range
            .map_or_else(|| "n/a".to_string(), |(first, last)| format!("{} to {}", first, last)),
        avg_age: optional(summary.avg_age),
        median_age: optional(summary.median_age),
        top3_countries: hypotheses.geographic.top3_countries.join(", "),
        geographic: &hypotheses.geographic,
        activity: &hypotheses.activity,
        gender: &hypotheses.gender,
        temporal: &hypotheses.temporal,
        charts: charts
            .iter()
            .map(|chart| ChartRow {
                title: chart.title.clone(),
                file: chart
                    .path
                    .file_name()
                    .map_or_else(|| chart.path.display().to_string(), |name| {
                        name.to_string_lossy().into_owned()
                    }),
            })
            .collect(),
    };

    template
        .render()
        .map_err(|e| SharkwatchError::render("Markdown report", e))
}

/// Renders the report and writes it to `path`.
pub fn save_markdown_report(
    cleaning: &CleaningReport,
    hypotheses: &HypothesisResults,
    charts: &[ChartFile],
    path: &Path,
) -> Result<()> {
    let markdown = render_markdown_report(cleaning, hypotheses, charts)?;
    std::fs::write(path, markdown)
        .map_err(|e| SharkwatchError::io(format!("Failed to write to {}", path.display()), e))?;
    tracing::info!("Wrote report to {}", path.display());
    Ok(())
}
