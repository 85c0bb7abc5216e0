//! SVG charts for the hypothesis results.
//!
//! Each `plot_*` function takes one analysis result, writes a single SVG
//! file into the given directory and returns the written path. Layout is
//! computed here; the markup comes from the `chart.svg` template.

mod plots;
mod svg;

// Re-export public API
pub use plots::{
    ChartFile, plot_age_distribution, plot_fatality_analysis, plot_gender_analysis,
    plot_risk_score, plot_species, plot_temporal_trends, plot_top_activities,
    plot_top_countries, render_all_charts,
};
pub use svg::{
    Bar, BarPanel, BoxPanel, BoxSummary, ChartSpec, Guide, Layout, LinePanel, Orientation, Panel,
    nice_ceiling, render_svg,
};
