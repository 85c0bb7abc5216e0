//! Hypothesis analysis over the cleaned incident table.
//!
//! Each function reads a [`Table`](crate::table::Table) produced by the
//! cleaning pipeline and returns a serializable result model. Nothing here
//! mutates the table.
//!
//! # Example
//! ```rust,no_run
//! # use sharkwatch_core::table::Table;
//! use sharkwatch_core::analysis::{analyze_geographic_hotspots, validate_all_hypotheses};
//!
//! # fn demo(clean: &Table) -> sharkwatch_core::Result<()> {
//! let hotspots = analyze_geographic_hotspots(clean, 10)?;
//! println!("top 3 hold {:.1}%", hotspots.top3_percentage);
//!
//! let all = validate_all_hypotheses(clean)?;
//! println!("{} attacks", all.summary.total_attacks);
//! # Ok(())
//! # }
//! ```

mod hypotheses;
mod models;
mod stats;

// Re-export public API
pub use hypotheses::{
    ACTIVITY_COLUMN, COUNTRY_COLUMN, FATAL_COLUMN, SEX_COLUMN, SPECIES_COLUMN,
    analyze_activity_risk, analyze_age_distribution, analyze_fatality_rates,
    analyze_gender_disparity, analyze_geographic_hotspots, analyze_species,
    analyze_temporal_trends, calculate_surf_risk_score, get_summary_statistics,
    validate_all_hypotheses,
};
pub use models::{
    ActivityRisk, AgeDistribution, CategoryCount, FatalityRates, GenderDisparity,
    GeographicHotspots, GroupRate, HypothesisResults, SummaryStatistics, SurfRisk,
    TemporalTrends, YearCount,
};
pub use stats::{mean, median, mode, percentage, quantile, round2, sample_std_dev, value_counts};
