//! Analysis result models.
//!
//! Results are plain serializable data; charts and the Markdown report
//! render from these types only.

use serde::{Deserialize, Serialize};

/// Occurrences of one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Category label
    pub label: String,
    /// Number of rows carrying the label
    pub count: u64,
}

impl CategoryCount {
    /// Creates a new category count.
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Fatality rate within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    /// Group label (a country or a sex)
    pub label: String,
    /// Rows in the group
    pub count: u64,
    /// Percentage of the group's rows marked fatal (0-100)
    pub rate: f64,
}

/// Attacks in one year or decade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    /// Year, or first year of the decade
    pub year: i64,
    /// Attacks recorded
    pub count: u64,
}

/// Hypothesis 1: a few countries account for most attacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicHotspots {
    /// Most frequent countries, descending
    pub top_countries: Vec<CategoryCount>,
    /// Share of all rows held by the top three countries (0-100)
    pub top3_percentage: f64,
    /// The top three country names
    pub top3_countries: Vec<String>,
}

/// Hypothesis 2: surfing and swimming dominate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRisk {
    /// Most frequent activities, descending
    pub top_activities: Vec<CategoryCount>,
    /// Share of rows whose activity mentions surfing or swimming (0-100)
    pub surfing_swimming_pct: f64,
    /// Rows whose activity mentions surfing
    pub surfing_count: u64,
    /// Rows whose activity mentions swimming
    pub swimming_count: u64,
}

/// Hypothesis 3: men are attacked far more often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderDisparity {
    /// Count per sex token, descending
    pub gender_counts: Vec<CategoryCount>,
    /// Rows with `Sex = M`
    pub male_count: u64,
    /// Rows with `Sex = F`
    pub female_count: u64,
    /// male / female, or 0 when there are no female rows
    pub ratio: f64,
    /// Fatality rate per sex
    pub fatality_by_gender: Vec<GroupRate>,
}

/// Hypothesis 4: attacks increase over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalTrends {
    /// First year considered
    pub start_year: i64,
    /// Last year considered
    pub end_year: i64,
    /// Attacks per decade, ascending
    pub attacks_by_decade: Vec<YearCount>,
    /// Attacks per year over the final fifty years, ascending
    pub attacks_by_year: Vec<YearCount>,
    /// Mean attacks per decade over the first five decades
    pub early_avg: f64,
    /// Mean attacks per decade over the last five decades
    pub recent_avg: f64,
    /// Relative change from early to recent (percent)
    pub increase_percentage: f64,
}

/// Descriptive statistics of victim ages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeDistribution {
    /// Rows with a known age
    pub count: u64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Most frequent age (smallest on ties)
    pub mode: Option<i64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Sample standard deviation
    pub std_dev: Option<f64>,
    /// 25th percentile
    pub q1: Option<f64>,
    /// 75th percentile
    pub q3: Option<f64>,
    /// The known ages, in row order
    pub ages: Vec<i64>,
}

/// Fatality overall and for the most affected countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalityRates {
    /// Count per fatal token, descending
    pub fatal_counts: Vec<CategoryCount>,
    /// Fatal share of rows with a known outcome (0-100)
    pub overall_fatality_rate: f64,
    /// Fatality rate for the top countries, descending by rate
    pub fatality_by_country: Vec<GroupRate>,
}

/// Surfing risk for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfRisk {
    /// Country name
    pub country: String,
    /// Surfing attacks recorded
    pub attack_count: u64,
    /// Fatal share of those attacks (0-100, two decimals)
    pub fatality_rate: f64,
    /// `attack_count / max * 50 + fatality_rate` (lower is safer)
    pub risk_score: f64,
}

/// Whole-dataset summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Rows in the table
    pub total_attacks: u64,
    /// (earliest, latest) known year
    pub year_range: Option<(i64, i64)>,
    /// Distinct countries
    pub countries_count: u64,
    /// Distinct activities
    pub activities_count: u64,
    pub avg_age: Option<f64>,
    pub median_age: Option<f64>,
    /// Fatal share of all rows (0-100)
    pub overall_fatality_rate: f64,
}

/// The four hypotheses and the summary, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisResults {
    pub geographic: GeographicHotspots,
    pub activity: ActivityRisk,
    pub gender: GenderDisparity,
    pub temporal: TemporalTrends,
    pub summary: SummaryStatistics,
}
