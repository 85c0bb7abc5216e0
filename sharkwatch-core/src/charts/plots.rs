//! One figure per analysis result, written as SVG files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::{
    self, ActivityRisk, AgeDistribution, CategoryCount, FatalityRates, GenderDisparity,
    GeographicHotspots, SurfRisk, TemporalTrends,
};
use crate::error::{Result, SharkwatchError};
use crate::table::Table;

use super::svg::{
    Bar, BarPanel, BoxPanel, BoxSummary, ChartSpec, Layout, LinePanel, Orientation, Panel,
    render_svg,
};

const STEEL_BLUE: &str = "#4682b4";
const CORAL: &str = "#ff7f50";
const TEAL: &str = "#008080";
const SLATE: &str = "#2f4f4f";
const SKY_BLUE: &str = "#87ceeb";
const CRIMSON: &str = "#dc143c";
const BLUE: &str = "#3498db";
const RED: &str = "#e74c3c";
const GREEN: &str = "#2ecc71";
const ORANGE: &str = "#f39c12";

/// Risk scores below this are drawn as low risk.
const LOW_RISK: f64 = 30.0;
/// Risk scores below this (and at least [`LOW_RISK`]) are medium risk.
const MEDIUM_RISK: f64 = 50.0;

/// Age histogram bin width in years.
const AGE_BIN: i64 = 5;

/// A chart written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFile {
    /// Figure title
    pub title: String,
    /// Where the SVG was written
    pub path: PathBuf,
}

fn write_chart(chart: &ChartSpec, out_dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir).map_err(|e| {
        SharkwatchError::io(format!("Failed to create {}", out_dir.display()), e)
    })?;
    let svg = render_svg(chart)?;
    let path = out_dir.join(file_name);
    std::fs::write(&path, svg)
        .map_err(|e| SharkwatchError::io(format!("Failed to write to {}", path.display()), e))?;
    tracing::info!("Saved chart '{}' to {}", chart.title, path.display());
    Ok(path)
}

fn count_bars(counts: &[CategoryCount], color: &str) -> Vec<Bar> {
    counts
        .iter()
        .map(|c| Bar::new(c.label.clone(), c.count as f64, color))
        .collect()
}

/// Shares of each label in percent, alternating through `colors`.
fn share_bars(counts: &[CategoryCount], colors: &[&str], rename: impl Fn(&str) -> String) -> Vec<Bar> {
    let total: u64 = counts.iter().map(|c| c.count).sum();
    counts
        .iter()
        .zip(colors.iter().cycle())
        .map(|(c, color)| {
            Bar::new(
                rename(&c.label),
                analysis::round2(analysis::percentage(c.count, total)),
                color,
            )
        })
        .collect()
}

/// Bar chart of the most attacked countries.
pub fn plot_top_countries(hotspots: &GeographicHotspots, out_dir: &Path) -> Result<PathBuf> {
    let chart = ChartSpec::new("Top Countries by Shark Attacks")
        .with_subtitle(format!("Top 3 = {:.1}%", hotspots.top3_percentage))
        .with_panel(Panel::Bars(
            BarPanel::new("Attacks per country", Orientation::Vertical)
                .with_axes("Country", "Number of Attacks")
                .with_bars(count_bars(&hotspots.top_countries, STEEL_BLUE)),
        ));
    write_chart(&chart, out_dir, "h1_geographic.svg")
}

/// Horizontal bar chart of the most common activities.
pub fn plot_top_activities(activity: &ActivityRisk, out_dir: &Path) -> Result<PathBuf> {
    let chart = ChartSpec::new("Top Activities During Shark Attacks")
        .with_subtitle(format!(
            "Surfing + Swimming = {:.1}%",
            activity.surfing_swimming_pct
        ))
        .with_panel(Panel::Bars(
            BarPanel::new("Attacks per activity", Orientation::Horizontal)
                .with_axes("Number of Attacks", "Activity")
                .with_bars(count_bars(&activity.top_activities, CORAL)),
        ));
    write_chart(&chart, out_dir, "h2_activities.svg")
}

/// Share of attacks by sex next to the fatality rate by sex.
pub fn plot_gender_analysis(gender: &GenderDisparity, out_dir: &Path) -> Result<PathBuf> {
    let colors = [BLUE, RED];
    let fatality = gender
        .fatality_by_gender
        .iter()
        .zip(colors.iter().cycle())
        .map(|(g, color)| Bar::new(g.label.clone(), analysis::round2(g.rate), color))
        .collect();

    let chart = ChartSpec::new("Shark Attacks by Gender")
        .with_subtitle(format!("Male to female ratio {:.1}:1", gender.ratio))
        .with_panel(Panel::Bars(
            BarPanel::new("Share of attacks", Orientation::Vertical)
                .with_axes("Sex", "Percent of Attacks")
                .with_bars(share_bars(&gender.gender_counts, &colors, |label: &str| label.to_string()))
                .with_suffix("%"),
        ))
        .with_panel(Panel::Bars(
            BarPanel::new("Fatality rate", Orientation::Vertical)
                .with_axes("Sex", "Fatality Rate (%)")
                .with_bars(fatality)
                .with_suffix("%"),
        ));
    write_chart(&chart, out_dir, "h3_gender.svg")
}

/// Attacks by decade above attacks per year over the final fifty years.
pub fn plot_temporal_trends(temporal: &TemporalTrends, out_dir: &Path) -> Result<PathBuf> {
    let decades = temporal
        .attacks_by_decade
        .iter()
        .map(|d| Bar::new(format!("{}s", d.year), d.count as f64, TEAL))
        .collect();
    let points = temporal
        .attacks_by_year
        .iter()
        .map(|y| (y.year, y.count as f64))
        .collect();

    let chart = ChartSpec::new("Shark Attacks Over Time")
        .with_subtitle(format!(
            "{} to {}, change from early to recent decades {:+.1}%",
            temporal.start_year, temporal.end_year, temporal.increase_percentage
        ))
        .with_layout(Layout::Column)
        .with_panel(Panel::Bars(
            BarPanel::new("Attacks by decade", Orientation::Vertical)
                .with_axes("Decade", "Number of Attacks")
                .with_bars(decades),
        ))
        .with_panel(Panel::Line(LinePanel {
            title: "Attacks per year, last 50 years".to_string(),
            x_label: "Year".to_string(),
            y_label: "Number of Attacks".to_string(),
            points,
            color: TEAL.to_string(),
        }));
    write_chart(&chart, out_dir, "h4_temporal.svg")
}

/// Horizontal bar chart of the most frequently named species.
pub fn plot_species(species: &[CategoryCount], out_dir: &Path) -> Result<PathBuf> {
    let chart = ChartSpec::new("Shark Species Involved in Attacks").with_panel(Panel::Bars(
        BarPanel::new("Attacks per species", Orientation::Horizontal)
            .with_axes("Number of Attacks", "Species")
            .with_bars(count_bars(species, SLATE)),
    ));
    write_chart(&chart, out_dir, "species.svg")
}

/// Counts of ages per bin of [`AGE_BIN`] years, ascending.
fn age_histogram(ages: &[i64]) -> Vec<Bar> {
    let mut bins = std::collections::BTreeMap::new();
    for age in ages {
        *bins.entry(age.div_euclid(AGE_BIN) * AGE_BIN).or_insert(0u64) += 1;
    }
    bins.into_iter()
        .map(|(start, count)| Bar::new(format!("{}-{}", start, start + AGE_BIN - 1), count as f64, SKY_BLUE))
        .collect()
}

/// Age histogram next to a box plot of the same ages.
pub fn plot_age_distribution(ages: &AgeDistribution, out_dir: &Path) -> Result<PathBuf> {
    let mut chart = ChartSpec::new("Age Distribution of Shark Attack Victims")
        .with_subtitle(format!("{} victims with a known age", ages.count))
        .with_panel(Panel::Bars(
            BarPanel::new("Histogram", Orientation::Vertical)
                .with_axes("Age", "Frequency")
                .with_bars(age_histogram(&ages.ages)),
        ));

    if let (Some(min), Some(q1), Some(median), Some(q3), Some(max)) =
        (ages.min, ages.q1, ages.median, ages.q3, ages.max)
    {
        chart = chart.with_panel(Panel::Box(BoxPanel {
            title: "Box plot".to_string(),
            x_label: "Age".to_string(),
            summary: BoxSummary {
                min: min as f64,
                q1,
                median,
                q3,
                max: max as f64,
            },
            color: SKY_BLUE.to_string(),
        }));
    }
    write_chart(&chart, out_dir, "age_distribution.svg")
}

/// Outcome shares next to the fatality rate of the top countries.
pub fn plot_fatality_analysis(fatality: &FatalityRates, out_dir: &Path) -> Result<PathBuf> {
    let outcome = |label: &str| match label {
        "Y" => "Fatal".to_string(),
        "N" => "Non-fatal".to_string(),
        other => other.to_string(),
    };
    let by_country = fatality
        .fatality_by_country
        .iter()
        .map(|g| Bar::new(g.label.clone(), analysis::round2(g.rate), CRIMSON))
        .collect();

    let chart = ChartSpec::new("Fatality Analysis")
        .with_subtitle(format!(
            "Overall fatality rate {:.1}%",
            fatality.overall_fatality_rate
        ))
        .with_panel(Panel::Bars(
            BarPanel::new("Attack outcomes", Orientation::Vertical)
                .with_axes("Outcome", "Percent of Attacks")
                .with_bars(share_bars(&fatality.fatal_counts, &[GREEN, RED], outcome))
                .with_suffix("%"),
        ))
        .with_panel(Panel::Bars(
            BarPanel::new("Fatality rate by country", Orientation::Vertical)
                .with_axes("Country", "Fatality Rate (%)")
                .with_bars(by_country)
                .with_suffix("%"),
        ));
    write_chart(&chart, out_dir, "fatality.svg")
}

fn risk_color(score: f64) -> &'static str {
    if score < LOW_RISK {
        GREEN
    } else if score < MEDIUM_RISK {
        ORANGE
    } else {
        RED
    }
}

/// The `n_safest` and `n_riskiest` surfing countries.
///
/// `scores` must be sorted safest first, as returned by
/// [`calculate_surf_risk_score`](crate::analysis::calculate_surf_risk_score).
/// A country is shown once even when both ends overlap.
pub fn plot_risk_score(
    scores: &[SurfRisk],
    n_safest: usize,
    n_riskiest: usize,
    out_dir: &Path,
) -> Result<PathBuf> {
    let shown: Vec<&SurfRisk> = if scores.len() <= n_safest + n_riskiest {
        scores.iter().collect()
    } else {
        scores
            .iter()
            .take(n_safest)
            .chain(scores.iter().skip(scores.len() - n_riskiest))
            .collect()
    };
    let bars = shown
        .iter()
        .map(|s| Bar::new(s.country.clone(), s.risk_score, risk_color(s.risk_score)))
        .collect();

    let chart = ChartSpec::new("Surf Location Risk Score by Country")
        .with_subtitle("Lower = safer")
        .with_panel(Panel::Bars(
            BarPanel::new("Risk score", Orientation::Horizontal)
                .with_axes("Risk Score", "Country")
                .with_bars(bars)
                .with_guide(LOW_RISK, GREEN, "Low risk (<30)")
                .with_guide(MEDIUM_RISK, ORANGE, "Medium risk (30-50)"),
        ));
    write_chart(&chart, out_dir, "risk_score.svg")
}

/// Runs every analysis behind the charts and writes all eight figures.
pub fn render_all_charts(table: &Table, out_dir: &Path) -> Result<Vec<ChartFile>> {
    let results = analysis::validate_all_hypotheses(table)?;
    let species = analysis::analyze_species(table, 10)?;
    let ages = analysis::analyze_age_distribution(table)?;
    let fatality = analysis::analyze_fatality_rates(table, 10)?;
    let risk = analysis::calculate_surf_risk_score(table, 5)?;

    let charts = [
        ("Top countries", plot_top_countries(&results.geographic, out_dir)?),
        ("Top activities", plot_top_activities(&results.activity, out_dir)?),
        ("Gender", plot_gender_analysis(&results.gender, out_dir)?),
        ("Temporal trends", plot_temporal_trends(&results.temporal, out_dir)?),
        ("Species", plot_species(&species, out_dir)?),
        ("Age distribution", plot_age_distribution(&ages, out_dir)?),
        ("Fatality", plot_fatality_analysis(&fatality, out_dir)?),
        ("Surf risk", plot_risk_score(&risk, 7, 8, out_dir)?),
    ];
    Ok(charts
        .into_iter()
        .map(|(title, path)| ChartFile {
            title: title.to_string(),
            path,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(country: &str, score: f64) -> SurfRisk {
        SurfRisk {
            country: country.to_string(),
            attack_count: 10,
            fatality_rate: 0.0,
            risk_score: score,
        }
    }

    #[test]
    fn test_plot_top_countries_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let hotspots = GeographicHotspots {
            top_countries: vec![CategoryCount::new("USA", 3), CategoryCount::new("BRAZIL", 1)],
            top3_percentage: 80.0,
            top3_countries: vec!["USA".to_string(), "BRAZIL".to_string()],
        };
        let path = plot_top_countries(&hotspots, &dir.path().join("reports")).unwrap();
        assert_eq!(path.file_name().unwrap(), "h1_geographic.svg");
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Top 3 = 80.0%"));
        assert!(svg.contains(">BRAZIL<"));
    }

    #[test]
    fn test_age_histogram_bins() {
        let bars = age_histogram(&[3, 4, 5, 21, 24]);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["0-4", "5-9", "20-24"]);
        assert_eq!(bars[0].value, 2.0);
    }

    #[test]
    fn test_risk_colors() {
        assert_eq!(risk_color(10.0), GREEN);
        assert_eq!(risk_color(30.0), ORANGE);
        assert_eq!(risk_color(75.0), RED);
    }

    #[test]
    fn test_plot_risk_score_keeps_both_ends() {
        let dir = tempfile::tempdir().unwrap();
        let scores: Vec<SurfRisk> = (0..20).map(|i| risk(&format!("C{i:02}"), f64::from(i) * 5.0)).collect();
        let path = plot_risk_score(&scores, 2, 3, dir.path()).unwrap();
        let svg = std::fs::read_to_string(path).unwrap();
        for shown in ["C00", "C01", "C17", "C18", "C19"] {
            assert!(svg.contains(&format!(">{shown}<")), "missing {shown}");
        }
        assert!(!svg.contains(">C10<"));
    }

    #[test]
    fn test_render_all_charts() {
        let table = Table::from_raw_rows(
            &["Year", "Country", "Activity", "Sex", "Fatal", "Age", "Species"],
            &[
                &["1990", "USA", "Surfing", "M", "N", "20", "White Shark"],
                &["2001", "USA", "Swimming", "F", "Y", "34", "Tiger Shark"],
                &["2010", "BRAZIL", "Surfing", "M", "N", "", ""],
            ],
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let charts = render_all_charts(&table, dir.path()).unwrap();
        assert_eq!(charts.len(), 8);
        for chart in &charts {
            assert!(chart.path.exists(), "{} was not written", chart.path.display());
        }
    }
}
