//! Hypothesis aggregates over the cleaned incident table.
//!
//! All functions read the canonical column names produced by the cleaning
//! pipeline and fail with a schema error when a needed column is absent.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Datelike;

use crate::cleaning::{AGE_COLUMN, DATE_PARSED_COLUMN, YEAR_COLUMN, year_of};
use crate::error::{Result, SharkwatchError};
use crate::table::Table;

use super::models::{
    ActivityRisk, AgeDistribution, CategoryCount, FatalityRates, GenderDisparity,
    GeographicHotspots, GroupRate, HypothesisResults, SummaryStatistics, SurfRisk,
    TemporalTrends, YearCount,
};
use super::stats::{
    mean, median, mode, percentage, quantile, require_column, round2, sample_std_dev,
    value_counts,
};

pub const COUNTRY_COLUMN: &str = "Country";
pub const ACTIVITY_COLUMN: &str = "Activity";
pub const SEX_COLUMN: &str = "Sex";
pub const FATAL_COLUMN: &str = "Fatal";
pub const SPECIES_COLUMN: &str = "Species";

/// Token marking a fatal attack.
const FATAL_YES: &str = "Y";

fn is_fatal(table: &Table, row: usize, fatal_index: usize) -> bool {
    table.rows()[row][fatal_index].as_text() == Some(FATAL_YES)
}

fn text_contains(table: &Table, row: usize, index: usize, needle: &str) -> bool {
    table.rows()[row][index]
        .as_text()
        .is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Per-group (size, fatal count) over rows with a non-missing group label.
fn fatality_by_group(table: &Table, group_index: usize, fatal_index: usize) -> BTreeMap<String, (u64, u64)> {
    let mut groups: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for (row, record) in table.rows().iter().enumerate() {
        let label = &record[group_index];
        if label.is_missing() {
            continue;
        }
        let entry = groups.entry(label.to_cell()).or_insert((0, 0));
        entry.0 += 1;
        if is_fatal(table, row, fatal_index) {
            entry.1 += 1;
        }
    }
    groups
}

/// Year of each row: `Year` when known, else the year of `Date_Parsed`.
fn row_years(table: &Table) -> Vec<Option<i64>> {
    let year_index = table.column_index(YEAR_COLUMN);
    let date_index = table.column_index(DATE_PARSED_COLUMN);
    table
        .rows()
        .iter()
        .map(|row| {
            year_index
                .and_then(|i| year_of(&row[i]))
                .filter(|year| *year > 0)
                .or_else(|| {
                    date_index
                        .and_then(|i| row[i].as_date())
                        .map(|d| i64::from(d.year()))
                })
        })
        .collect()
}

fn known_ages(table: &Table, context: &str) -> Result<Vec<i64>> {
    let index = require_column(table, AGE_COLUMN, context)?;
    Ok(table
        .rows()
        .iter()
        .filter_map(|row| row[index].as_f64())
        .map(|age| age.floor() as i64)
        .collect())
}

/// Top countries and the share held by the top three.
pub fn analyze_geographic_hotspots(table: &Table, top_n: usize) -> Result<GeographicHotspots> {
    let mut counts = value_counts(table, COUNTRY_COLUMN, "analyze_geographic_hotspots")?;
    let top3: Vec<&CategoryCount> = counts.iter().take(3).collect();
    let top3_total: u64 = top3.iter().map(|c| c.count).sum();
    let top3_countries = top3.iter().map(|c| c.label.clone()).collect();
    counts.truncate(top_n);

    Ok(GeographicHotspots {
        top_countries: counts,
        top3_percentage: percentage(top3_total, table.row_count() as u64),
        top3_countries,
    })
}

/// Top activities and the surfing/swimming share.
pub fn analyze_activity_risk(table: &Table, top_n: usize) -> Result<ActivityRisk> {
    let context = "analyze_activity_risk";
    let index = require_column(table, ACTIVITY_COLUMN, context)?;
    let mut top_activities = value_counts(table, ACTIVITY_COLUMN, context)?;
    top_activities.truncate(top_n);

    let (mut surfing, mut swimming, mut either) = (0u64, 0u64, 0u64);
    for row in 0..table.row_count() {
        let surf = text_contains(table, row, index, "surfing");
        let swim = text_contains(table, row, index, "swimming");
        surfing += u64::from(surf);
        swimming += u64::from(swim);
        either += u64::from(surf || swim);
    }

    Ok(ActivityRisk {
        top_activities,
        surfing_swimming_pct: percentage(either, table.row_count() as u64),
        surfing_count: surfing,
        swimming_count: swimming,
    })
}

/// Sex counts, the male/female ratio and fatality by sex.
pub fn analyze_gender_disparity(table: &Table) -> Result<GenderDisparity> {
    let context = "analyze_gender_disparity";
    let sex_index = require_column(table, SEX_COLUMN, context)?;
    let fatal_index = require_column(table, FATAL_COLUMN, context)?;

    let gender_counts = value_counts(table, SEX_COLUMN, context)?;
    let count_of = |label: &str| {
        gender_counts
            .iter()
            .find(|c| c.label == label)
            .map_or(0, |c| c.count)
    };
    let male_count = count_of("M");
    let female_count = count_of("F");
    let ratio = if female_count > 0 {
        male_count as f64 / female_count as f64
    } else {
        0.0
    };

    let fatality_by_gender = fatality_by_group(table, sex_index, fatal_index)
        .into_iter()
        .map(|(label, (count, fatal))| GroupRate {
            label,
            count,
            rate: percentage(fatal, count),
        })
        .collect();

    Ok(GenderDisparity {
        gender_counts,
        male_count,
        female_count,
        ratio,
        fatality_by_gender,
    })
}

/// Attacks per decade and per recent year within `[start_year, end_year]`.
pub fn analyze_temporal_trends(table: &Table, start_year: i64, end_year: i64) -> Result<TemporalTrends> {
    if !table.has_column(YEAR_COLUMN) && !table.has_column(DATE_PARSED_COLUMN) {
        return Err(SharkwatchError::schema("analyze_temporal_trends", YEAR_COLUMN));
    }

    let years: Vec<i64> = row_years(table)
        .into_iter()
        .flatten()
        .filter(|year| (start_year..=end_year).contains(year))
        .collect();

    let mut by_decade: BTreeMap<i64, u64> = BTreeMap::new();
    let mut by_year: BTreeMap<i64, u64> = BTreeMap::new();
    let recent_cutoff = end_year - 50;
    for year in &years {
        *by_decade.entry(year.div_euclid(10) * 10).or_insert(0) += 1;
        if *year >= recent_cutoff {
            *by_year.entry(*year).or_insert(0) += 1;
        }
    }

    let attacks_by_decade: Vec<YearCount> = by_decade
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect();
    let attacks_by_year = by_year
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect();

    let (early_avg, recent_avg) = if attacks_by_decade.len() >= 5 {
        let counts: Vec<f64> = attacks_by_decade.iter().map(|d| d.count as f64).collect();
        (
            mean(&counts[..5]).unwrap_or(0.0),
            mean(&counts[counts.len() - 5..]).unwrap_or(0.0),
        )
    } else {
        (0.0, 0.0)
    };
    let increase_percentage = if early_avg > 0.0 {
        (recent_avg - early_avg) / early_avg * 100.0
    } else {
        0.0
    };

    Ok(TemporalTrends {
        start_year,
        end_year,
        attacks_by_decade,
        attacks_by_year,
        early_avg,
        recent_avg,
        increase_percentage,
    })
}

/// Most frequently named species.
pub fn analyze_species(table: &Table, top_n: usize) -> Result<Vec<CategoryCount>> {
    // Tables that skipped cleaning still carry the raw header.
    let column = if table.has_column(SPECIES_COLUMN) {
        SPECIES_COLUMN
    } else {
        "Species "
    };
    let mut counts = value_counts(table, column, "analyze_species")
        .map_err(|_| SharkwatchError::schema("analyze_species", SPECIES_COLUMN))?;
    counts.truncate(top_n);
    Ok(counts)
}

/// Descriptive statistics of known ages.
pub fn analyze_age_distribution(table: &Table) -> Result<AgeDistribution> {
    let ages = known_ages(table, "analyze_age_distribution")?;
    let values: Vec<f64> = ages.iter().map(|a| *a as f64).collect();
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);

    Ok(AgeDistribution {
        count: ages.len() as u64,
        mean: mean(&values),
        median: quantile(&sorted, 0.5),
        mode: mode(&ages),
        min: ages.iter().min().copied(),
        max: ages.iter().max().copied(),
        std_dev: sample_std_dev(&values),
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
        ages,
    })
}

/// Overall fatality and the rate for the `top_n_countries` most affected.
pub fn analyze_fatality_rates(table: &Table, top_n_countries: usize) -> Result<FatalityRates> {
    let context = "analyze_fatality_rates";
    let country_index = require_column(table, COUNTRY_COLUMN, context)?;
    let fatal_index = require_column(table, FATAL_COLUMN, context)?;

    let fatal_counts = value_counts(table, FATAL_COLUMN, context)?;
    let known: u64 = fatal_counts.iter().map(|c| c.count).sum();
    let fatal = fatal_counts
        .iter()
        .find(|c| c.label == FATAL_YES)
        .map_or(0, |c| c.count);

    let top: HashSet<String> = value_counts(table, COUNTRY_COLUMN, context)?
        .into_iter()
        .take(top_n_countries)
        .map(|c| c.label)
        .collect();
    let mut fatality_by_country: Vec<GroupRate> = fatality_by_group(table, country_index, fatal_index)
        .into_iter()
        .filter(|(label, _)| top.contains(label))
        .map(|(label, (count, fatal))| GroupRate {
            label,
            count,
            rate: percentage(fatal, count),
        })
        .collect();
    fatality_by_country.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.label.cmp(&b.label)));

    Ok(FatalityRates {
        fatal_counts,
        overall_fatality_rate: percentage(fatal, known),
        fatality_by_country,
    })
}

/// Surfing risk per country, safest first.
///
/// Only countries with at least `min_attacks` surfing incidents are scored.
pub fn calculate_surf_risk_score(table: &Table, min_attacks: u64) -> Result<Vec<SurfRisk>> {
    let context = "calculate_surf_risk_score";
    let activity_index = require_column(table, ACTIVITY_COLUMN, context)?;
    let country_index = require_column(table, COUNTRY_COLUMN, context)?;
    let fatal_index = require_column(table, FATAL_COLUMN, context)?;

    let mut by_country: HashMap<String, (u64, u64)> = HashMap::new();
    for (row, record) in table.rows().iter().enumerate() {
        let country = &record[country_index];
        if country.is_missing() || !text_contains(table, row, activity_index, "surf") {
            continue;
        }
        let entry = by_country.entry(country.to_cell()).or_insert((0, 0));
        entry.0 += 1;
        if is_fatal(table, row, fatal_index) {
            entry.1 += 1;
        }
    }

    let relevant: Vec<(String, u64, f64)> = by_country
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_attacks)
        .map(|(country, (count, fatal))| (country, count, round2(percentage(fatal, count))))
        .collect();
    let max_attacks = relevant.iter().map(|(_, count, _)| *count).max().unwrap_or(0);

    let mut scores: Vec<SurfRisk> = relevant
        .into_iter()
        .map(|(country, attack_count, fatality_rate)| SurfRisk {
            country,
            attack_count,
            fatality_rate,
            risk_score: round2(percentage(attack_count, max_attacks) / 2.0 + fatality_rate),
        })
        .collect();
    scores.sort_by(|a, b| {
        a.risk_score
            .total_cmp(&b.risk_score)
            .then_with(|| a.country.cmp(&b.country))
    });
    Ok(scores)
}

/// Whole-dataset summary.
pub fn get_summary_statistics(table: &Table) -> Result<SummaryStatistics> {
    let context = "get_summary_statistics";
    let fatal_index = require_column(table, FATAL_COLUMN, context)?;
    let countries = value_counts(table, COUNTRY_COLUMN, context)?;
    let activities = value_counts(table, ACTIVITY_COLUMN, context)?;

    let years: Vec<i64> = row_years(table).into_iter().flatten().collect();
    let year_range = years
        .iter()
        .min()
        .copied()
        .zip(years.iter().max().copied());

    let ages: Vec<f64> = known_ages(table, context)?.into_iter().map(|a| a as f64).collect();
    let fatal = (0..table.row_count())
        .filter(|row| is_fatal(table, *row, fatal_index))
        .count() as u64;

    Ok(SummaryStatistics {
        total_attacks: table.row_count() as u64,
        year_range,
        countries_count: countries.len() as u64,
        activities_count: activities.len() as u64,
        avg_age: mean(&ages),
        median_age: median(&ages),
        overall_fatality_rate: percentage(fatal, table.row_count() as u64),
    })
}

/// Runs the four hypothesis analyses with their default parameters plus
/// the summary.
pub fn validate_all_hypotheses(table: &Table) -> Result<HypothesisResults> {
    Ok(HypothesisResults {
        geographic: analyze_geographic_hotspots(table, 10)?,
        activity: analyze_activity_risk(table, 10)?,
        gender: analyze_gender_disparity(table)?,
        temporal: analyze_temporal_trends(table, 1900, 2025)?,
        summary: get_summary_statistics(table)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incidents() -> Table {
        Table::from_raw_rows(
            &["Year", "Country", "Activity", "Sex", "Fatal", "Age", "Species"],
            &[
                &["1950", "USA", "Surfing", "M", "N", "20", "White Shark"],
                &["1961", "USA", "Surfing", "M", "Y", "30", "Tiger Shark"],
                &["1975", "USA", "Swimming", "F", "N", "25", "White Shark"],
                &["1988", "AUSTRALIA", "Surfing", "M", "Y", "40", ""],
                &["1999", "AUSTRALIA", "Fishing", "M", "N", "", "Bull Shark"],
                &["2005", "SOUTH AFRICA", "Body Surfing", "F", "N", "30", "White Shark"],
                &["2015", "BRAZIL", "Swimming", "M", "Y", "", ""],
                &["2020", "", "Diving", "", "", "50", ""],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_geographic_hotspots() {
        let result = analyze_geographic_hotspots(&incidents(), 2).unwrap();
        assert_eq!(result.top_countries.len(), 2);
        assert_eq!(result.top_countries[0], CategoryCount::new("USA", 3));
        assert_eq!(result.top3_countries, vec!["USA", "AUSTRALIA", "BRAZIL"]);
        // (3 + 2 + 1) of 8 rows
        assert!((result.top3_percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_activity_risk() {
        let result = analyze_activity_risk(&incidents(), 10).unwrap();
        assert_eq!(result.surfing_count, 4);
        assert_eq!(result.swimming_count, 2);
        assert!((result.surfing_swimming_pct - 75.0).abs() < 1e-9);
        assert_eq!(result.top_activities[0], CategoryCount::new("Surfing", 3));
    }

    #[test]
    fn test_gender_disparity() {
        let result = analyze_gender_disparity(&incidents()).unwrap();
        assert_eq!(result.male_count, 5);
        assert_eq!(result.female_count, 2);
        assert!((result.ratio - 2.5).abs() < 1e-9);
        let male = result.fatality_by_gender.iter().find(|g| g.label == "M").unwrap();
        assert!((male.rate - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_trends() {
        let result = analyze_temporal_trends(&incidents(), 1900, 2025).unwrap();
        let decades: Vec<i64> = result.attacks_by_decade.iter().map(|d| d.year).collect();
        assert_eq!(decades, vec![1950, 1960, 1970, 1980, 1990, 2000, 2010, 2020]);
        // Years from 1975 on
        assert_eq!(result.attacks_by_year.len(), 6);
        assert!((result.early_avg - 1.0).abs() < 1e-9);
        assert!((result.increase_percentage).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_trends_falls_back_to_parsed_dates() {
        let mut table = Table::from_raw_rows(&["Date"], &[&["x"], &["y"]]).unwrap();
        table = crate::cleaning::extract_dates(table, &Default::default()).unwrap().0;
        let result = analyze_temporal_trends(&table, 1900, 2025).unwrap();
        assert!(result.attacks_by_decade.is_empty());

        let table = Table::from_raw_rows(&["Country"], &[&["USA"]]).unwrap();
        assert!(analyze_temporal_trends(&table, 1900, 2025).is_err());
    }

    #[test]
    fn test_species_and_ages() {
        let species = analyze_species(&incidents(), 1).unwrap();
        assert_eq!(species, vec![CategoryCount::new("White Shark", 3)]);

        let ages = analyze_age_distribution(&incidents()).unwrap();
        assert_eq!(ages.count, 6);
        assert_eq!(ages.mode, Some(30));
        assert_eq!(ages.min, Some(20));
        assert_eq!(ages.max, Some(50));
        assert_eq!(ages.median, Some(30.0));
    }

    #[test]
    fn test_fatality_rates() {
        let result = analyze_fatality_rates(&incidents(), 2).unwrap();
        // 3 fatal of 7 known outcomes
        assert!((result.overall_fatality_rate - 300.0 / 7.0).abs() < 1e-9);
        let labels: Vec<&str> = result.fatality_by_country.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["AUSTRALIA", "USA"]);
    }

    #[test]
    fn test_surf_risk_score() {
        let scores = calculate_surf_risk_score(&incidents(), 1).unwrap();
        let usa = scores.iter().find(|s| s.country == "USA").unwrap();
        assert_eq!(usa.attack_count, 2);
        assert_eq!(usa.fatality_rate, 50.0);
        assert_eq!(usa.risk_score, 100.0);
        // Safest first
        assert_eq!(scores[0].country, "SOUTH AFRICA");
        assert_eq!(scores[0].risk_score, 25.0);

        assert!(calculate_surf_risk_score(&incidents(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_summary_and_all_hypotheses() {
        let summary = get_summary_statistics(&incidents()).unwrap();
        assert_eq!(summary.total_attacks, 8);
        assert_eq!(summary.year_range, Some((1950, 2020)));
        assert_eq!(summary.countries_count, 4);
        assert!((summary.overall_fatality_rate - 37.5).abs() < 1e-9);

        let all = validate_all_hypotheses(&incidents()).unwrap();
        assert_eq!(all.summary, summary);
        assert_eq!(all.geographic.top3_countries.len(), 3);
    }

    #[test]
    fn test_missing_columns_are_schema_errors() {
        let table = Table::from_raw_rows(&["Country"], &[&["USA"]]).unwrap();
        assert!(matches!(
            analyze_gender_disparity(&table),
            Err(SharkwatchError::Schema { .. })
        ));
        assert!(analyze_species(&table, 5).is_err());
        assert!(calculate_surf_risk_score(&table, 1).is_err());
    }
}
