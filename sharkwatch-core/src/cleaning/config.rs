//! Cleaning pipeline configuration.
//!
//! Options are passed explicitly into every step; there is no global
//! configuration. Builder methods clamp out-of-range values with a warning,
//! while [`CleaningOptions::validate`] rejects values set directly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SharkwatchError};

/// Inclusive age range accepted by `extract_ages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBounds {
    /// Smallest accepted age
    pub min: i64,
    /// Largest accepted age
    pub max: i64,
}

impl Default for AgeBounds {
    fn default() -> Self {
        Self { min: 0, max: 120 }
    }
}

impl AgeBounds {
    /// Creates new bounds; callers should run [`CleaningOptions::validate`].
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Returns true if `age` lies within the bounds, inclusive.
    pub fn contains(&self, age: i64) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

/// Options recognised by the cleaning pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    /// Emit one narration line per step
    pub verbose: bool,
    /// Columns whose missing fraction exceeds this are dropped (0.0-1.0)
    pub missing_threshold: f64,
    /// Rows whose missing fraction exceeds this are flagged in the report (0.0-1.0)
    pub row_missing_threshold: f64,
    /// Inclusive bounds for parsed ages
    pub age_bounds: AgeBounds,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            missing_threshold: 0.95,
            row_missing_threshold: 0.70,
            age_bounds: AgeBounds::default(),
        }
    }
}

impl CleaningOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable/disable step narration.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder method to set the column missing-fraction threshold.
    pub fn with_missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = clamp_fraction("missing_threshold", threshold);
        self
    }

    /// Builder method to set the row missing-fraction threshold.
    pub fn with_row_missing_threshold(mut self, threshold: f64) -> Self {
        self.row_missing_threshold = clamp_fraction("row_missing_threshold", threshold);
        self
    }

    /// Builder method to set the accepted age range.
    pub fn with_age_bounds(mut self, min: i64, max: i64) -> Self {
        if min > max {
            tracing::warn!("age_bounds ({}, {}) reversed to ({}, {})", min, max, max, min);
            self.age_bounds = AgeBounds::new(max, min);
        } else {
            self.age_bounds = AgeBounds::new(min, max);
        }
        self
    }

    /// Loads options from a JSON document; absent fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| SharkwatchError::serialization("Parsing cleaning options", e))?;
        options.validate()?;
        Ok(options)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.missing_threshold) {
            return Err(SharkwatchError::invalid_options(format!(
                "missing_threshold must be between 0.0 and 1.0, got {}",
                self.missing_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.row_missing_threshold) {
            return Err(SharkwatchError::invalid_options(format!(
                "row_missing_threshold must be between 0.0 and 1.0, got {}",
                self.row_missing_threshold
            )));
        }
        if self.age_bounds.min > self.age_bounds.max {
            return Err(SharkwatchError::invalid_options(format!(
                "age_bounds min ({}) exceeds max ({})",
                self.age_bounds.min, self.age_bounds.max
            )));
        }
        Ok(())
    }
}

fn clamp_fraction(name: &str, value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0.0, 1.0]", name, value);
    }
    if value.is_nan() { 1.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = CleaningOptions::default();
        assert!(!options.verbose);
        assert_eq!(options.missing_threshold, 0.95);
        assert_eq!(options.row_missing_threshold, 0.70);
        assert_eq!(options.age_bounds, AgeBounds::new(0, 120));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_builder() {
        let options = CleaningOptions::new()
            .with_verbose(true)
            .with_missing_threshold(0.8)
            .with_row_missing_threshold(0.5)
            .with_age_bounds(1, 99);

        assert!(options.verbose);
        assert_eq!(options.missing_threshold, 0.8);
        assert_eq!(options.row_missing_threshold, 0.5);
        assert_eq!(options.age_bounds, AgeBounds::new(1, 99));
    }

    #[test]
    fn test_threshold_clamping() {
        let options = CleaningOptions::new()
            .with_missing_threshold(1.5)
            .with_row_missing_threshold(-0.5);

        assert_eq!(options.missing_threshold, 1.0);
        assert_eq!(options.row_missing_threshold, 0.0);
    }

    #[test]
    fn test_reversed_age_bounds_are_swapped() {
        let options = CleaningOptions::new().with_age_bounds(90, 10);
        assert_eq!(options.age_bounds, AgeBounds::new(10, 90));
    }

    #[test]
    fn test_validate_rejects_direct_values() {
        let options = CleaningOptions {
            missing_threshold: 1.5,
            ..CleaningOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(SharkwatchError::InvalidOptions { .. })
        ));

        let options = CleaningOptions {
            age_bounds: AgeBounds::new(50, 10),
            ..CleaningOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_age_bounds_inclusive() {
        let bounds = AgeBounds::default();
        assert!(bounds.contains(0));
        assert!(bounds.contains(120));
        assert!(!bounds.contains(121));
        assert!(!bounds.contains(-1));
    }

    #[test]
    fn test_from_json_partial() {
        let options = CleaningOptions::from_json(r#"{"verbose": true, "age_bounds": {"min": 1, "max": 100}}"#)
            .unwrap();
        assert!(options.verbose);
        assert_eq!(options.missing_threshold, 0.95);
        assert_eq!(options.age_bounds, AgeBounds::new(1, 100));

        assert!(CleaningOptions::from_json(r#"{"missing_threshold": 2.0}"#).is_err());
    }

    #[test]
    fn test_options_serde_roundtrip() {
        let options = CleaningOptions::new().with_missing_threshold(0.75);
        let json = serde_json::to_string(&options).unwrap();
        let deserialized: CleaningOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, deserialized);
    }
}
