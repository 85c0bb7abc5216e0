//! Static lookup tables for the cleaning steps.
//!
//! All mappings are fixed data. Keys are compared against the upper-cased,
//! whitespace-collapsed form of a value.

/// Case convention applied by `standardize_strings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseConvention {
    /// Keep the value's case
    Preserve,
    /// UPPER CASE
    Upper,
    /// Title Case
    Title,
}

/// A designated free-text column.
#[derive(Debug, Clone, Copy)]
pub struct TextColumnRule {
    /// Canonical column name
    pub column: &'static str,
    /// Raw header spellings renamed to the canonical name
    pub aliases: &'static [&'static str],
    /// Case convention
    pub case: CaseConvention,
    /// (variant, canonical) pairs; variants are upper case
    pub synonyms: &'static [(&'static str, &'static str)],
    /// Values (upper case) that mean "no information"
    pub invalid_markers: &'static [&'static str],
    /// Whether the step fails when the column is absent
    pub required: bool,
}

/// A small-cardinality column collapsed onto a fixed set.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalRule {
    /// Canonical column name
    pub column: &'static str,
    /// Raw header spellings renamed to the canonical name
    pub aliases: &'static [&'static str],
    /// (canonical token, upper-case variants)
    pub variants: &'static [(&'static str, &'static [&'static str])],
}

impl CategoricalRule {
    /// The canonical tokens, in declaration order.
    pub fn canonical_set(&self) -> Vec<&'static str> {
        self.variants.iter().map(|(token, _)| *token).collect()
    }
}

pub const COUNTRY_SYNONYMS: &[(&str, &str)] = &[
    ("US", "USA"),
    ("U.S.", "USA"),
    ("U.S.A.", "USA"),
    ("UNITED STATES", "USA"),
    ("UNITED STATES OF AMERICA", "USA"),
    ("RSA", "SOUTH AFRICA"),
    ("REPUBLIC OF SOUTH AFRICA", "SOUTH AFRICA"),
    ("ENGLAND", "UNITED KINGDOM"),
    ("SCOTLAND", "UNITED KINGDOM"),
    ("WALES", "UNITED KINGDOM"),
    ("UK", "UNITED KINGDOM"),
    ("U.K.", "UNITED KINGDOM"),
    ("GREAT BRITAIN", "UNITED KINGDOM"),
    ("REUNION ISLAND", "REUNION"),
    ("COLUMBIA", "COLOMBIA"),
];

pub const SPECIES_SYNONYMS: &[(&str, &str)] = &[
    ("WHITE SHARK", "White Shark"),
    ("GREAT WHITE SHARK", "White Shark"),
    ("GREAT WHITE", "White Shark"),
    ("TIGER SHARK", "Tiger Shark"),
    ("BULL SHARK", "Bull Shark"),
    ("ZAMBESI SHARK", "Bull Shark"),
    ("ZAMBEZI SHARK", "Bull Shark"),
    ("BLACK TIP SHARK", "Blacktip Shark"),
    ("BLACKTIP SHARK", "Blacktip Shark"),
];

const SPECIES_INVALID: &[&str] = &[
    "INVALID",
    "UNKNOWN",
    "NOT STATED",
    "UNCONFIRMED",
    "SHARK INVOLVEMENT NOT CONFIRMED",
    "SHARK INVOLVEMENT PRIOR TO DEATH WAS NOT CONFIRMED",
    "NO SHARK INVOLVEMENT",
    "QUESTIONABLE",
    "NAN",
];

const TYPE_INVALID: &[&str] = &["INVALID", "QUESTIONABLE", "UNCONFIRMED", "UNVERIFIED", "NAN"];

const COUNTRY_INVALID: &[&str] = &["NAN", "UNKNOWN", "NONE"];

const NAN_ONLY: &[&str] = &["NAN"];

/// Designated text columns, in processing order.
pub const TEXT_COLUMNS: &[TextColumnRule] = &[
    TextColumnRule {
        column: "Country",
        aliases: &["Country ", "COUNTRY"],
        case: CaseConvention::Upper,
        synonyms: COUNTRY_SYNONYMS,
        invalid_markers: COUNTRY_INVALID,
        required: true,
    },
    TextColumnRule {
        column: "Area",
        aliases: &[],
        case: CaseConvention::Preserve,
        synonyms: &[],
        invalid_markers: NAN_ONLY,
        required: false,
    },
    TextColumnRule {
        column: "Location",
        aliases: &[],
        case: CaseConvention::Preserve,
        synonyms: &[],
        invalid_markers: NAN_ONLY,
        required: false,
    },
    TextColumnRule {
        column: "Activity",
        aliases: &[],
        case: CaseConvention::Title,
        synonyms: &[],
        invalid_markers: NAN_ONLY,
        required: false,
    },
    TextColumnRule {
        column: "Type",
        aliases: &[],
        case: CaseConvention::Title,
        synonyms: &[],
        invalid_markers: TYPE_INVALID,
        required: false,
    },
    TextColumnRule {
        column: "Name",
        aliases: &[],
        case: CaseConvention::Preserve,
        synonyms: &[],
        invalid_markers: NAN_ONLY,
        required: false,
    },
    TextColumnRule {
        column: "Injury",
        aliases: &[],
        case: CaseConvention::Preserve,
        synonyms: &[],
        invalid_markers: NAN_ONLY,
        required: false,
    },
    TextColumnRule {
        column: "Species",
        aliases: &["Species "],
        case: CaseConvention::Title,
        synonyms: SPECIES_SYNONYMS,
        invalid_markers: SPECIES_INVALID,
        required: false,
    },
];

pub const SEX_RULE: CategoricalRule = CategoricalRule {
    column: "Sex",
    aliases: &["Sex "],
    variants: &[
        ("M", &["M", "MALE", "MAN", "BOY"]),
        ("F", &["F", "FEMALE", "WOMAN", "GIRL"]),
    ],
};

// "F" in the raw fatal column marks a fatality, not a sex.
pub const FATAL_RULE: CategoricalRule = CategoricalRule {
    column: "Fatal",
    aliases: &["Fatal Y/N", "Fatal (Y/N)", "Fatal Y/N "],
    variants: &[
        ("Y", &["Y", "YES", "FATAL", "F"]),
        ("N", &["N", "NO", "NON-FATAL", "NONFATAL"]),
    ],
};

/// Categorical columns, in processing order.
pub const CATEGORICAL_COLUMNS: &[CategoricalRule] = &[SEX_RULE, FATAL_RULE];

/// Qualitative age terms, tried in order; the first contained term wins.
pub const AGE_TERMS: &[(&str, i64)] = &[
    ("teen", 15),
    ("adult", 30),
    ("child", 8),
    ("boy", 10),
    ("girl", 10),
    ("young", 25),
    ("elderly", 70),
    ("middle", 45),
];

/// Text tokens treated as missing by `handle_missing` (compared upper case).
pub const MISSING_PLACEHOLDERS: &[&str] = &["NAN", "NULL", "NONE", "N/A", "NA", "?", "-", "--"];

/// Source column read by `extract_dates`.
pub const DATE_COLUMN: &str = "Date";
/// Derived column written by `extract_dates`.
pub const DATE_PARSED_COLUMN: &str = "Date_Parsed";
/// Year column used as a date fallback and coerced to integers.
pub const YEAR_COLUMN: &str = "Year";
/// Column rewritten by `extract_ages`.
pub const AGE_COLUMN: &str = "Age";

/// Returns true for columns a later step depends on, under any of their
/// accepted header spellings. These are never dropped for sparseness.
pub fn is_protected_column(name: &str) -> bool {
    let required_text = TEXT_COLUMNS
        .iter()
        .filter(|rule| rule.required)
        .any(|rule| rule.column == name || rule.aliases.contains(&name));
    let categorical = CATEGORICAL_COLUMNS
        .iter()
        .any(|rule| rule.column == name || rule.aliases.contains(&name));
    required_text
        || categorical
        || [DATE_COLUMN, DATE_PARSED_COLUMN, YEAR_COLUMN, AGE_COLUMN].contains(&name)
}

/// Resolves a rule's column in the table's column list.
///
/// Returns the position and, when the column was found under an alias, the
/// alias that should be renamed.
pub fn resolve_column<'a>(
    columns: &'a [String],
    canonical: &str,
    aliases: &[&str],
) -> Option<(usize, Option<&'a str>)> {
    if let Some(index) = columns.iter().position(|c| c == canonical) {
        return Some((index, None));
    }
    aliases.iter().find_map(|alias| {
        columns
            .iter()
            .position(|c| c == alias)
            .map(|index| (index, Some(columns[index].as_str())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_targets_are_fixed_points() {
        // A canonical token must map to itself (or not be a key at all),
        // otherwise re-running the step would keep changing values.
        for (_, canonical) in COUNTRY_SYNONYMS {
            if let Some((_, target)) = COUNTRY_SYNONYMS.iter().find(|(k, _)| k == canonical) {
                assert_eq!(target, canonical);
            }
        }
        for (_, canonical) in SPECIES_SYNONYMS {
            let key = canonical.to_uppercase();
            let target = SPECIES_SYNONYMS
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .unwrap_or(*canonical);
            assert_eq!(target, *canonical);
        }
    }

    #[test]
    fn test_keys_are_upper_case() {
        for rule in TEXT_COLUMNS {
            for (key, _) in rule.synonyms {
                assert_eq!(*key, key.to_uppercase());
            }
            for marker in rule.invalid_markers {
                assert_eq!(*marker, marker.to_uppercase());
            }
        }
        for rule in CATEGORICAL_COLUMNS {
            for (_, variants) in rule.variants {
                for variant in *variants {
                    assert_eq!(*variant, variant.to_uppercase());
                }
            }
        }
    }

    #[test]
    fn test_resolve_column_prefers_canonical() {
        let columns = vec!["Species ".to_string(), "Species".to_string()];
        assert_eq!(resolve_column(&columns, "Species", &["Species "]), Some((1, None)));

        let columns = vec!["Fatal Y/N".to_string()];
        assert_eq!(
            resolve_column(&columns, "Fatal", FATAL_RULE.aliases),
            Some((0, Some("Fatal Y/N")))
        );
        assert_eq!(resolve_column(&columns, "Sex", SEX_RULE.aliases), None);
    }

    #[test]
    fn test_protected_columns() {
        assert!(is_protected_column("Country"));
        assert!(is_protected_column("Fatal Y/N"));
        assert!(is_protected_column("Date_Parsed"));
        assert!(is_protected_column("Age"));
        assert!(!is_protected_column("Species "));
        assert!(is_protected_column("Year"));
        assert!(!is_protected_column("Href"));
    }

    #[test]
    fn test_canonical_sets() {
        assert_eq!(SEX_RULE.canonical_set(), vec!["M", "F"]);
        assert_eq!(FATAL_RULE.canonical_set(), vec!["Y", "N"]);
    }
}
