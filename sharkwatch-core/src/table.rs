//! In-memory table model.
//!
//! A [`Table`] is an ordered list of column names plus an ordered list of
//! records. Every record carries exactly one [`Value`] per column; sparse
//! raw cells are stored as [`Value::Null`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SharkwatchError};

/// Cell spelling of [`Value::Date`].
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Absent or explicitly missing
    #[default]
    Null,
    /// Whole number
    Integer(i64),
    /// Fractional number
    Float(f64),
    /// Calendar date
    Date(NaiveDate),
    /// Free text
    Text(String),
}

impl Value {
    /// Builds a value from a raw delimited-text cell.
    ///
    /// Empty cells become `Null`. Numbers and ISO dates are typed only in
    /// their canonical spelling, so that [`Value::to_cell`] writes back the
    /// same text; `0830`, `+12` and `1.50` stay verbatim text.
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>()
            && i.to_string() == trimmed
        {
            return Value::Integer(i);
        }
        if looks_numeric(trimmed)
            && let Ok(f) = trimmed.parse::<f64>()
            && f.is_finite()
            && f.to_string() == trimmed
        {
            return Value::Float(f);
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT)
            && d.format(ISO_DATE_FORMAT).to_string() == trimmed
        {
            return Value::Date(d);
        }
        Value::Text(raw.to_string())
    }

    /// Returns true for `Null` and for text that is blank after trimming.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns true only for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer when it is one exactly.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the date payload, if any.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as a float for any numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Renders the value as a delimited-text cell.
    pub fn to_cell(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Date(d) => d.format(ISO_DATE_FORMAT).to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Returns a comparable key for equality-based grouping.
    ///
    /// Nulls are treated as a single value, and each variant carries a tag
    /// so that `Integer(1)` and `Text("1")` stay distinct.
    pub fn grouping_key(&self) -> String {
        match self {
            Value::Null => "__NULL__".to_string(),
            Value::Integer(i) => format!("i:{}", i),
            Value::Float(f) => format!("f:{}", f),
            Value::Date(d) => format!("d:{}", d),
            Value::Text(s) => format!("t:{}", s),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            other => write!(f, "{}", other.to_cell()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

fn looks_numeric(s: &str) -> bool {
    // Rejects "inf", "NaN" and friends, which f64::from_str would accept.
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && s.chars().any(|c| c.is_ascii_digit())
}

/// One row of a table, aligned with the table's column list.
pub type Record = Vec<Value>;

/// An ordered, rectangular collection of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Creates a table, checking that every row has one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(SharkwatchError::parse(format!(
                "row {} has {} values but the table has {} columns",
                index.saturating_add(1),
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Creates a table from string-literal rows, mainly for tests and demos.
    ///
    /// Cells go through [`Value::from_raw`], exactly like loaded CSV cells.
    pub fn from_raw_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| Value::from_raw(cell)).collect())
            .collect();
        Self::new(columns, rows)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Returns true when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns true if the table carries the named column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterates over the values of a column, or `None` if it is absent.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }

    /// Value at (row, column name).
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Fraction of missing values in a column (0.0 for an empty table).
    pub fn missing_fraction(&self, name: &str) -> Option<f64> {
        let index = self.column_index(name)?;
        Some(self.missing_fraction_at(index))
    }

    pub(crate) fn missing_fraction_at(&self, index: usize) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let missing = self.rows.iter().filter(|r| r[index].is_missing()).count();
        missing as f64 / self.rows.len() as f64
    }

    /// Removes the columns at the given positions, keeping order otherwise.
    pub(crate) fn drop_columns(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| !indices.contains(&i))
            .collect();
        let mut flags = keep.iter();
        self.columns.retain(|_| flags.next().copied().unwrap_or(true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| flags.next().copied().unwrap_or(true));
        }
    }

    /// Keeps only the rows whose flag is true.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(true));
    }

    /// Appends a column filled with nulls and returns its position.
    pub(crate) fn push_null_column(&mut self, name: impl Into<String>) -> usize {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len().saturating_sub(1)
    }

    pub(crate) fn rename_column(&mut self, index: usize, name: impl Into<String>) {
        if let Some(column) = self.columns.get_mut(index) {
            *column = name.into();
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_raw_rows(
            &["Country", "Age", "Notes"],
            &[&["USA", "25", ""], &["AUSTRALIA", "", ""], &["", "31.5", "x"]],
        )
        .unwrap()
    }

    #[test]
    fn test_value_from_raw() {
        assert_eq!(Value::from_raw(""), Value::Null);
        assert_eq!(Value::from_raw("42"), Value::Integer(42));
        assert_eq!(Value::from_raw(" 7 "), Value::Integer(7));
        assert_eq!(Value::from_raw("2.5"), Value::Float(2.5));
        assert_eq!(Value::from_raw("20s"), Value::Text("20s".to_string()));
        assert_eq!(Value::from_raw("NaN"), Value::Text("NaN".to_string()));
        assert_eq!(Value::from_raw("inf"), Value::Text("inf".to_string()));
        assert_eq!(
            Value::from_raw("2025-11-27"),
            Value::Date(NaiveDate::from_ymd_opt(2025, 11, 27).unwrap())
        );
    }

    #[test]
    fn test_value_from_raw_keeps_non_canonical_spellings() {
        for raw in ["0830", "+12", "1.50", "2023.0", "1e3", "2025-1-5", "2025-02-30"] {
            assert_eq!(Value::from_raw(raw), Value::Text(raw.to_string()), "{raw}");
            assert_eq!(Value::from_raw(raw).to_cell(), raw);
        }
    }

    #[test]
    fn test_value_missing() {
        assert!(Value::Null.is_missing());
        assert!(Value::Text("   ".to_string()).is_missing());
        assert!(!Value::Text("M".to_string()).is_missing());
        assert!(!Value::Integer(0).is_missing());
    }

    #[test]
    fn test_grouping_key_distinguishes_variants() {
        assert_ne!(
            Value::Integer(1).grouping_key(),
            Value::Text("1".to_string()).grouping_key()
        );
        assert_eq!(Value::Null.grouping_key(), Value::Null.grouping_key());
    }

    #[test]
    fn test_table_rejects_ragged_rows() {
        let result = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Null, Value::Null], vec![Value::Null]],
        );
        assert!(matches!(result, Err(SharkwatchError::Parse { .. })));
    }

    #[test]
    fn test_missing_fraction() {
        let table = sample();
        assert!((table.missing_fraction("Notes").unwrap() - 2.0 / 3.0).abs() < 1e-9);
        assert!((table.missing_fraction("Country").unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!(table.missing_fraction("Nope").is_none());
    }

    #[test]
    fn test_drop_columns_preserves_order() {
        let mut table = sample();
        table.drop_columns(&[1]);
        assert_eq!(table.columns(), &["Country".to_string(), "Notes".to_string()]);
        assert_eq!(table.rows()[2][1], Value::Text("x".to_string()));
    }

    #[test]
    fn test_push_null_column() {
        let mut table = sample();
        let index = table.push_null_column("Derived");
        assert_eq!(index, 3);
        assert!(table.rows().iter().all(|r| r[3].is_null()));
    }

    #[test]
    fn test_to_cell() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 27).unwrap();
        assert_eq!(Value::Date(date).to_cell(), "2025-11-27");
        assert_eq!(Value::Null.to_cell(), "");
        assert_eq!(Value::Float(2.5).to_cell(), "2.5");
    }
}
