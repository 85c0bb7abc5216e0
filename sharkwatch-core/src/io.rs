//! Delimited-text loading and saving, plus JSON output helpers.
//!
//! Files are read once in full. Cells that are not valid UTF-8 are decoded
//! lossily, since the raw incident export mixes encodings.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;

use crate::error::{Result, SharkwatchError};
use crate::table::{Table, Value};

/// Delimited-text format settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvFormat {
    /// Creates a format with the given delimiter.
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

/// Loads a delimited-text file into a table.
pub fn load_table(path: &Path, format: CsvFormat) -> Result<Table> {
    let file = File::open(path)
        .map_err(|e| SharkwatchError::io(format!("Failed to open {}", path.display()), e))?;
    let table = read_table(file, format)?;
    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Reads a table from any reader.
///
/// Short rows are padded with nulls. A row with more fields than the header
/// is a structural error.
pub fn read_table<R: Read>(reader: R, format: CsvFormat) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| SharkwatchError::csv("Failed to read headers", e))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| {
            SharkwatchError::csv(format!("Failed to parse row {}", index.saturating_add(1)), e)
        })?;

        if record.len() > headers.len() {
            return Err(SharkwatchError::parse(format!(
                "row {} has {} fields but the header has {}",
                index.saturating_add(1),
                record.len(),
                headers.len()
            )));
        }

        let mut row: Vec<Value> = record
            .iter()
            .map(|field| Value::from_raw(&String::from_utf8_lossy(field)))
            .collect();
        row.resize(headers.len(), Value::Null);
        rows.push(row);
    }

    Table::new(headers, rows)
}

/// Saves a table as delimited text.
pub fn save_table(table: &Table, path: &Path, format: CsvFormat) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| SharkwatchError::io(format!("Failed to create {}", path.display()), e))?;
    write_table(table, file, format)?;
    tracing::info!(
        "Wrote {} rows x {} columns to {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(())
}

/// Writes a table to any writer.
pub fn write_table<W: Write>(table: &Table, writer: W, format: CsvFormat) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(format.delimiter)
        .from_writer(writer);

    writer
        .write_record(table.columns())
        .map_err(|e| SharkwatchError::csv("Failed to write header", e))?;

    for (index, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(Value::to_cell))
            .map_err(|e| {
                SharkwatchError::csv(format!("Failed to write row {}", index.saturating_add(1)), e)
            })?;
    }

    writer
        .flush()
        .map_err(|e| SharkwatchError::io("Failed to flush table output", e))?;
    Ok(())
}

/// Serializes a value as pretty JSON and writes it to a file.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_data = serde_json::to_string_pretty(value)
        .map_err(|e| SharkwatchError::serialization("JSON serialization", e))?;
    std::fs::write(path, json_data)
        .map_err(|e| SharkwatchError::io(format!("Failed to write to {}", path.display()), e))?;
    Ok(())
}
