//! Error types for the cleaning pipeline and its surrounding I/O.
//!
//! Structural failures (empty input, missing columns, malformed files) are
//! fatal and surface as [`SharkwatchError`]. Per-value failures are never
//! fatal: they are modelled by [`ValueError`] and folded into the step
//! report counters.

use thiserror::Error;

/// Main error type for Sharkwatch operations.
#[derive(Debug, Error)]
pub enum SharkwatchError {
    /// The table has no rows or no columns to clean
    #[error("Empty input: table has {rows} rows and {columns} columns")]
    EmptyInput { rows: usize, columns: usize },

    /// A step expected a column that the table does not carry
    #[error("Schema error in step '{step}': expected column '{column}' is absent")]
    Schema { step: String, column: String },

    /// Structural input that a parser cannot proceed with
    #[error("Parse error: {context}")]
    Parse { context: String },

    /// Cleaning or analysis options outside their valid range
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text reading or writing failed
    #[error("CSV operation failed: {context}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Template rendering failed
    #[error("Rendering failed: {context}")]
    Render {
        context: String,
        #[source]
        source: askama::Error,
    },
}

/// Convenience type alias for Results with SharkwatchError
pub type Result<T> = std::result::Result<T, SharkwatchError>;

impl SharkwatchError {
    /// Creates an empty-input error for a table of the given shape
    pub fn empty_input(rows: usize, columns: usize) -> Self {
        Self::EmptyInput { rows, columns }
    }

    /// Creates a schema error for a missing column
    pub fn schema(step: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            step: step.into(),
            column: column.into(),
        }
    }

    /// Creates a structural parse error
    pub fn parse(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
        }
    }

    /// Creates an invalid-options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps a CSV error with context
    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    /// Wraps a serde_json error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Wraps a template error with context
    pub fn render(context: impl Into<String>, source: askama::Error) -> Self {
        Self::Render {
            context: context.into(),
            source,
        }
    }

    /// Returns true for errors raised before any data was touched.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyInput { .. } | Self::InvalidOptions { .. })
    }
}

/// Per-value extraction failure.
///
/// These never abort a step; the step counts them in its report and leaves
/// a null in place of the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// No matcher could make sense of the value
    #[error("value '{0}' could not be parsed")]
    Unparseable(String),

    /// The value parsed but falls outside the permitted range
    #[error("value {value} outside bounds [{min}, {max}]")]
    OutOfBounds { value: i64, min: i64, max: i64 },
}
