//! Error types for the sheetq engine
//!
//! Internal helpers return [`Result`]; the engine boundary
//! ([`crate::Engine::run`], [`crate::filter::FilterBuilder::build_mask`],
//! [`crate::ops::dispatch`]) turns every error into a logged warning and a
//! degraded result instead.

use polars::error::PolarsError;
use sheetq_parser::ParseError;

/// Result type alias for sheetq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sheetq operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars errors (`DataFrame` operations)
    #[error("DataFrame error: {0}")]
    Polars(#[from] PolarsError),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Free-form expression could not be parsed
    #[error("Expression error: {0}")]
    Parse(#[from] ParseError),

    /// Spreadsheet could not be opened or read
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Table source problems other than I/O (unknown extension, missing sheet)
    #[error("Source error: {0}")]
    Source(String),

    /// A column the computation needs is absent
    #[error("Column not found: {0}")]
    Column(String),

    /// General operation errors
    #[error("Operation error: {0}")]
    Operation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an operation error
    pub fn operation(msg: impl Into<String>) -> Self {
        Error::Operation(msg.into())
    }

    /// Create a source error
    pub fn source_error(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }

    /// Create a missing-column error
    pub fn column(name: impl Into<String>) -> Self {
        Error::Column(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::column("Fare").to_string(),
            "Column not found: Fare"
        );
        assert_eq!(
            Error::operation("bad").to_string(),
            "Operation error: bad"
        );
        let parse: Error = ParseError::EmptyInput.into();
        assert_eq!(parse.to_string(), "Expression error: Empty input");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from(io), Error::Io(_)));
    }
}
