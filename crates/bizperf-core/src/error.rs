//! Error types for bizperf
//!
//! This module defines the error types used throughout the bizperf library.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use bizperf_core::error::{BizperfError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to BizperfError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::RecordId;

/// Main error type for bizperf operations
///
/// Aggregation itself never fails; these errors come from storage,
/// argument parsing, and the CSV import/export paths.
#[derive(Error, Debug)]
pub enum BizperfError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid year or month
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Record id not present in the table
    #[error("No record {id} in table {table}")]
    NotFound {
        /// Table name
        table: &'static str,
        /// The missing id
        id: RecordId,
    },

    /// Master-data code that does not resolve
    #[error("Unknown {kind} code: {code}")]
    UnknownCode {
        /// Lookup kind (company, division, customer)
        kind: &'static str,
        /// The code as written in the input
        code: String,
    },

    /// One or more rows of an import failed validation
    #[error("Import rejected, {} row(s) invalid:\n{}", .errors.len(), ImportErrors(.errors))]
    Import {
        /// Per-row errors in file order
        errors: Vec<RowError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A newer refresh started before this one finished
    #[error("Result superseded by a newer request")]
    Superseded,
}

/// A validation failure tied to a line of an input file
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number including the header line
    pub line: usize,
    /// What was wrong with the row
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

struct ImportErrors<'a>(&'a [RowError]);

impl fmt::Display for ImportErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {err}")?;
        }
        Ok(())
    }
}

/// Convenience type alias for Results in bizperf
///
/// # Example
///
/// ```
/// use bizperf_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, BizperfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BizperfError::Superseded;
        assert_eq!(error.to_string(), "Result superseded by a newer request");

        let error = BizperfError::UnknownCode {
            kind: "company",
            code: "ACME".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown company code: ACME");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: BizperfError = io_error.into();
        assert!(matches!(error, BizperfError::Io(_)));
    }

    #[test]
    fn test_import_error_lists_rows() {
        let error = BizperfError::Import {
            errors: vec![
                RowError {
                    line: 2,
                    message: "Unknown company code: X".to_string(),
                },
                RowError {
                    line: 5,
                    message: "month out of range: 13".to_string(),
                },
            ],
        };
        let text = error.to_string();
        assert!(text.starts_with("Import rejected, 2 row(s) invalid:"));
        assert!(text.contains("line 2: Unknown company code: X"));
        assert!(text.contains("line 5: month out of range: 13"));
    }
}
