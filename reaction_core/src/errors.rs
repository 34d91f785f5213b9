//! # Error Types
//!
//! Structured error types for reaction_core. Each variant carries enough
//! context for a caller to tell the user what was wrong with the workbook
//! or the text they typed, without parsing the message string.
//!
//! ## Example
//!
//! ```rust
//! use reaction_core::errors::{ReactionError, ReactionResult};
//!
//! fn require_groups(count: usize) -> ReactionResult<()> {
//!     if count == 0 {
//!         return Err(ReactionError::NoSupportGroups);
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_groups(0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for reaction_core operations
pub type ReactionResult<T> = Result<T, ReactionError>;

/// Structured error type for extraction and aggregation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ReactionError {
    /// No row of the grid carries the header keywords of a table
    #[error("{table} table not found: no row contains all of {keywords:?}")]
    HeaderNotFound {
        table: String,
        keywords: Vec<String>,
    },

    /// A header row was found but some semantic columns could not be bound
    #[error("{table} table is missing columns {missing:?}; found columns: {found:?}")]
    MissingColumns {
        table: String,
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// A data row that must become a record holds unusable data
    #[error("Invalid data in row {row}, column '{column}': '{value}' - {reason}")]
    InvalidData {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// The support group definition could not be parsed
    #[error("Invalid support group entry '{entry}': {reason}")]
    GroupParse { entry: String, reason: String },

    /// The support group definition produced no groups
    #[error("No support groups defined")]
    NoSupportGroups,

    /// Requested sheet does not exist in the workbook
    #[error("Sheet '{sheet}' not found; available sheets: {available:?}")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Aggregation failed for one entry of a group result
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ReactionError {
    /// Create a HeaderNotFound error
    pub fn header_not_found(table: impl Into<String>, keywords: &[String]) -> Self {
        ReactionError::HeaderNotFound {
            table: table.into(),
            keywords: keywords.to_vec(),
        }
    }

    /// Create an InvalidData error
    pub fn invalid_data(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ReactionError::InvalidData {
            row,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a GroupParse error
    pub fn group_parse(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        ReactionError::GroupParse {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ReactionError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(
        calculation_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ReactionError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ReactionError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure leaves the extracted dataset unusable.
    ///
    /// Group definition errors only need the user to fix their text and
    /// resubmit; the workbook itself is still fine.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReactionError::GroupParse { .. } | ReactionError::NoSupportGroups
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ReactionError::HeaderNotFound { .. } => "HEADER_NOT_FOUND",
            ReactionError::MissingColumns { .. } => "MISSING_COLUMNS",
            ReactionError::InvalidData { .. } => "INVALID_DATA",
            ReactionError::GroupParse { .. } => "GROUP_PARSE",
            ReactionError::NoSupportGroups => "NO_SUPPORT_GROUPS",
            ReactionError::SheetNotFound { .. } => "SHEET_NOT_FOUND",
            ReactionError::InvalidInput { .. } => "INVALID_INPUT",
            ReactionError::CalculationFailed { .. } => "CALCULATION_FAILED",
            ReactionError::FileError { .. } => "FILE_ERROR",
            ReactionError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ReactionError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for ReactionError {
    fn from(err: serde_json::Error) -> Self {
        ReactionError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = ReactionError::MissingColumns {
            table: "Reactions".to_string(),
            missing: vec!["FZ".to_string()],
            found: vec!["Node".to_string(), "L/C".to_string(), "Fx kN".to_string()],
        };
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: ReactionError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ReactionError::NoSupportGroups.error_code(), "NO_SUPPORT_GROUPS");
        assert_eq!(
            ReactionError::group_parse("P1 1,2", "missing ':'").error_code(),
            "GROUP_PARSE"
        );
    }

    #[test]
    fn test_fatality() {
        assert!(!ReactionError::group_parse("x", "y").is_fatal());
        assert!(ReactionError::header_not_found("Reactions", &["NODE".to_string()]).is_fatal());
    }

    #[test]
    fn test_message_lists_found_columns() {
        let error = ReactionError::MissingColumns {
            table: "Reactions".to_string(),
            missing: vec!["FY".to_string()],
            found: vec!["Node".to_string()],
        };
        let msg = error.to_string();
        assert!(msg.contains("FY"));
        assert!(msg.contains("Node"));
    }
}
