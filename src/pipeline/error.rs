//! Error types for the binning, mapping and evaluation stages.
//!
//! Stage-level failures abort the stage and are returned as `PipelineError`.
//! Row-level problems (unmatched bins, undecodable predictions) are never
//! errors; they are collected and reported alongside the result.

use thiserror::Error;

/// Errors that abort a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The requested column is not present in the input table.
    #[error("Column '{column}' not found. Available columns: {available:?}")]
    Schema {
        column: String,
        available: Vec<String>,
    },

    /// The requested column exists but cannot be read as numbers.
    #[error("Column '{column}' is not numeric (found {dtype})")]
    NonNumericColumn { column: String, dtype: String },

    /// Binning was requested with zero bins or more than `MAX_NUM_BINS`.
    #[error("Number of bins must be between 1 and {max}, got {0}", max = crate::pipeline::config::MAX_NUM_BINS)]
    InvalidBinCount(usize),

    /// The column has no non-missing values, so no bin can be defined.
    #[error("Column '{0}' has no non-missing values to bin")]
    EmptyColumn(String),

    /// A persisted bin table violates the `bins`/`mean_value` layout.
    #[error("Invalid bin table: {0}")]
    InvalidBinTable(String),

    /// Ground truth and estimates are not positionally aligned.
    #[error("Ground truth has {ground_truth} rows but estimates have {estimates} rows")]
    LengthMismatch {
        ground_truth: usize,
        estimates: usize,
    },

    /// Every row was excluded, so metrics have no valid denominator.
    #[error("Insufficient data: all {total} row(s) were excluded from scoring")]
    InsufficientData { total: usize },

    /// A case identifier without a preset was used without an explicit column.
    #[error("Unknown case '{0}'. Known cases: case1, case2, case3 (or pass --column)")]
    UnknownCase(String),

    /// A description template references a column the row does not have.
    #[error("Template placeholder '{{{placeholder}}}' does not match any column")]
    UnknownPlaceholder { placeholder: String },

    /// A description template has an unbalanced brace.
    #[error("Malformed template at byte {position}: {message}")]
    MalformedTemplate { position: usize, message: String },

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = PipelineError::Schema {
            column: "Yield".to_string(),
            available: vec!["a".to_string(), "b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'Yield'"));
        assert!(msg.contains("\"a\""));
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = PipelineError::InsufficientData { total: 3 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: all 3 row(s) were excluded from scoring"
        );
    }

    #[test]
    fn test_unknown_placeholder_display() {
        let err = PipelineError::UnknownPlaceholder {
            placeholder: "T(K)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Template placeholder '{T(K)}' does not match any column"
        );
    }
}
