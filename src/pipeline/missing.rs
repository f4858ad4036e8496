//! Numeric column extraction with missing-value accounting
//!
//! Nulls, NaNs, infinities and (for lenient reads) unparsable text all become
//! `None`.
//! Callers decide what a missing entry means; it is never turned into zero.

use polars::prelude::*;

use super::error::{PipelineError, PipelineResult};

/// Missing-value counts for one extracted column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSummary {
    pub column: String,
    pub total: usize,
    pub missing: usize,
}

impl MissingSummary {
    pub fn present(&self) -> usize {
        self.total - self.missing
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missing as f64 / self.total as f64
        }
    }
}

/// Look up a column, reporting the available names when it is absent.
pub fn require_column<'a>(df: &'a DataFrame, column: &str) -> PipelineResult<&'a Column> {
    df.column(column).map_err(|_| PipelineError::Schema {
        column: column.to_string(),
        available: df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}

fn to_float_values(col: &Column) -> PipelineResult<Vec<Option<f64>>> {
    let cast = col.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

fn summarize(column: &str, values: &[Option<f64>]) -> MissingSummary {
    MissingSummary {
        column: column.to_string(),
        total: values.len(),
        missing: values.iter().filter(|v| v.is_none()).count(),
    }
}

/// Extract a numeric column as `Option<f64>` per row.
///
/// The column must have a numeric dtype; text columns are rejected.
pub fn numeric_column(
    df: &DataFrame,
    column: &str,
) -> PipelineResult<(Vec<Option<f64>>, MissingSummary)> {
    let col = require_column(df, column)?;

    if !col.dtype().is_primitive_numeric() && !matches!(col.dtype(), DataType::Null) {
        return Err(PipelineError::NonNumericColumn {
            column: column.to_string(),
            dtype: col.dtype().to_string(),
        });
    }

    let values = to_float_values(col)?;
    let summary = summarize(column, &values);
    Ok((values, summary))
}

/// Extract a column as numbers, treating unparsable text as missing.
///
/// Ground-truth columns go through here so a stray `"n/a"` excludes one row
/// instead of failing the whole evaluation.
pub fn lenient_numeric_column(
    df: &DataFrame,
    column: &str,
) -> PipelineResult<(Vec<Option<f64>>, MissingSummary)> {
    let col = require_column(df, column)?;

    let values = if matches!(col.dtype(), DataType::String) {
        col.str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()).filter(|x| x.is_finite()))
            .collect()
    } else {
        to_float_values(col)?
    };

    let summary = summarize(column, &values);
    Ok((values, summary))
}
