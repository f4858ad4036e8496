//! Model prediction files
//!
//! Predictions arrive as JSONL, one `{"label": ..., "predict": ...}` object per
//! line, in the same row order as the evaluated split. They are decoded into a
//! `label`/`predict` CSV and later mapped to `mean_values` through the bin table.

use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use serde_json::Value;

use super::decoder::{decode, digit_run_count};
use super::error::PipelineResult;
use super::mapper::{apply, BinKey, Mapping};
use super::missing::require_column;
use super::quantizer::BinTable;

pub const LABEL_COLUMN: &str = "label";
pub const PREDICT_COLUMN: &str = "predict";
pub const MEAN_VALUES_COLUMN: &str = "mean_values";

/// One raw model output paired with its ground-truth label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub label: String,
    pub predict: String,
}

/// A prediction after decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPrediction {
    pub label: String,
    /// Candidate bin index; empty when the text had no digits
    pub predict: String,
}

impl DecodedPrediction {
    pub fn is_decode_failure(&self) -> bool {
        self.predict.is_empty()
    }
}

/// Render a JSON field as text. Absent and null fields are empty.
fn field_text(object: &Value, field: &str) -> String {
    match object.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse one JSONL line.
pub fn parse_prediction_line(line: &str) -> Result<PredictionRecord> {
    let object: Value = serde_json::from_str(line).context("Invalid JSON")?;
    if !object.is_object() {
        anyhow::bail!("Expected a JSON object, found: {}", object);
    }
    Ok(PredictionRecord {
        label: field_text(&object, LABEL_COLUMN),
        predict: field_text(&object, PREDICT_COLUMN),
    })
}

/// Read every prediction from a JSONL file. Blank lines are skipped.
pub fn read_prediction_records(path: &Path) -> Result<Vec<PredictionRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open predictions file: {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line
            .with_context(|| format!("Failed to read line {} of {}", idx + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_prediction_line(&line)
            .with_context(|| format!("Line {} of {}", idx + 1, path.display()))?;
        records.push(record);
    }

    Ok(records)
}

pub fn decode_record(record: &PredictionRecord) -> DecodedPrediction {
    DecodedPrediction {
        label: record.label.clone(),
        predict: decode(&record.predict),
    }
}

/// Decode every record, warning about rows that had no digits at all.
pub fn decode_records(records: &[PredictionRecord]) -> Vec<DecodedPrediction> {
    let failures: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| digit_run_count(&r.predict) == 0)
        .map(|(i, _)| i)
        .collect();

    if !failures.is_empty() {
        log::warn!(
            "{} prediction(s) contained no digits: rows {:?}",
            failures.len(),
            failures
        );
    }

    records.iter().map(decode_record).collect()
}

/// `label`/`predict` frame, both text.
pub fn decoded_to_dataframe(decoded: &[DecodedPrediction]) -> PipelineResult<DataFrame> {
    let labels: Vec<&str> = decoded.iter().map(|d| d.label.as_str()).collect();
    let predicts: Vec<&str> = decoded.iter().map(|d| d.predict.as_str()).collect();
    let df = DataFrame::new(vec![
        Column::new(LABEL_COLUMN.into(), labels),
        Column::new(PREDICT_COLUMN.into(), predicts),
    ])?;
    Ok(df)
}

/// Read decoded predictions back from a text-typed frame. Nulls become empty.
pub fn decoded_from_dataframe(df: &DataFrame) -> PipelineResult<Vec<DecodedPrediction>> {
    let labels = require_column(df, LABEL_COLUMN)?.cast(&DataType::String)?;
    let predicts = require_column(df, PREDICT_COLUMN)?.cast(&DataType::String)?;

    let decoded = labels
        .str()?
        .into_iter()
        .zip(predicts.str()?.into_iter())
        .map(|(label, predict)| DecodedPrediction {
            label: label.unwrap_or_default().to_string(),
            predict: predict.unwrap_or_default().to_string(),
        })
        .collect();

    Ok(decoded)
}

/// Decoded predictions mapped through a bin table
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMapping {
    pub mapping: Mapping,
    /// Rows whose raw text had no digits (a subset of the unmatched rows)
    pub decode_failures: Vec<usize>,
}

/// Map decoded candidates to estimates.
pub fn map_predictions(decoded: &[DecodedPrediction], table: &BinTable) -> PredictionMapping {
    let keys: Vec<BinKey> = decoded
        .iter()
        .map(|d| BinKey::Text(d.predict.clone()))
        .collect();
    let mapping = apply(&keys, table);

    if !mapping.is_fully_matched() {
        log::warn!("Unmatched prediction rows: {:?}", mapping.unmatched);
    }

    let decode_failures = decoded
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_decode_failure())
        .map(|(i, _)| i)
        .collect();

    PredictionMapping {
        mapping,
        decode_failures,
    }
}

/// Decoded predictions plus their `mean_values` column.
pub fn mapped_predictions_frame(
    decoded: &[DecodedPrediction],
    mapping: &Mapping,
) -> PipelineResult<DataFrame> {
    let mut df = decoded_to_dataframe(decoded)?;
    df.with_column(Column::new(
        MEAN_VALUES_COLUMN.into(),
        mapping.estimates.clone(),
    ))?;
    Ok(df)
}
