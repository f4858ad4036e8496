//! Evaluation export functionality

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{EvaluationResult, Exclusion, PipelineConfig, RegressionMetrics};

/// Metadata about the evaluation run
#[derive(Debug, Serialize)]
pub struct EvaluationMetadata {
    /// Timestamp of the run (RFC 3339)
    pub timestamp: String,
    /// yieldbin version
    pub yieldbin_version: String,
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Ground-truth split file
    pub ground_truth_file: String,
    /// Raw predictions file
    pub predictions_file: String,
    /// Bin table used for mapping
    pub bin_table_file: String,
}

/// Row accounting for the run
#[derive(Debug, Serialize)]
pub struct EvaluationCounts {
    pub total_rows: usize,
    pub scored_rows: usize,
    pub excluded_rows: usize,
}

/// Complete evaluation export
#[derive(Debug, Serialize)]
pub struct EvaluationExport<'a> {
    pub metadata: EvaluationMetadata,
    pub metrics: RegressionMetrics,
    pub counts: EvaluationCounts,
    pub excluded: &'a [Exclusion],
}

/// Files an evaluation run read
pub struct ExportParams<'a> {
    pub config: &'a PipelineConfig,
    pub ground_truth_file: &'a Path,
    pub predictions_file: &'a Path,
    pub bin_table_file: &'a Path,
}

/// Export evaluation results to a JSON file with run metadata
///
/// # Arguments
/// * `result` - Metrics and exclusions from the evaluator
/// * `output_path` - Path to write the JSON file
/// * `params` - Configuration and input files for the metadata block
pub fn export_evaluation(
    result: &EvaluationResult,
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = EvaluationExport {
        metadata: EvaluationMetadata {
            timestamp: Utc::now().to_rfc3339(),
            yieldbin_version: env!("CARGO_PKG_VERSION").to_string(),
            config: params.config.clone(),
            ground_truth_file: params.ground_truth_file.display().to_string(),
            predictions_file: params.predictions_file.display().to_string(),
            bin_table_file: params.bin_table_file.display().to_string(),
        },
        metrics: result.metrics,
        counts: EvaluationCounts {
            total_rows: result.total_rows,
            scored_rows: result.scored_rows,
            excluded_rows: result.excluded.len(),
        },
        excluded: &result.excluded,
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize evaluation to JSON")?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write evaluation to {}", output_path.display()))?;

    Ok(())
}
