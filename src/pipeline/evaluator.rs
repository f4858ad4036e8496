//! Regression metrics over recovered estimates
//!
//! Ground truth and estimates are aligned by position, and unequal lengths are
//! rejected. Rows where either side is undefined are excluded from scoring and
//! reported with a reason.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::error::{PipelineError, PipelineResult};
use super::mapper::Mapping;

/// Why a row was left out of the metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The raw prediction had no digits
    DecodeFailure,
    /// The decoded index is not a bin of the table
    UnmatchedBin,
    /// The bin matched but has no value (coverage gap), or no reason was given
    UndefinedEstimate,
    /// Ground truth is missing or not numeric
    MissingGroundTruth,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExclusionReason::DecodeFailure => "no digits in prediction",
            ExclusionReason::UnmatchedBin => "unmatched bin",
            ExclusionReason::UndefinedEstimate => "undefined estimate",
            ExclusionReason::MissingGroundTruth => "missing ground truth",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub row: usize,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
}

/// Metrics plus the rows that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub metrics: RegressionMetrics,
    pub total_rows: usize,
    pub scored_rows: usize,
    pub excluded: Vec<Exclusion>,
}

impl EvaluationResult {
    pub fn excluded_rows(&self) -> Vec<usize> {
        self.excluded.iter().map(|e| e.row).collect()
    }

    pub fn excluded_by(&self, reason: ExclusionReason) -> Vec<usize> {
        self.excluded
            .iter()
            .filter(|e| e.reason == reason)
            .map(|e| e.row)
            .collect()
    }
}

/// Coefficient of determination.
///
/// With constant ground truth the ratio is undefined; the score is then 1.0
/// for a perfect fit and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len() as f64;
    let mean = y_true.iter().sum::<f64>() / n;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    total / y_true.len() as f64
}

pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    (total / y_true.len() as f64).sqrt()
}

/// Score estimates against ground truth.
///
/// Undefined estimates are reported as [`ExclusionReason::UndefinedEstimate`];
/// use [`evaluate_mapped`] to keep the mapper's finer reasons.
pub fn evaluate(
    ground_truth: &[Option<f64>],
    estimates: &[Option<f64>],
) -> PipelineResult<EvaluationResult> {
    evaluate_with_reasons(ground_truth, estimates, |_| ExclusionReason::UndefinedEstimate)
}

/// Score mapped predictions, attributing undefined estimates to decode
/// failures, unmatched bins or coverage gaps.
pub fn evaluate_mapped(
    ground_truth: &[Option<f64>],
    mapping: &Mapping,
    decode_failures: &[usize],
) -> PipelineResult<EvaluationResult> {
    let failed: HashSet<usize> = decode_failures.iter().copied().collect();
    let unmatched: HashSet<usize> = mapping.unmatched.iter().copied().collect();

    evaluate_with_reasons(ground_truth, &mapping.estimates, |row| {
        if failed.contains(&row) {
            ExclusionReason::DecodeFailure
        } else if unmatched.contains(&row) {
            ExclusionReason::UnmatchedBin
        } else {
            ExclusionReason::UndefinedEstimate
        }
    })
}

fn evaluate_with_reasons<F>(
    ground_truth: &[Option<f64>],
    estimates: &[Option<f64>],
    estimate_reason: F,
) -> PipelineResult<EvaluationResult>
where
    F: Fn(usize) -> ExclusionReason,
{
    if ground_truth.len() != estimates.len() {
        return Err(PipelineError::LengthMismatch {
            ground_truth: ground_truth.len(),
            estimates: estimates.len(),
        });
    }

    let mut y_true = Vec::with_capacity(ground_truth.len());
    let mut y_pred = Vec::with_capacity(estimates.len());
    let mut excluded = Vec::new();

    for (row, (truth, estimate)) in ground_truth.iter().zip(estimates).enumerate() {
        let truth = truth.filter(|t| t.is_finite());
        let estimate = estimate.filter(|e| e.is_finite());
        match (truth, estimate) {
            (Some(t), Some(e)) => {
                y_true.push(t);
                y_pred.push(e);
            }
            (_, None) => excluded.push(Exclusion {
                row,
                reason: estimate_reason(row),
            }),
            (None, Some(_)) => excluded.push(Exclusion {
                row,
                reason: ExclusionReason::MissingGroundTruth,
            }),
        }
    }

    if !excluded.is_empty() {
        let rows: Vec<usize> = excluded.iter().map(|e| e.row).collect();
        log::warn!("Excluded {} row(s) from scoring: {:?}", rows.len(), rows);
    }

    if y_true.is_empty() {
        return Err(PipelineError::InsufficientData {
            total: ground_truth.len(),
        });
    }

    let metrics = RegressionMetrics {
        r2: r2_score(&y_true, &y_pred),
        mae: mean_absolute_error(&y_true, &y_pred),
        rmse: root_mean_squared_error(&y_true, &y_pred),
    };

    Ok(EvaluationResult {
        metrics,
        total_rows: ground_truth.len(),
        scored_rows: y_true.len(),
        excluded,
    })
}
