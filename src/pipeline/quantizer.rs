//! Quantile (equal-frequency) binning of a continuous column
//!
//! Edges are the `num_bins + 1` quantiles of the non-missing values, with
//! linear interpolation between order statistics. Duplicate edges are dropped,
//! so degenerate columns produce fewer populated bins than requested.
//!
//! Boundary policy: intervals are right-closed `(e_i, e_{i+1}]` and the first
//! interval also includes its lower edge. A value equal to an interior edge
//! belongs to the lower bin, and equal values always share a bin.
//!
//! The resulting `BinTable` has an entry for every index in `[0, num_bins)`.
//! Empty bins are forward-filled from the nearest lower bin with a value.

use std::fmt;
use std::ops::Range;

use polars::prelude::*;
use serde::Serialize;

use super::config::MAX_NUM_BINS;
use super::error::{PipelineError, PipelineResult};
use super::missing::{numeric_column, require_column};

/// Name of the bin index column in binned rows and in the bin table
pub const BIN_COLUMN: &str = "bins";

/// Name of the representative value column in the bin table
pub const MEAN_VALUE_COLUMN: &str = "mean_value";

/// Leading bins that have no value even after forward fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageGap {
    pub undefined: Range<usize>,
}

impl fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.undefined.len() == 1 {
            write!(f, "bin {} has no value and no lower bin to fill from", self.undefined.start)
        } else {
            write!(
                f,
                "bins {}..={} have no value and no lower bin to fill from",
                self.undefined.start,
                self.undefined.end - 1
            )
        }
    }
}

/// Complete bin index -> mean value lookup
///
/// Index `i` of the table is bin `i`. Only a leading run of entries can be
/// `None`; see [`BinTable::coverage_gap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinTable {
    values: Vec<Option<f64>>,
}

impl BinTable {
    /// Build a table from per-bin means, forward-filling empty bins.
    pub fn from_bin_means(means: &[Option<f64>]) -> Self {
        Self {
            values: forward_fill(means),
        }
    }

    pub fn num_bins(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, bin: usize) -> bool {
        bin < self.values.len()
    }

    /// Mean value of a bin; `None` when out of range or undefined.
    pub fn get(&self, bin: usize) -> Option<f64> {
        self.values.get(bin).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<f64>)> + '_ {
        self.values.iter().copied().enumerate()
    }

    pub fn coverage_gap(&self) -> Option<CoverageGap> {
        let leading = self.values.iter().take_while(|v| v.is_none()).count();
        if leading == 0 {
            None
        } else {
            Some(CoverageGap {
                undefined: 0..leading,
            })
        }
    }

    /// Two-column `bins`/`mean_value` frame for persisting.
    pub fn to_dataframe(&self) -> PipelineResult<DataFrame> {
        let bins: Vec<i64> = (0..self.values.len() as i64).collect();
        let df = DataFrame::new(vec![
            Column::new(BIN_COLUMN.into(), bins),
            Column::new(MEAN_VALUE_COLUMN.into(), self.values.clone()),
        ])?;
        Ok(df)
    }

    /// Read a persisted table back, validating the layout.
    ///
    /// The frame must have exactly the `bins` and `mean_value` columns, integer
    /// `bins` that are unique and cover `0..n` contiguously (any row order), and
    /// no missing `mean_value` except a leading gap.
    pub fn from_dataframe(df: &DataFrame) -> PipelineResult<Self> {
        let bins_col = require_column(df, BIN_COLUMN)?;
        require_column(df, MEAN_VALUE_COLUMN)?;

        if df.width() != 2 {
            return Err(PipelineError::InvalidBinTable(format!(
                "expected exactly the '{}' and '{}' columns, found {:?}",
                BIN_COLUMN,
                MEAN_VALUE_COLUMN,
                df.get_column_names()
            )));
        }
        if df.height() == 0 {
            return Err(PipelineError::InvalidBinTable("table has no rows".to_string()));
        }
        if !bins_col.dtype().is_integer() {
            return Err(PipelineError::InvalidBinTable(format!(
                "'{}' must be an integer column, found {}",
                BIN_COLUMN,
                bins_col.dtype()
            )));
        }

        let bins: Vec<Option<i64>> = bins_col.cast(&DataType::Int64)?.i64()?.into_iter().collect();
        let (means, _) = numeric_column(df, MEAN_VALUE_COLUMN)?;

        let n = bins.len();
        let mut slots: Vec<Option<Option<f64>>> = vec![None; n];
        for (row, (bin, mean)) in bins.iter().zip(means).enumerate() {
            let bin = bin.ok_or_else(|| {
                PipelineError::InvalidBinTable(format!("row {} has no bin index", row))
            })?;
            let idx = usize::try_from(bin)
                .ok()
                .filter(|&i| i < n)
                .ok_or_else(|| {
                    PipelineError::InvalidBinTable(format!(
                        "bin {} is outside 0..{} (bins must be contiguous)",
                        bin, n
                    ))
                })?;
            if slots[idx].is_some() {
                return Err(PipelineError::InvalidBinTable(format!("bin {} appears twice", bin)));
            }
            slots[idx] = Some(mean);
        }

        // n unique in-range indices fill every slot
        let values: Vec<Option<f64>> = slots.into_iter().map(|s| s.flatten()).collect();

        let leading = values.iter().take_while(|v| v.is_none()).count();
        if let Some(hole) = values[leading..].iter().position(|v| v.is_none()) {
            return Err(PipelineError::InvalidBinTable(format!(
                "bin {} has no mean_value",
                leading + hole
            )));
        }

        Ok(Self { values })
    }
}

/// Fill every `None` with the nearest preceding defined value.
///
/// Leading `None`s have nothing to fill from and stay `None`.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Linear-interpolated quantile of sorted, non-empty data
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let pos = q * (n - 1) as f64;
    let lo = (pos.floor() as usize).min(n - 1);
    let frac = pos - lo as f64;
    if lo + 1 < n && frac > 0.0 {
        sorted[lo] + (sorted[lo + 1] - sorted[lo]) * frac
    } else {
        sorted[lo]
    }
}

/// Quantile bin edges with duplicates dropped.
///
/// `sorted` must be ascending and non-empty. Returns between 1 and
/// `num_bins + 1` strictly increasing edges.
pub fn quantile_edges(sorted: &[f64], num_bins: usize) -> Vec<f64> {
    let mut edges: Vec<f64> = (0..=num_bins)
        .map(|i| quantile_sorted(sorted, i as f64 / num_bins as f64))
        .collect();
    edges.dedup();
    edges
}

/// Bin of a single value under the right-closed boundary policy.
///
/// Values outside the edge range are clamped to the first or last bin. With a
/// single edge (one distinct value) everything is bin 0.
pub fn assign_bin(value: f64, edges: &[f64]) -> usize {
    if edges.len() < 2 {
        return 0;
    }
    let last_bin = edges.len() - 2;
    edges[1..].partition_point(|e| *e < value).min(last_bin)
}

/// Bins for a column; missing values stay unassigned.
pub fn assign_bins(values: &[Option<f64>], edges: &[f64]) -> Vec<Option<usize>> {
    values
        .iter()
        .map(|v| v.map(|x| assign_bin(x, edges)))
        .collect()
}

/// Output of [`build_bins`]
#[derive(Debug, Clone)]
pub struct Quantization {
    /// Bin per input row, `None` where the input was missing
    pub assignments: Vec<Option<usize>>,
    /// Deduplicated edges; `edges.len() - 1` bins are populated by construction
    pub edges: Vec<f64>,
    /// Rows per bin, one entry per requested bin
    pub counts: Vec<usize>,
    pub table: BinTable,
    pub missing_rows: usize,
}

impl Quantization {
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn populated_bins(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Value range `[lower, upper]` covered by a bin, if it is populated.
    pub fn bin_range(&self, bin: usize) -> Option<(f64, f64)> {
        if self.counts.get(bin).copied().unwrap_or(0) == 0 {
            return None;
        }
        if self.edges.len() < 2 {
            return self.edges.first().map(|&e| (e, e));
        }
        Some((self.edges[bin], self.edges[bin + 1]))
    }
}

/// Quantile-bin a column and build its complete bin table.
///
/// NaN and infinite values are treated as missing: they get no bin and are
/// counted in `missing_rows`.
pub fn build_bins(values: &[Option<f64>], num_bins: usize) -> PipelineResult<Quantization> {
    if num_bins == 0 || num_bins > MAX_NUM_BINS {
        return Err(PipelineError::InvalidBinCount(num_bins));
    }

    let values: Vec<Option<f64>> = values.iter().map(|v| v.filter(|x| x.is_finite())).collect();
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return Err(PipelineError::EmptyColumn("<values>".to_string()));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let edges = quantile_edges(&sorted, num_bins);
    let assignments = assign_bins(&values, &edges);

    let mut counts = vec![0usize; num_bins];
    let mut sums = vec![0.0f64; num_bins];
    for (bin, value) in assignments.iter().zip(&values) {
        if let (Some(bin), Some(value)) = (bin, value) {
            counts[*bin] += 1;
            sums[*bin] += value;
        }
    }

    let means: Vec<Option<f64>> = counts
        .iter()
        .zip(&sums)
        .map(|(&c, &s)| if c > 0 { Some(s / c as f64) } else { None })
        .collect();

    let table = BinTable::from_bin_means(&means);
    let missing_rows = values.len() - sorted.len();

    Ok(Quantization {
        assignments,
        edges,
        counts,
        table,
        missing_rows,
    })
}

/// Bin a named column of a table.
///
/// Returns a copy of the table with a `bins` column (replacing any existing
/// one) together with the quantization. Missing values get a null bin and a
/// warning; a coverage gap is logged as a warning.
pub fn quantize_column(
    df: &DataFrame,
    column: &str,
    num_bins: usize,
) -> PipelineResult<(DataFrame, Quantization)> {
    let (values, missing) = numeric_column(df, column)?;

    let quantization = build_bins(&values, num_bins).map_err(|e| match e {
        PipelineError::EmptyColumn(_) => PipelineError::EmptyColumn(column.to_string()),
        other => other,
    })?;

    if missing.missing > 0 {
        log::warn!(
            "Column '{}': {} of {} row(s) are missing and were left without a bin",
            column,
            missing.missing,
            missing.total
        );
    }
    if quantization.populated_bins() < num_bins {
        log::info!(
            "Column '{}': {} of {} bins populated; empty bins forward-filled",
            column,
            quantization.populated_bins(),
            num_bins
        );
    }
    if let Some(gap) = quantization.table.coverage_gap() {
        log::warn!("Column '{}': {}", column, gap);
    }

    let bins: Vec<Option<i64>> = quantization
        .assignments
        .iter()
        .map(|b| b.map(|b| b as i64))
        .collect();

    let mut binned = df.clone();
    binned.with_column(Column::new(BIN_COLUMN.into(), bins))?;

    Ok((binned, quantization))
}
