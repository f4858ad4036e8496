//! Stage runners for the bin, map, decode and evaluate subcommands

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::{
    decode_records, decoded_from_dataframe, decoded_to_dataframe, evaluate_mapped,
    lenient_numeric_column, load_dataset, load_text_table, map_binned_rows, map_predictions,
    mapped_predictions_frame, quantize_column, read_prediction_records, save_dataset, BinTable,
    DecodedPrediction, EvaluationResult, Mapping, MissingSummary, PipelineConfig, Quantization,
    DEFAULT_INFER_SCHEMA_LENGTH,
};
use crate::report::{export_evaluation, BinningSummary, EvaluationSummary, ExportParams};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_count, print_info,
    print_step_header, print_success, print_warning,
};

/// Load a persisted `bins`/`mean_value` table
pub fn load_bin_table(path: &Path) -> Result<BinTable> {
    let df = load_dataset(path, DEFAULT_INFER_SCHEMA_LENGTH)?;
    let table = BinTable::from_dataframe(&df)
        .with_context(|| format!("Invalid bin table: {}", path.display()))?;
    Ok(table)
}

/// Ground-truth column of a split.
///
/// Types are inferred from every row, so a text cell past the usual inference
/// window turns into a missing value instead of failing the parse.
pub fn load_ground_truth(path: &Path, column: &str) -> Result<(Vec<Option<f64>>, MissingSummary)> {
    let df = load_dataset(path, 0)?;
    let (values, missing) = lenient_numeric_column(&df, column)
        .with_context(|| format!("Invalid ground truth: {}", path.display()))?;
    Ok((values, missing))
}

/// Quantile-bin the configured column and persist both artifacts
///
/// # Arguments
/// * `config` - Case configuration (column and bin count)
/// * `input` - Raw dataset, CSV or Parquet
/// * `binned_output` - Destination for the rows plus their `bins` column
/// * `table_output` - Destination for the `bins`/`mean_value` table
/// * `infer_schema_length` - CSV schema inference rows, 0 for a full scan
pub fn run_bin(
    config: &PipelineConfig,
    input: &Path,
    binned_output: &Path,
    table_output: &Path,
    infer_schema_length: usize,
) -> Result<Quantization> {
    print_step_header(1, "Load Dataset");
    let spinner = create_spinner("Loading dataset...");
    let df = load_dataset(input, infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");
    print_count("row(s)", df.height(), Some(&format!("({} columns)", df.width())));

    print_step_header(2, "Quantile Binning");
    let spinner = create_spinner(&format!("Binning '{}'...", config.column_name));
    let (mut binned, quantization) = quantize_column(&df, &config.column_name, config.num_bins)?;
    if let Some(gap) = quantization.table.coverage_gap() {
        finish_with_warning(&spinner, "Binning complete with undefined bins");
        print_warning(&gap.to_string());
    } else {
        finish_with_success(&spinner, "Binning complete");
    }
    if quantization.missing_rows > 0 {
        print_warning(&format!(
            "{} row(s) had no value and were left without a bin",
            quantization.missing_rows
        ));
    }

    BinningSummary::new(&config.column_name, &quantization).display();

    print_step_header(3, "Save Artifacts");
    save_dataset(&mut binned, binned_output)?;
    print_success(&format!("Binned rows written to {}", binned_output.display()));

    let mut table = quantization.table.to_dataframe()?;
    save_dataset(&mut table, table_output)?;
    print_success(&format!("Bin table written to {}", table_output.display()));

    Ok(quantization)
}

/// Attach bin means to binned rows
pub fn run_map(input: &Path, bin_table: &Path, output: &Path) -> Result<Mapping> {
    print_step_header(1, "Load Artifacts");
    let df = load_dataset(input, DEFAULT_INFER_SCHEMA_LENGTH)?;
    let table = load_bin_table(bin_table)?;
    print_count("binned row(s)", df.height(), None);
    print_count("bin(s)", table.num_bins(), None);

    print_step_header(2, "Map Bins to Mean Values");
    let (mut mapped, mapping) = map_binned_rows(&df, &table)?;
    if mapping.is_fully_matched() {
        print_success("Every row matched a bin");
    } else {
        print_warning(&format!(
            "{} row(s) did not match a bin",
            mapping.unmatched.len()
        ));
    }

    save_dataset(&mut mapped, output)?;
    print_success(&format!("Mapped rows written to {}", output.display()));

    Ok(mapping)
}

/// Read raw model output, from JSON lines or an already decoded CSV.
///
/// Returns the decoded rows and whether they came from raw model output.
fn read_decoded(predictions: &Path) -> Result<(Vec<DecodedPrediction>, bool)> {
    let is_csv = predictions
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let df = load_text_table(predictions)?;
        let decoded = decoded_from_dataframe(&df)
            .with_context(|| format!("Invalid decoded predictions: {}", predictions.display()))?;
        Ok((decoded, false))
    } else {
        let records = read_prediction_records(predictions)?;
        Ok((decode_records(&records), true))
    }
}

/// Decode raw predictions into bin labels and save them as CSV
pub fn run_decode(predictions: &Path, output: &Path) -> Result<Vec<DecodedPrediction>> {
    print_step_header(1, "Decode Predictions");
    let spinner = create_spinner("Decoding model output...");
    let records = read_prediction_records(predictions)?;
    let decoded = decode_records(&records);
    finish_with_success(&spinner, "Predictions decoded");

    let failures = decoded.iter().filter(|d| d.is_decode_failure()).count();
    print_count("prediction(s)", decoded.len(), None);
    if failures > 0 {
        print_warning(&format!("{} prediction(s) contained no digits", failures));
    }

    let mut df = decoded_to_dataframe(&decoded)?;
    save_dataset(&mut df, output)?;
    print_success(&format!("Decoded predictions written to {}", output.display()));

    Ok(decoded)
}

/// Files read and written by an evaluation run
#[derive(Debug, Clone, Copy)]
pub struct EvaluateTargets<'a> {
    pub predictions: &'a Path,
    pub ground_truth: &'a Path,
    pub bin_table: &'a Path,
    /// Written only when `predictions` is raw model output
    pub decoded_output: &'a Path,
    pub mapped_output: &'a Path,
    /// Evaluation JSON; `None` skips the export
    pub report: Option<&'a Path>,
}

/// Decode, map and score predictions for one split
pub fn run_evaluate(config: &PipelineConfig, targets: EvaluateTargets<'_>) -> Result<EvaluationResult> {
    print_step_header(1, "Decode Predictions");
    let (decoded, from_raw) = read_decoded(targets.predictions)?;
    print_count("prediction(s)", decoded.len(), None);
    if from_raw {
        let mut df = decoded_to_dataframe(&decoded)?;
        save_dataset(&mut df, targets.decoded_output)?;
        print_success(&format!(
            "Decoded predictions written to {}",
            targets.decoded_output.display()
        ));
    } else {
        print_info("Predictions already decoded");
    }

    print_step_header(2, "Map Predictions to Mean Values");
    let table = load_bin_table(targets.bin_table)?;
    let mapped = map_predictions(&decoded, &table);
    let mut frame = mapped_predictions_frame(&decoded, &mapped.mapping)?;
    save_dataset(&mut frame, targets.mapped_output)?;
    print_count(
        "prediction(s) matched a bin",
        mapped.mapping.matched_count(),
        Some(&format!("(of {})", mapped.mapping.len())),
    );
    print_success(&format!(
        "Mapped predictions written to {}",
        targets.mapped_output.display()
    ));

    print_step_header(3, "Score Against Ground Truth");
    let (ground_truth, missing) = load_ground_truth(targets.ground_truth, &config.column_name)?;
    if missing.missing > 0 {
        print_warning(&format!(
            "{} ground-truth value(s) missing or unparsable in '{}' ({:.1}%)",
            missing.missing,
            config.column_name,
            missing.ratio() * 100.0
        ));
    }

    let result = evaluate_mapped(&ground_truth, &mapped.mapping, &mapped.decode_failures)?;
    EvaluationSummary::new(&config.input_type.to_string(), &result).display();

    if let Some(report) = targets.report {
        export_evaluation(
            &result,
            report,
            &ExportParams {
                config,
                ground_truth_file: targets.ground_truth,
                predictions_file: targets.predictions,
                bin_table_file: targets.bin_table,
            },
        )?;
        println!();
        println!(
            "    {} Evaluation saved to {}",
            style("✓").green().bold(),
            style(report.display()).dim()
        );
    }

    Ok(result)
}
