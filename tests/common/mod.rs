//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Small reaction table with a known yield distribution
///
/// - `Yield`: 1,1,2,2,3,3,4,4 (quartile bins have means 1,2,3,4)
/// - `Description`: free text used by the instruction export
/// - `Catalyst`: text column, not binnable
pub fn create_yield_dataframe() -> DataFrame {
    df! {
        "Yield" => [1.0f64, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0],
        "Description" => ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"],
        "Catalyst" => ["Pd", "Pd", "Ni", "Ni", "Pd", "Cu", "Cu", "Ni"],
    }
    .unwrap()
}

/// Random yields in [0, 100) with an optional fraction of missing values
pub fn create_random_yields(rows: usize, missing_every: Option<usize>, seed: u64) -> Vec<Option<f64>> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);

    (0..rows)
        .map(|i| match missing_every {
            Some(k) if i % k == 0 => None,
            _ => Some(rng.gen_range(0.0..100.0)),
        })
        .collect()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");
    write_csv(df, &csv_path);
    (temp_dir, csv_path)
}

/// Write a DataFrame as CSV, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Write raw text lines to a file, creating parent directories
pub fn write_lines(path: &Path, lines: &[&str]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
}

/// Write model output as JSON lines with `label` and `predict` fields
pub fn write_predictions_jsonl(path: &Path, rows: &[(&str, &str)]) {
    let lines: Vec<String> = rows
        .iter()
        .map(|(label, predict)| serde_json::json!({ "label": label, "predict": predict }).to_string())
        .collect();
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    write_lines(path, &refs);
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Compare floats with an absolute tolerance
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "Expected {} ± {}, got {}",
        expected,
        tol,
        actual
    );
}
