//! Tests for CLI argument parsing and the compiled binary

use assert_cmd::Command;
use clap::Parser;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use yieldbin::cli::{Cli, Commands};
use yieldbin::pipeline::InputType;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_cli_default_values() {
    let cli = Cli::parse_from(["yieldbin", "bin"]);
    let case = cli.command.case_args();

    assert_eq!(case.case, "case1");
    assert_eq!(case.num_bins, 100, "Default bin count should be 100");
    assert_eq!(case.input_type, InputType::Test);
    assert_eq!(case.data_dir, PathBuf::from("data"));
    assert_eq!(case.log_dir, PathBuf::from("log"));
    assert!(case.column.is_none());

    match cli.command {
        Commands::Bin {
            input,
            infer_schema_length,
            ..
        } => {
            assert!(input.is_none());
            assert_eq!(infer_schema_length, 10000);
        }
        other => panic!("expected bin, got {:?}", other),
    }
}

#[test]
fn test_cli_case_options() {
    let cli = Cli::parse_from([
        "yieldbin",
        "evaluate",
        "--case",
        "case3",
        "--input-type",
        "train",
        "-n",
        "50",
        "-p",
        "preds.jsonl",
        "--no-report",
    ]);

    let config = cli.command.case_args().config().unwrap();
    assert_eq!(config.column_name, "output");
    assert_eq!(config.num_bins, 50);
    assert_eq!(config.input_type, InputType::Train);

    match cli.command {
        Commands::Evaluate {
            predictions,
            no_report,
            ..
        } => {
            assert_eq!(predictions, PathBuf::from("preds.jsonl"));
            assert!(no_report);
        }
        other => panic!("expected evaluate, got {:?}", other),
    }
}

#[test]
fn test_cli_rejects_zero_bins() {
    let result = Cli::try_parse_from(["yieldbin", "bin", "--num-bins", "0"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_rejects_oversized_bin_count() {
    assert!(Cli::try_parse_from(["yieldbin", "bin", "--num-bins", "1000000000000"]).is_err());
    assert!(Cli::try_parse_from(["yieldbin", "bin", "--num-bins", "100001"]).is_err());
    assert!(Cli::try_parse_from(["yieldbin", "bin", "--num-bins", "100000"]).is_ok());
}

#[test]
fn test_evaluate_decoded_output_override() {
    let cli = Cli::parse_from([
        "yieldbin",
        "evaluate",
        "-p",
        "preds.jsonl",
        "--decoded-output",
        "runs/decoded.csv",
    ]);
    match cli.command {
        Commands::Evaluate { decoded_output, .. } => {
            assert_eq!(decoded_output, Some(PathBuf::from("runs/decoded.csv")));
        }
        other => panic!("expected evaluate, got {:?}", other),
    }

    let cli = Cli::parse_from(["yieldbin", "evaluate", "-p", "preds.jsonl"]);
    match cli.command {
        Commands::Evaluate { decoded_output, .. } => assert!(decoded_output.is_none()),
        other => panic!("expected evaluate, got {:?}", other),
    }
}

#[test]
fn test_cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["yieldbin"]).is_err());
}

#[test]
fn test_export_defaults_to_bins_output() {
    let cli = Cli::parse_from(["yieldbin", "export", "--case", "2"]);
    match cli.command {
        Commands::Export {
            output_column,
            reaction_type,
            template,
            ..
        } => {
            assert_eq!(output_column, "bins");
            assert!(reaction_type.is_none());
            assert!(template.is_none());
        }
        other => panic!("expected export, got {:?}", other),
    }
}

#[test]
fn test_binary_bins_and_evaluates_a_case() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let log_dir = temp_dir.path().join("log");

    let mut raw = common::create_yield_dataframe();
    common::write_csv(&mut raw, &data_dir.join("case1").join("case1.csv"));
    common::write_lines(
        &data_dir.join("case1").join("case1_test_set.csv"),
        &["Yield", "1", "4"],
    );

    Command::cargo_bin("yieldbin")
        .unwrap()
        .args(["bin", "-n", "4", "--data-dir"])
        .arg(&data_dir)
        .arg("--log-dir")
        .arg(&log_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("BIN CLASSIFICATION MAPPING"));

    assert!(data_dir.join("case1").join("case1_bin_mapping.csv").exists());

    let predictions = temp_dir.path().join("generated_predictions.jsonl");
    common::write_predictions_jsonl(&predictions, &[("0", "0"), ("3", "bin 3")]);

    Command::cargo_bin("yieldbin")
        .unwrap()
        .args(["evaluate", "-n", "4", "--data-dir"])
        .arg(&data_dir)
        .arg("--log-dir")
        .arg(&log_dir)
        .arg("--predictions")
        .arg(&predictions)
        .assert()
        .success()
        .stdout(predicate::str::contains("TEST SET RESULTS"));

    assert!(log_dir.join("case1").join("evaluation_test_case1.json").exists());
    assert!(log_dir.join("output_with_mean_values_case1.csv").exists());
}

#[test]
fn test_binary_reports_missing_column() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    common::write_lines(&data_dir.join("case1").join("case1.csv"), &["Conversion", "1", "2"]);

    Command::cargo_bin("yieldbin")
        .unwrap()
        .args(["bin", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Column 'Yield' not found"));
}

#[test]
fn test_binary_unknown_case_needs_column() {
    Command::cargo_bin("yieldbin")
        .unwrap()
        .args(["bin", "--case", "suzuki"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown case 'suzuki'"));
}
