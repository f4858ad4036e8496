//! Tests for quantile binning and bin table construction

use yieldbin::pipeline::{
    build_bins, quantize_column, BinTable, PipelineError, BIN_COLUMN,
};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_quartiles_of_paired_values() {
    let df = common::create_yield_dataframe();
    let (binned, q) = quantize_column(&df, "Yield", 4).unwrap();

    let bins: Vec<Option<i64>> = binned.column(BIN_COLUMN).unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(
        bins,
        vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2), Some(3), Some(3)]
    );
    assert_eq!(q.table.values(), &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
    assert_eq!(q.populated_bins(), 4);
    assert_eq!(q.missing_rows, 0);
}

#[test]
fn test_every_row_lands_in_a_table_bin() {
    let mut rng = StdRng::seed_from_u64(7);

    for seed in 0..20u64 {
        let values = common::create_random_yields(200, Some(17), seed);
        let num_bins = rng.gen_range(1..=60);
        let q = build_bins(&values, num_bins).unwrap();

        assert_eq!(q.table.num_bins(), num_bins);
        assert!(q.table.coverage_gap().is_none(), "bin 0 always holds the minimum");

        for (value, bin) in values.iter().zip(&q.assignments) {
            match (value, bin) {
                (Some(_), Some(b)) => {
                    assert!(*b < num_bins);
                    assert!(q.table.get(*b).is_some());
                }
                (None, None) => {}
                other => panic!("value and bin disagree: {:?}", other),
            }
        }
    }
}

#[test]
fn test_bin_means_are_non_decreasing() {
    let values = common::create_random_yields(500, None, 42);
    let q = build_bins(&values, 25).unwrap();

    let means: Vec<f64> = q.table.values().iter().map(|v| v.unwrap()).collect();
    for pair in means.windows(2) {
        assert!(pair[0] <= pair[1], "means out of order: {:?}", pair);
    }
}

#[test]
fn test_binning_is_deterministic() {
    let values = common::create_random_yields(300, Some(11), 3);
    let first = build_bins(&values, 30).unwrap();
    let second = build_bins(&values, 30).unwrap();

    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.table, second.table);
}

#[test]
fn test_more_bins_than_distinct_values() {
    let df = df! { "Yield" => [5.0f64, 5.0, 5.0, 9.0] }.unwrap();
    let (_, q) = quantize_column(&df, "Yield", 10).unwrap();

    assert_eq!(q.table.num_bins(), 10);
    assert!(q.populated_bins() < 10);
    // Empty upper bins carry the last populated mean
    assert_eq!(q.table.get(9), q.table.get(q.assignments[3].unwrap()));
}

#[test]
fn test_missing_values_get_no_bin() {
    let df = df! { "Yield" => [Some(1.0f64), None, Some(3.0), Some(f64::NAN)] }.unwrap();
    let (binned, q) = quantize_column(&df, "Yield", 2).unwrap();

    assert_eq!(q.missing_rows, 2);
    let bins = binned.column(BIN_COLUMN).unwrap();
    assert_eq!(bins.null_count(), 2);
}

#[test]
fn test_quantize_errors() {
    let df = common::create_yield_dataframe();

    assert!(matches!(
        quantize_column(&df, "ee", 4),
        Err(PipelineError::Schema { .. })
    ));
    assert!(matches!(
        quantize_column(&df, "Catalyst", 4),
        Err(PipelineError::NonNumericColumn { .. })
    ));
    assert!(matches!(
        quantize_column(&df, "Yield", 0),
        Err(PipelineError::InvalidBinCount(0))
    ));

    let empty = df! { "Yield" => [None::<f64>, None] }.unwrap();
    match quantize_column(&empty, "Yield", 4) {
        Err(PipelineError::EmptyColumn(column)) => assert_eq!(column, "Yield"),
        other => panic!("expected EmptyColumn, got {:?}", other.map(|(_, q)| q.edges)),
    }
}

#[test]
fn test_bin_table_survives_csv() {
    let values = common::create_random_yields(100, None, 9);
    let q = build_bins(&values, 12).unwrap();

    let mut table_df = q.table.to_dataframe().unwrap();
    let (_dir, path) = common::create_temp_csv(&mut table_df);
    let loaded = yieldbin::pipeline::load_dataset(&path, 100).unwrap();
    let table = BinTable::from_dataframe(&loaded).unwrap();

    assert_eq!(table.num_bins(), 12);
    for (bin, mean) in q.table.iter() {
        common::assert_close(table.get(bin).unwrap(), mean.unwrap(), 1e-9);
    }
}

#[test]
fn test_bin_table_rejects_bad_layouts() {
    let shuffled = df! {
        "bins" => [2i64, 0, 1],
        "mean_value" => [3.0f64, 1.0, 2.0],
    }
    .unwrap();
    let table = BinTable::from_dataframe(&shuffled).unwrap();
    assert_eq!(table.values(), &[Some(1.0), Some(2.0), Some(3.0)]);

    let hole = df! {
        "bins" => [0i64, 2],
        "mean_value" => [1.0f64, 3.0],
    }
    .unwrap();
    assert!(matches!(
        BinTable::from_dataframe(&hole),
        Err(PipelineError::InvalidBinTable(_))
    ));

    let duplicate = df! {
        "bins" => [0i64, 0],
        "mean_value" => [1.0f64, 1.0],
    }
    .unwrap();
    assert!(matches!(
        BinTable::from_dataframe(&duplicate),
        Err(PipelineError::InvalidBinTable(_))
    ));

    let interior_null = df! {
        "bins" => [0i64, 1, 2],
        "mean_value" => [Some(1.0f64), None, Some(3.0)],
    }
    .unwrap();
    assert!(matches!(
        BinTable::from_dataframe(&interior_null),
        Err(PipelineError::InvalidBinTable(_))
    ));

    let leading_null = df! {
        "bins" => [0i64, 1],
        "mean_value" => [None, Some(2.0f64)],
    }
    .unwrap();
    let table = BinTable::from_dataframe(&leading_null).unwrap();
    assert_eq!(table.coverage_gap().unwrap().undefined, 0..1);
}
