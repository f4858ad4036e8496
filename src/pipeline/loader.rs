//! Dataset loader for CSV and Parquet files
//!
//! CSV input is decoded before parsing: a byte-order mark wins, valid UTF-8 is
//! taken as-is, anything else is read as Windows-1252 (a superset of Latin-1).

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use polars::prelude::*;

/// Default number of rows used for CSV schema inference
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Pick the text encoding of raw CSV bytes.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

/// Decode a CSV file into UTF-8 text, returning the text and the encoding used.
pub fn read_csv_text(path: &Path) -> Result<(String, &'static Encoding)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let encoding = detect_encoding(&bytes);
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        log::warn!(
            "{}: some bytes could not be decoded as {} and were replaced",
            path.display(),
            used.name()
        );
    }
    if used != UTF_8 {
        log::info!("{}: decoded as {}", path.display(), used.name());
    }
    Ok((text.into_owned(), used))
}

/// Parse CSV text. `None` schema length means a full scan.
fn parse_csv(text: String, schema_length: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(schema_length)
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a dataset from a file (CSV or Parquet based on extension)
///
/// # Arguments
/// * `path` - Input file
/// * `infer_schema_length` - Rows used for CSV type inference; 0 scans the whole file
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = file_extension(path);

    let df = match extension.as_str() {
        "csv" => {
            let (text, _) = read_csv_text(path)?;
            let schema_length = if infer_schema_length == 0 {
                None
            } else {
                Some(infer_schema_length)
            };
            parse_csv(text, schema_length)
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    log::debug!("Loaded {} ({} rows, {} columns)", path.display(), df.height(), df.width());
    Ok(df)
}

/// Load a CSV file with every column kept as text.
///
/// Used for prediction files, where `"07"` and `"7"` must stay distinct.
pub fn load_text_table(path: &Path) -> Result<DataFrame> {
    let (text, _) = read_csv_text(path)?;
    parse_csv(text, Some(0))
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))
}

/// Save dataset to file (CSV or Parquet based on extension), creating parent directories.
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = file_extension(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}
