//! Console summaries for binning and evaluation runs

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{EvaluationResult, ExclusionReason, Quantization};

/// Maximum row indices listed per exclusion reason before eliding
const MAX_LISTED_ROWS: usize = 20;

fn print_section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn format_rows(rows: &[usize]) -> String {
    let listed: Vec<String> = rows.iter().take(MAX_LISTED_ROWS).map(|r| r.to_string()).collect();
    if rows.len() > MAX_LISTED_ROWS {
        format!("{}, … (+{} more)", listed.join(", "), rows.len() - MAX_LISTED_ROWS)
    } else {
        listed.join(", ")
    }
}

/// Bin table overview after quantization
#[derive(Debug)]
pub struct BinningSummary<'a> {
    pub column: &'a str,
    pub quantization: &'a Quantization,
}

impl<'a> BinningSummary<'a> {
    pub fn new(column: &'a str, quantization: &'a Quantization) -> Self {
        Self {
            column,
            quantization,
        }
    }

    pub fn display(&self) {
        let q = self.quantization;
        print_section_header("📋", "BIN CLASSIFICATION MAPPING");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Bin").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
            Cell::new("Range").add_attribute(Attribute::Bold),
            Cell::new("Mean Value").add_attribute(Attribute::Bold),
        ]);

        for (bin, mean) in q.table.iter() {
            let count = q.counts[bin];
            let range = match q.bin_range(bin) {
                Some((lo, hi)) => format!("[{:.4}, {:.4}]", lo, hi),
                None => "filled".to_string(),
            };
            let mean_cell = match mean {
                Some(v) => Cell::new(format!("{:.4}", v)),
                None => Cell::new("undefined").fg(Color::Red),
            };
            table.add_row(vec![
                Cell::new(bin).set_alignment(CellAlignment::Right),
                Cell::new(count).fg(if count == 0 { Color::Yellow } else { Color::White }),
                Cell::new(range),
                mean_cell,
            ]);
        }

        print_indented(&table);

        println!();
        println!(
            "      Column {}: {} of {} bins populated, {} row(s) without a value",
            style(self.column).cyan(),
            style(q.populated_bins()).yellow().bold(),
            q.num_bins(),
            style(q.missing_rows).yellow()
        );
    }
}

/// Metrics and exclusion report after evaluation
#[derive(Debug)]
pub struct EvaluationSummary<'a> {
    pub split: &'a str,
    pub result: &'a EvaluationResult,
}

impl<'a> EvaluationSummary<'a> {
    pub fn new(split: &'a str, result: &'a EvaluationResult) -> Self {
        Self { split, result }
    }

    pub fn display(&self) {
        let r = self.result;
        print_section_header("📈", &format!("{} SET RESULTS", self.split.to_uppercase()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let r2_color = if r.metrics.r2 >= 0.8 {
            Color::Green
        } else if r.metrics.r2 >= 0.5 {
            Color::Yellow
        } else {
            Color::Red
        };

        table.add_row(vec![
            Cell::new("R²"),
            Cell::new(format!("{:.6}", r.metrics.r2))
                .fg(r2_color)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![Cell::new("MAE"), Cell::new(format!("{:.6}", r.metrics.mae))]);
        table.add_row(vec![Cell::new("RMSE"), Cell::new(format!("{:.6}", r.metrics.rmse))]);
        table.add_row(vec![
            Cell::new("Scored Rows"),
            Cell::new(format!("{} / {}", r.scored_rows, r.total_rows)),
        ]);

        print_indented(&table);

        if r.excluded.is_empty() {
            return;
        }

        print_section_header("📝", "EXCLUDED ROWS");
        for reason in [
            ExclusionReason::DecodeFailure,
            ExclusionReason::UnmatchedBin,
            ExclusionReason::UndefinedEstimate,
            ExclusionReason::MissingGroundTruth,
        ] {
            let rows = r.excluded_by(reason);
            if rows.is_empty() {
                continue;
            }
            println!(
                "      {} {}:",
                style(reason).yellow(),
                style(format!("({})", rows.len())).dim()
            );
            println!("        {} {}", style("•").dim(), format_rows(&rows));
        }
    }
}
