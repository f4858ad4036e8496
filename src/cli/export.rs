//! Described split to instruction JSON conversion

use std::path::Path;

use anyhow::{anyhow, Result};
use console::style;

use crate::pipeline::{build_instruction_records, load_text_table, write_instruction_records, PipelineConfig};
use crate::utils::create_spinner;

/// Build the instruction dataset for one split
///
/// # Arguments
/// * `config` - Case configuration; its preset supplies defaults for the
///   reaction type and template
/// * `input` - Described split (CSV)
/// * `output` - Destination JSON file
/// * `reaction_type` - Overrides the preset's reaction type
/// * `template` - Overrides the preset's description template
/// * `output_column` - Column whose value becomes each record's output
///
/// Returns the number of records written.
pub fn run_export(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    reaction_type: Option<&str>,
    template: Option<&str>,
    output_column: &str,
) -> Result<usize> {
    let preset = config.preset();
    let reaction_type = reaction_type
        .or(preset.map(|p| p.reaction_type))
        .ok_or_else(|| anyhow!("Case '{}' has no preset; pass --reaction-type", config.case_id))?;
    let template = template
        .or(preset.map(|p| p.description_template))
        .ok_or_else(|| anyhow!("Case '{}' has no preset; pass --template", config.case_id))?;

    println!(
        "\n {} Building instruction dataset",
        style("◆").cyan().bold()
    );
    println!("   Input:  {}", style(input.display()).dim());
    println!("   Output: {}", style(output.display()).dim());
    println!();

    // All-text load keeps cell values exactly as the describer wrote them
    let spinner = create_spinner("Reading described split...");
    let df = load_text_table(input)?;
    spinner.finish_with_message(format!(
        "{} Split loaded ({} rows)",
        style("✓").green(),
        df.height()
    ));

    let spinner = create_spinner("Rendering instructions...");
    let records = build_instruction_records(&df, reaction_type, template, output_column)?;
    write_instruction_records(&records, output)?;
    spinner.finish_with_message(format!("{} Instructions written", style("✓").green()));

    println!();
    println!(
        "   {} record(s) for a {} reaction",
        style(records.len()).yellow(),
        style(reaction_type).cyan()
    );
    println!();
    println!(" {} Export complete!", style("✓").green().bold());

    Ok(records.len())
}
