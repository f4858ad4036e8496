//! yieldbin: quantile binning and bin-index evaluation CLI
//!
//! Each subcommand runs one stage of the pipeline against a case's files.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;
use env_logger::Env;

use yieldbin::cli::{
    run_bin, run_decode, run_evaluate, run_export, run_map, Cli, Commands, EvaluateTargets,
};
use yieldbin::utils::{print_banner, print_completion, print_config};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let case = cli.command.case_args();
    let config = case.config()?;
    let paths = case.paths(&config);
    log::debug!("Resolved artifact paths: {:?}", paths);

    print_banner(env!("CARGO_PKG_VERSION"));
    let start = Instant::now();

    match &cli.command {
        Commands::Bin {
            input,
            binned_output,
            table_output,
            infer_schema_length,
            ..
        } => {
            let input = input.as_deref().unwrap_or(&paths.raw_data);
            print_config(&config, input);
            run_bin(
                &config,
                input,
                binned_output.as_deref().unwrap_or(&paths.binned_rows),
                table_output.as_deref().unwrap_or(&paths.bin_table),
                *infer_schema_length,
            )?;
        }
        Commands::Map {
            input,
            bin_table,
            output,
            ..
        } => {
            let input = input.as_deref().unwrap_or(&paths.binned_rows);
            print_config(&config, input);
            run_map(
                input,
                bin_table.as_deref().unwrap_or(&paths.bin_table),
                output.as_deref().unwrap_or(&paths.mapped_rows),
            )?;
        }
        Commands::Decode {
            predictions,
            output,
            ..
        } => {
            print_config(&config, predictions);
            run_decode(
                predictions,
                output.as_deref().unwrap_or(&paths.decoded_predictions),
            )?;
        }
        Commands::Evaluate {
            predictions,
            ground_truth,
            bin_table,
            decoded_output,
            mapped_output,
            report,
            no_report,
            ..
        } => {
            print_config(&config, predictions);
            let report = report.as_deref().unwrap_or(&paths.evaluation_report);
            run_evaluate(
                &config,
                EvaluateTargets {
                    predictions,
                    ground_truth: ground_truth.as_deref().unwrap_or(&paths.split_set),
                    bin_table: bin_table.as_deref().unwrap_or(&paths.bin_table),
                    decoded_output: decoded_output.as_deref().unwrap_or(&paths.decoded_predictions),
                    mapped_output: mapped_output.as_deref().unwrap_or(&paths.mapped_predictions),
                    report: (!no_report).then_some(report),
                },
            )?;
        }
        Commands::Export {
            input,
            output,
            reaction_type,
            template,
            output_column,
            ..
        } => {
            let input = input.as_deref().unwrap_or(&paths.described_set);
            print_config(&config, input);
            run_export(
                &config,
                input,
                output.as_deref().unwrap_or(&paths.instruction_json),
                reaction_type.as_deref(),
                template.as_deref(),
                output_column,
            )?;
        }
    }

    print_completion(&format!(
        "Done in {}",
        style(format!("{:.2}s", start.elapsed().as_secs_f64())).dim()
    ));

    Ok(())
}
