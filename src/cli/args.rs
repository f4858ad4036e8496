//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::{
    ArtifactPaths, InputType, PipelineConfig, PipelineResult, DEFAULT_NUM_BINS, MAX_NUM_BINS,
};

/// yieldbin - Quantile-bin continuous outcomes and score bin-index predictions
#[derive(Parser, Debug)]
#[command(name = "yieldbin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every stage
#[derive(Args, Debug, Clone)]
pub struct CaseArgs {
    /// Case identifier. Known cases (case1, case2, case3) supply their own
    /// column, reaction type and description template.
    #[arg(short, long, default_value = "case1")]
    pub case: String,

    /// Continuous column to bin and evaluate.
    /// Required for cases without a preset.
    #[arg(long)]
    pub column: Option<String>,

    /// Number of quantile bins (1 to 100000)
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_BINS, value_parser = validate_num_bins)]
    pub num_bins: usize,

    /// Split the run operates on
    #[arg(long, value_enum, default_value_t = InputType::Test)]
    pub input_type: InputType,

    /// Root directory holding per-case datasets and bin tables
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Root directory holding model inputs, predictions and reports
    #[arg(long, default_value = "log")]
    pub log_dir: PathBuf,
}

impl CaseArgs {
    /// Resolve the case into an explicit pipeline configuration
    pub fn config(&self) -> PipelineResult<PipelineConfig> {
        PipelineConfig::for_case(
            &self.case,
            self.column.as_deref(),
            self.num_bins,
            self.input_type,
        )
    }

    /// Default artifact locations for the resolved configuration
    pub fn paths(&self, config: &PipelineConfig) -> ArtifactPaths {
        ArtifactPaths::new(config, &self.data_dir, &self.log_dir)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Quantile-bin the case column and persist the binned rows and bin table
    Bin {
        #[command(flatten)]
        case: CaseArgs,

        /// Raw dataset (CSV or Parquet). Defaults to <data-dir>/<case>/<case>.csv
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the rows with their `bins` column
        #[arg(long)]
        binned_output: Option<PathBuf>,

        /// Where to write the `bins`/`mean_value` table
        #[arg(long)]
        table_output: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only).
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },

    /// Attach each row's bin mean to previously binned rows
    Map {
        #[command(flatten)]
        case: CaseArgs,

        /// Binned rows. Defaults to <data-dir>/<case>/<case>_binned_data.csv
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Bin table. Defaults to <data-dir>/<case>/<case>_bin_mapping.csv
        #[arg(long)]
        bin_table: Option<PathBuf>,

        /// Output path. Defaults to <data-dir>/<case>/<case>_mapped_data.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode raw model output (JSON lines) into bin labels
    Decode {
        #[command(flatten)]
        case: CaseArgs,

        /// JSON-lines file with `label` and `predict` fields
        #[arg(short, long)]
        predictions: PathBuf,

        /// Output CSV. Defaults to <log-dir>/output_<case>.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode, map and score predictions against the split's ground truth
    Evaluate {
        #[command(flatten)]
        case: CaseArgs,

        /// Raw predictions (JSON lines) or an already decoded `label`/`predict` CSV
        #[arg(short, long)]
        predictions: PathBuf,

        /// Ground-truth split. Defaults to <data-dir>/<case>/<case>_<split>_set.csv
        #[arg(short, long)]
        ground_truth: Option<PathBuf>,

        /// Bin table. Defaults to <data-dir>/<case>/<case>_bin_mapping.csv
        #[arg(long)]
        bin_table: Option<PathBuf>,

        /// Decoded predictions CSV, written for raw model output.
        /// Defaults to <log-dir>/output_<case>.csv
        #[arg(long)]
        decoded_output: Option<PathBuf>,

        /// Mapped predictions CSV. Defaults to <log-dir>/output_with_mean_values_<case>.csv
        #[arg(long)]
        mapped_output: Option<PathBuf>,

        /// Evaluation JSON. Defaults to <log-dir>/<case>/evaluation_<split>_<case>.json
        #[arg(long)]
        report: Option<PathBuf>,

        /// Skip writing the evaluation JSON
        #[arg(long, default_value = "false")]
        no_report: bool,
    },

    /// Build the instruction dataset from a described split
    Export {
        #[command(flatten)]
        case: CaseArgs,

        /// Described split. Defaults to
        /// <log-dir>/<case>/<case>_<split>_set_with_functional_groups.csv
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output JSON. Defaults to <log-dir>/<case>/<split>_<case>.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reaction type named in each instruction (overrides the case preset)
        #[arg(long)]
        reaction_type: Option<String>,

        /// Description template with `{Column}` placeholders (overrides the case preset)
        #[arg(long)]
        template: Option<String>,

        /// Column whose value becomes each record's output
        #[arg(long, default_value = "bins")]
        output_column: String,
    },
}

impl Commands {
    /// Shared case options of whichever stage was selected
    pub fn case_args(&self) -> &CaseArgs {
        match self {
            Commands::Bin { case, .. }
            | Commands::Map { case, .. }
            | Commands::Decode { case, .. }
            | Commands::Evaluate { case, .. }
            | Commands::Export { case, .. } => case,
        }
    }
}

/// Validate that the bin count is between 1 and `MAX_NUM_BINS`
fn validate_num_bins(s: &str) -> Result<usize, String> {
    let val: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bin count", s))?;
    if val == 0 || val > MAX_NUM_BINS {
        return Err(format!("Number of bins must be between 1 and {}", MAX_NUM_BINS));
    }
    Ok(val)
}
