//! Pipeline configuration
//!
//! Every stage receives a `PipelineConfig` explicitly. Case presets provide the
//! column, reaction type and description template for the known datasets, and
//! `ArtifactPaths` derives where each stage reads and writes its files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};

/// Default number of quantile bins
pub const DEFAULT_NUM_BINS: usize = 100;

/// Upper bound on the number of bins
pub const MAX_NUM_BINS: usize = 100_000;

/// Which split of a case the run operates on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Train,
    #[default]
    Test,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputType::Train => write!(f, "train"),
            InputType::Test => write!(f, "test"),
        }
    }
}

impl std::str::FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(InputType::Train),
            "test" => Ok(InputType::Test),
            _ => Err(format!("Unknown input type: '{}'. Use 'train' or 'test'.", s)),
        }
    }
}

/// Known dataset presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasePreset {
    pub case_id: &'static str,
    /// Continuous column that gets binned and evaluated
    pub column_name: &'static str,
    /// Reaction family named in the instruction text
    pub reaction_type: &'static str,
    /// Row description template, `{Column}` placeholders
    pub description_template: &'static str,
}

pub const CASE_PRESETS: [CasePreset; 3] = [
    CasePreset {
        case_id: "case1",
        column_name: "Yield",
        reaction_type: "B-H coupling",
        description_template: "{Description}",
    },
    CasePreset {
        case_id: "case2",
        column_name: "L/B",
        reaction_type: "terminal olefin hydroformylation",
        description_template: "The formed transition metal complex is {Ligand-M}, temperature is {T(K)} K, \
            the pressure is {p(bar)} bar, the CO/H2 is {CO/H2}, \
            the reaction time is {t(h)} h, the L/M is {L/M}, \
            the S/M is {S/M}, and the molar concentration of the alkene is {S/M}.",
    },
    CasePreset {
        case_id: "case3",
        column_name: "output",
        reaction_type: "chiral phosphoric acid-catalyzed",
        description_template: "{Description}",
    },
];

/// Look up a preset by case id. Accepts `case2` as well as the bare `2`.
pub fn find_preset(case_id: &str) -> Option<&'static CasePreset> {
    let normalized = if case_id.chars().all(|c| c.is_ascii_digit()) {
        format!("case{}", case_id)
    } else {
        case_id.to_lowercase()
    };
    CASE_PRESETS.iter().find(|p| p.case_id == normalized)
}

/// Explicit configuration passed into each stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub case_id: String,
    pub column_name: String,
    pub num_bins: usize,
    pub input_type: InputType,
}

impl PipelineConfig {
    pub fn new(
        case_id: impl Into<String>,
        column_name: impl Into<String>,
        num_bins: usize,
        input_type: InputType,
    ) -> PipelineResult<Self> {
        if num_bins == 0 || num_bins > MAX_NUM_BINS {
            return Err(PipelineError::InvalidBinCount(num_bins));
        }
        Ok(Self {
            case_id: case_id.into(),
            column_name: column_name.into(),
            num_bins,
            input_type,
        })
    }

    /// Build a config for a case, taking the column from its preset unless overridden.
    pub fn for_case(
        case_id: &str,
        column_override: Option<&str>,
        num_bins: usize,
        input_type: InputType,
    ) -> PipelineResult<Self> {
        let preset = find_preset(case_id);
        let case_id = preset.map(|p| p.case_id.to_string()).unwrap_or_else(|| case_id.to_string());
        let column = match (column_override, preset) {
            (Some(column), _) => column.to_string(),
            (None, Some(preset)) => preset.column_name.to_string(),
            (None, None) => return Err(PipelineError::UnknownCase(case_id)),
        };
        Self::new(case_id, column, num_bins, input_type)
    }

    pub fn preset(&self) -> Option<&'static CasePreset> {
        find_preset(&self.case_id)
    }
}

/// File locations for every stage of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Raw dataset that gets binned
    pub raw_data: PathBuf,
    /// Raw dataset plus the `bins` column
    pub binned_rows: PathBuf,
    /// Persisted `bins`/`mean_value` table
    pub bin_table: PathBuf,
    /// Binned rows plus `mean_value`
    pub mapped_rows: PathBuf,
    /// Train or test split (ground truth source)
    pub split_set: PathBuf,
    /// Split enriched with a `Description` column by the external describer
    pub described_set: PathBuf,
    /// Instruction dataset for the sequence model
    pub instruction_json: PathBuf,
    /// `label`/`predict` CSV after decoding model output
    pub decoded_predictions: PathBuf,
    /// Decoded predictions plus `mean_values`
    pub mapped_predictions: PathBuf,
    /// JSON evaluation export
    pub evaluation_report: PathBuf,
}

impl ArtifactPaths {
    pub fn new(config: &PipelineConfig, data_dir: &Path, log_dir: &Path) -> Self {
        let case = config.case_id.as_str();
        let split = config.input_type;
        let case_data = data_dir.join(case);
        let case_log = log_dir.join(case);

        Self {
            raw_data: case_data.join(format!("{}.csv", case)),
            binned_rows: case_data.join(format!("{}_binned_data.csv", case)),
            bin_table: case_data.join(format!("{}_bin_mapping.csv", case)),
            mapped_rows: case_data.join(format!("{}_mapped_data.csv", case)),
            split_set: case_data.join(format!("{}_{}_set.csv", case, split)),
            described_set: case_log.join(format!(
                "{}_{}_set_with_functional_groups.csv",
                case, split
            )),
            instruction_json: case_log.join(format!("{}_{}.json", split, case)),
            decoded_predictions: log_dir.join(format!("output_{}.csv", case)),
            mapped_predictions: log_dir.join(format!("output_with_mean_values_{}.csv", case)),
            evaluation_report: case_log.join(format!("evaluation_{}_{}.json", split, case)),
        }
    }
}
