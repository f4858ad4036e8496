//! Instruction dataset export
//!
//! Each binned row becomes one instruction record for the sequence model:
//! a description rendered from a `{Column}` template, wrapped in a fixed
//! question, with the row's bin index as the expected output.

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::missing::require_column;

/// One training/evaluation example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
    pub history: Vec<Vec<String>>,
}

/// A parsed description template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(String),
}

/// Split a template into literal text and `{Column}` fields.
///
/// `{{` and `}}` stand for literal braces.
pub fn parse_template(template: &str) -> PipelineResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    if inner == '{' {
                        return Err(PipelineError::MalformedTemplate {
                            position: pos,
                            message: "nested '{' inside a placeholder".to_string(),
                        });
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(PipelineError::MalformedTemplate {
                        position: pos,
                        message: "unclosed '{'".to_string(),
                    });
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(name));
            }
            '}' => {
                return Err(PipelineError::MalformedTemplate {
                    position: pos,
                    message: "single '}' outside a placeholder".to_string(),
                })
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Render a template against a value lookup.
pub fn render_template<'a, F>(template: &str, lookup: F) -> PipelineResult<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    render_segments(&parse_template(template)?, lookup)
}

fn render_segments<'a, F>(segments: &[Segment], lookup: F) -> PipelineResult<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(name) => {
                let value = lookup(name).ok_or_else(|| PipelineError::UnknownPlaceholder {
                    placeholder: name.clone(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Text of every cell in a column. Missing cells read `nan`, floats keep a
/// decimal point (`298.0`).
pub fn column_text_values(col: &Column) -> PipelineResult<Vec<String>> {
    const MISSING: &str = "nan";

    let values: Vec<String> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()).unwrap_or_else(|| MISSING.to_string()))
            .collect(),
        DataType::Float32 | DataType::Float64 => col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(n) if !n.is_nan() => format!("{:?}", n),
                _ => MISSING.to_string(),
            })
            .collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| match v {
                Some(true) => "True".to_string(),
                Some(false) => "False".to_string(),
                None => MISSING.to_string(),
            })
            .collect(),
        dtype if dtype.is_integer() => col
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(|n| n.to_string()).unwrap_or_else(|| MISSING.to_string()))
            .collect(),
        _ => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()).unwrap_or_else(|| MISSING.to_string()))
            .collect(),
    };

    Ok(values)
}

/// Instruction text for one row
pub fn instruction_text(reaction_type: &str, description: &str) -> String {
    format!(
        "This is a {} reaction. Description: {}, what is the yield?",
        reaction_type, description
    )
}

/// Build one instruction record per row.
///
/// # Arguments
/// * `df` - Rows to export (normally binned rows with a `Description` column)
/// * `reaction_type` - Reaction family named in the instruction
/// * `description_template` - `{Column}` template for the description
/// * `output_column` - Column whose value becomes the expected output
pub fn build_instruction_records(
    df: &DataFrame,
    reaction_type: &str,
    description_template: &str,
    output_column: &str,
) -> PipelineResult<Vec<InstructionRecord>> {
    let segments = parse_template(description_template)?;

    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    // Fail before touching any row if the template names an absent column
    for segment in &segments {
        if let Segment::Field(name) = segment {
            if !column_names.contains(name) {
                return Err(PipelineError::UnknownPlaceholder {
                    placeholder: name.clone(),
                });
            }
        }
    }
    require_column(df, output_column)?;

    let mut columns: Vec<(String, Vec<String>)> = Vec::with_capacity(column_names.len());
    for name in &column_names {
        let values = column_text_values(df.column(name)?)?;
        columns.push((name.clone(), values));
    }

    let output_idx = column_names
        .iter()
        .position(|n| n == output_column)
        .ok_or_else(|| PipelineError::Schema {
            column: output_column.to_string(),
            available: column_names.clone(),
        })?;

    (0..df.height())
        .map(|row| {
            let description = render_segments(&segments, |name| {
                columns
                    .iter()
                    .find(|(col, _)| col == name)
                    .map(|(_, values)| values[row].as_str())
            })?;
            Ok(InstructionRecord {
                instruction: instruction_text(reaction_type, &description),
                input: String::new(),
                output: columns[output_idx].1[row].clone(),
                history: Vec::new(),
            })
        })
        .collect()
}

/// Write records as a pretty-printed JSON array (4-space indent, raw UTF-8).
pub fn write_instruction_records(records: &[InstructionRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records
        .serialize(&mut serializer)
        .context("Failed to serialize instruction records to JSON")?;

    std::fs::write(path, buffer)
        .with_context(|| format!("Failed to write instruction records to {}", path.display()))?;

    Ok(())
}
