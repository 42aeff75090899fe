//! Intermediate laminate command.

use crate::cli::common::{load_project, print_json, save_project, CliError, CliResult, Context};
use crate::parser::orientation::format_orientation;
use crate::services::intermediate::{build_intermediate_laminate, IntermediateError};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Build a laminate between a thick and a thin one by symmetric ply removal
#[derive(Debug, Clone, Args)]
pub struct IntermediateArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Name of the thick laminate
    #[arg(long, value_name = "NAME")]
    pub max: String,

    /// Name of the thin laminate
    #[arg(long, value_name = "NAME")]
    pub min: String,

    /// Number of plies to remove
    #[arg(short, long, value_name = "N")]
    pub reduce_by: usize,

    /// Allow removing non-±45° pairs when no ±45° combination exists
    #[arg(long)]
    pub allow_non_45: bool,

    /// Add the result to the project under this name and save it
    #[arg(long, value_name = "NAME")]
    pub save_as: Option<String>,

    /// Write the project here instead of overwriting the input
    #[arg(short, long, value_name = "FILE", requires = "save_as")]
    pub output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Debug)]
struct IntermediateOutput {
    name: String,
    removed_indices: Vec<usize>,
    used_non_45: bool,
    orientations: Vec<Option<f64>>,
}

impl IntermediateArgs {
    /// Execute the intermediate command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut project = load_project(&self.project, ctx)?;

        let max = project
            .laminate(&self.max)
            .ok_or_else(|| CliError::invalid_input(format!("Laminate '{}' not found", self.max)))?;
        let min = project
            .laminate(&self.min)
            .ok_or_else(|| CliError::invalid_input(format!("Laminate '{}' not found", self.min)))?;

        let allow_non_45 = self.allow_non_45 || ctx.config.search.allow_non_45;
        let result = build_intermediate_laminate(max, min, self.reduce_by, allow_non_45)
            .map_err(|e| match e {
                IntermediateError::InvalidReduction
                | IntermediateError::NotThicker { .. }
                | IntermediateError::ReductionExceedsExcess { .. } => {
                    CliError::invalid_input(e.to_string())
                }
                _ => CliError::validation(e.to_string()),
            })?;

        let mut laminate = result.laminate;
        if let Some(name) = &self.save_as {
            laminate.name.clone_from(name);
            laminate.cells.clear();
            project
                .add_laminate(laminate.clone())
                .map_err(|e| CliError::invalid_input(e.to_string()))?;
            let target = self.output.as_ref().unwrap_or(&self.project);
            save_project(&mut project, target)?;
        }

        let output = IntermediateOutput {
            name: laminate.name.clone(),
            removed_indices: result.removed_indices,
            used_non_45: result.used_non_45,
            orientations: laminate.orientations(),
        };

        if self.json {
            return print_json(&output);
        }

        let removed: Vec<String> = output
            .removed_indices
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        println!("Removed plies {}", removed.join(", "));
        if output.used_non_45 {
            println!("  (non-±45° plies were removed)");
        }
        let stack: Vec<String> = output
            .orientations
            .iter()
            .map(|o| o.map_or_else(|| "-".to_string(), |a| format_orientation(Some(a))))
            .collect();
        println!("[{}]", stack.join(" / "));
        if self.save_as.is_some() {
            println!("Added laminate {}", output.name);
        }
        Ok(())
    }
}
