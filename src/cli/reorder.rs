//! Neighborhood reorder command.

use crate::cli::common::{load_project, print_json, save_project, CliError, CliResult, Context};
use crate::services::{ProjectService, ReorderError};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Reorder every cell's plies by neighborhood and orientation
#[derive(Debug, Clone, Args)]
pub struct ReorderArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Write the project here instead of overwriting the input
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the result without saving
    #[arg(long)]
    pub dry_run: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Debug)]
struct ReorderOutput {
    rows_before: usize,
    rows_after: usize,
    cells: Vec<CellSequence>,
    created_laminates: Vec<String>,
    saved_to: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
struct CellSequence {
    cell: String,
    laminate: String,
    orientations: Vec<Option<f64>>,
}

impl ReorderArgs {
    /// Execute the reorder command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut project = load_project(&self.project, ctx)?;

        let (outcome, created) =
            ProjectService::reorder(&mut project, &ctx.config.label_defaults()).map_err(|e| {
                match e.downcast_ref::<ReorderError>() {
                    Some(ReorderError::NoNeighbors) => {
                        CliError::validation("No neighbors defined: link cells before reordering")
                    }
                    Some(ReorderError::Graph(err)) => CliError::validation(err.to_string()),
                    _ => CliError::invalid_input(format!("{e:#}")),
                }
            })?;

        let saved_to = if self.dry_run {
            None
        } else {
            let target = self.output.clone().unwrap_or_else(|| self.project.clone());
            save_project(&mut project, &target)?;
            Some(target)
        };

        let output = ReorderOutput {
            rows_before: outcome.rows_before,
            rows_after: outcome.rows_after,
            cells: outcome
                .cells
                .iter()
                .map(|entry| CellSequence {
                    cell: entry.cell.to_string(),
                    laminate: project
                        .cell_to_laminate
                        .get(&entry.cell)
                        .cloned()
                        .unwrap_or_default(),
                    orientations: entry.laminate.orientations(),
                })
                .collect(),
            created_laminates: created,
            saved_to,
        };

        if self.json {
            return print_json(&output);
        }

        println!(
            "Reordered {} cells: {} rows -> {} rows",
            output.cells.len(),
            output.rows_before,
            output.rows_after
        );
        for name in &output.created_laminates {
            println!("  + created laminate {name}");
        }
        match &output.saved_to {
            Some(path) => println!("Saved to {}", path.display()),
            None => println!("Dry run: nothing saved"),
        }
        Ok(())
    }
}
