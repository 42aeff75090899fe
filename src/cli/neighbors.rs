//! Neighbor graph commands.

use crate::cli::common::{load_project, print_json, save_project, CliError, CliResult, Context};
use crate::models::{CellId, Direction};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Inspect and edit the neighbor graph of a project
#[derive(Args, Debug)]
pub struct NeighborsArgs {
    #[command(subcommand)]
    command: NeighborsCommand,
}

#[derive(Subcommand, Debug)]
enum NeighborsCommand {
    /// List every cell's neighbors
    Show(ShowArgs),
    /// Link two cells in a direction
    Link(LinkArgs),
    /// Remove a link between two cells
    Unlink(LinkArgs),
    /// Connected components of a set of cells
    Components(ComponentsArgs),
    /// Cell blocks not connected to the main block
    Blocks(BlocksArgs),
    /// Check that duplicated cells are connected
    Validate(ShowArgs),
}

/// Read-only graph command options
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    project: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

/// Link/unlink options
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    project: PathBuf,

    /// Source cell (e.g., C1)
    #[arg(long, value_name = "CELL")]
    from: CellId,

    /// Direction from the source cell (up, down, left, right)
    #[arg(short, long)]
    direction: Direction,

    /// Destination cell (e.g., C2)
    #[arg(long, value_name = "CELL")]
    to: CellId,

    /// Write the project here instead of overwriting the input
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Component options
#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    project: PathBuf,

    /// Restrict to these cells (defaults to every project cell)
    #[arg(short, long, value_name = "CELL", num_args = 1.., value_delimiter = ',')]
    cells: Vec<CellId>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

/// Block options
#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    project: PathBuf,

    /// Delete the disconnected blocks and save the project
    #[arg(long)]
    remove: bool,

    /// Write the project here instead of overwriting the input
    #[arg(short, long, value_name = "FILE", requires = "remove")]
    output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct BlocksOutput {
    blocks: Vec<Vec<CellId>>,
    removed_nodes: usize,
}

#[derive(Serialize, Debug)]
struct DuplicatesOutput {
    valid: bool,
    errors: Vec<String>,
}

impl NeighborsArgs {
    /// Execute neighbors subcommand
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        match &self.command {
            NeighborsCommand::Show(args) => args.show(ctx),
            NeighborsCommand::Link(args) => args.link(ctx),
            NeighborsCommand::Unlink(args) => args.unlink(ctx),
            NeighborsCommand::Components(args) => args.execute(ctx),
            NeighborsCommand::Blocks(args) => args.execute(ctx),
            NeighborsCommand::Validate(args) => args.validate(ctx),
        }
    }
}

impl ShowArgs {
    fn show(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project, ctx)?;
        let graph = &project.graph;

        let mut listing: BTreeMap<&CellId, BTreeMap<Direction, Vec<&CellId>>> = BTreeMap::new();
        for cell in graph.cells() {
            let entry = listing.entry(cell).or_default();
            for direction in Direction::ALL {
                let neighbors: Vec<&CellId> = graph.neighbors(cell, direction).collect();
                if !neighbors.is_empty() {
                    entry.insert(direction, neighbors);
                }
            }
        }

        if self.json {
            return print_json(&listing);
        }

        println!(
            "{} nodes, {} connections",
            graph.node_count(),
            graph.connection_count()
        );
        for (cell, directions) in &listing {
            if directions.is_empty() {
                println!("  {cell}: (passive)");
                continue;
            }
            let parts: Vec<String> = directions
                .iter()
                .map(|(direction, cells)| {
                    let names: Vec<String> = cells.iter().map(ToString::to_string).collect();
                    format!("{direction}={}", names.join("/"))
                })
                .collect();
            println!("  {cell}: {}", parts.join(", "));
        }
        Ok(())
    }

    fn validate(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project, ctx)?;
        let errors: Vec<String> = project
            .graph
            .disconnected_duplicates()
            .iter()
            .map(ToString::to_string)
            .collect();
        let output = DuplicatesOutput {
            valid: errors.is_empty(),
            errors,
        };

        if self.json {
            print_json(&output)?;
        } else if output.valid {
            println!("✓ Duplicated cells are connected");
        } else {
            for error in &output.errors {
                println!("  ✗ {error}");
            }
        }

        if !output.valid {
            return Err(CliError::validation("Disconnected duplicate cells"));
        }
        Ok(())
    }
}

impl LinkArgs {
    fn target(&self) -> &PathBuf {
        self.output.as_ref().unwrap_or(&self.project)
    }

    fn link(&self, ctx: &Context) -> CliResult<()> {
        let mut project = load_project(&self.project, ctx)?;
        project
            .graph
            .link(&self.from, self.direction, &self.to)
            .map_err(|e| CliError::invalid_input(e.to_string()))?;
        save_project(&mut project, self.target())?;
        println!("Linked {} {} {}", self.from, self.direction, self.to);
        Ok(())
    }

    fn unlink(&self, ctx: &Context) -> CliResult<()> {
        let mut project = load_project(&self.project, ctx)?;
        if !project.graph.unlink(&self.from, self.direction, &self.to) {
            return Err(CliError::invalid_input(format!(
                "{} has no {} neighbor {}",
                self.from, self.direction, self.to
            )));
        }
        save_project(&mut project, self.target())?;
        println!("Unlinked {} {} {}", self.from, self.direction, self.to);
        Ok(())
    }
}

impl ComponentsArgs {
    /// Execute the components command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project, ctx)?;
        let scope: BTreeSet<CellId> = if self.cells.is_empty() {
            project.cells.iter().cloned().collect()
        } else {
            self.cells.iter().cloned().collect()
        };
        let components = project.graph.connected_components(&scope);

        if self.json {
            return print_json(&components);
        }
        for (idx, component) in components.iter().enumerate() {
            let names: Vec<String> = component.iter().map(ToString::to_string).collect();
            println!("{}. {}", idx + 1, names.join(", "));
        }
        Ok(())
    }
}

impl BlocksArgs {
    /// Execute the blocks command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut project = load_project(&self.project, ctx)?;
        let blocks = project.graph.disconnected_blocks();

        let removed_nodes = if self.remove && !blocks.is_empty() {
            let removed = project.graph.remove_blocks(&blocks);
            let target = self.output.as_ref().unwrap_or(&self.project);
            save_project(&mut project, target)?;
            removed
        } else {
            0
        };

        if self.json {
            return print_json(&BlocksOutput {
                blocks,
                removed_nodes,
            });
        }
        if blocks.is_empty() {
            println!("All placed cells form one block");
            return Ok(());
        }
        for block in &blocks {
            let names: Vec<String> = block.iter().map(ToString::to_string).collect();
            println!("  {}", names.join(", "));
        }
        if self.remove {
            println!("Removed {removed_nodes} grid node(s)");
        }
        Ok(())
    }
}
