//! Laminate check commands: symmetry, balance, duplicates, AML and the
//! bulk verification report.

use crate::cli::common::{load_project, print_json, CliError, CliResult, Context};
use crate::models::{Laminate, Project};
use crate::natural_sort::natural_cmp;
use crate::parser::orientation::format_orientation;
use crate::services::balance::{evaluate_balance, BalanceEvaluation};
use crate::services::checks::{check_duplicates, check_symmetry, classify_aml, AmlType};
use crate::services::symmetry::{evaluate_symmetry, SymmetryEvaluation};
use crate::services::verification::verify_project;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Run stacking checks on a project
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(subcommand)]
    command: CheckCommand,
}

#[derive(Subcommand, Debug)]
enum CheckCommand {
    /// Mirror symmetry of the structural plies
    Symmetry(LaminateArgs),
    /// ±angle ply balance
    Balance(LaminateArgs),
    /// Laminates sharing stacking, type and color
    Duplicates(ProjectArgs),
    /// Hard / Soft / Quasi-iso classification
    Aml(LaminateArgs),
    /// Every check plus assignment and neighbor graph integrity
    Verify(VerifyArgs),
}

/// Project file plus output format
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Path to project JSON file
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Project file, optional laminate filter and output format
#[derive(Args, Debug)]
pub struct LaminateArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Only check this laminate
    #[arg(short, long, value_name = "NAME")]
    laminate: Option<String>,
}

/// Bulk verification options
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Treat warnings as errors (exit non-zero)
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize, Debug)]
struct SymmetryOutput<'a> {
    laminate: &'a str,
    #[serde(flatten)]
    evaluation: SymmetryEvaluation,
}

#[derive(Serialize, Debug)]
struct BalanceOutput<'a> {
    laminate: &'a str,
    #[serde(flatten)]
    evaluation: BalanceEvaluation,
}

#[derive(Serialize, Debug)]
struct AmlOutput<'a> {
    laminate: &'a str,
    aml: Option<AmlType>,
}

impl CheckArgs {
    /// Execute check subcommand
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        match &self.command {
            CheckCommand::Symmetry(args) => args.symmetry(ctx),
            CheckCommand::Balance(args) => args.balance(ctx),
            CheckCommand::Duplicates(args) => args.duplicates(ctx),
            CheckCommand::Aml(args) => args.aml(ctx),
            CheckCommand::Verify(args) => args.execute(ctx),
        }
    }
}

impl LaminateArgs {
    fn selected<'a>(&self, project: &'a Project) -> CliResult<Vec<&'a Laminate>> {
        match &self.laminate {
            Some(name) => project
                .laminate(name)
                .map(|l| vec![l])
                .ok_or_else(|| CliError::invalid_input(format!("Laminate '{name}' not found"))),
            None => Ok(project.laminates.iter().collect()),
        }
    }

    fn symmetry(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project.project, ctx)?;
        let laminates = self.selected(&project)?;
        let results: Vec<SymmetryOutput> = laminates
            .iter()
            .map(|l| SymmetryOutput {
                laminate: &l.name,
                evaluation: evaluate_symmetry(&l.plies),
            })
            .collect();

        if self.project.json {
            print_json(&results)?;
        } else {
            let owned: Vec<Laminate> = laminates.iter().map(|l| (*l).clone()).collect();
            let report = check_symmetry(&owned);
            println!("Symmetric ({}):", report.symmetric.len());
            for name in &report.symmetric {
                println!("  ✓ {name}");
            }
            println!("Not symmetric ({}):", report.not_symmetric.len());
            for name in &report.not_symmetric {
                let detail = results
                    .iter()
                    .find(|r| r.laminate == name.as_str())
                    .and_then(|r| r.evaluation.first_mismatch)
                    .map(|(a, b)| format!(" (ply {} vs ply {})", a + 1, b + 1))
                    .unwrap_or_default();
                println!("  ✗ {name}{detail}");
            }
        }

        let failed = results.iter().filter(|r| !r.evaluation.is_symmetric).count();
        if failed > 0 {
            return Err(CliError::validation(format!(
                "{failed} laminate(s) not symmetric"
            )));
        }
        Ok(())
    }

    fn balance(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project.project, ctx)?;
        let mut results: Vec<BalanceOutput> = self
            .selected(&project)?
            .into_iter()
            .map(|l| BalanceOutput {
                laminate: &l.name,
                evaluation: evaluate_balance(&l.plies),
            })
            .collect();
        results.sort_by(|a, b| natural_cmp(a.laminate, b.laminate));

        if self.project.json {
            print_json(&results)?;
        } else {
            for result in &results {
                if result.evaluation.is_balanced {
                    println!("✓ {}", result.laminate);
                    continue;
                }
                println!("✗ {}", result.laminate);
                for bucket in result
                    .evaluation
                    .angle_pairs
                    .iter()
                    .filter(|b| !b.is_balanced())
                {
                    println!(
                        "    ±{}: {} positive, {} negative",
                        format_orientation(Some(bucket.angle)),
                        bucket.positive,
                        bucket.negative
                    );
                }
            }
        }

        let failed = results.iter().filter(|r| !r.evaluation.is_balanced).count();
        if failed > 0 {
            return Err(CliError::validation(format!("{failed} laminate(s) unbalanced")));
        }
        Ok(())
    }

    fn aml(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project.project, ctx)?;
        let mut results: Vec<AmlOutput> = self
            .selected(&project)?
            .into_iter()
            .map(|l| AmlOutput {
                laminate: &l.name,
                aml: classify_aml(l),
            })
            .collect();
        results.sort_by(|a, b| natural_cmp(a.laminate, b.laminate));

        if self.project.json {
            print_json(&results)?;
        } else {
            for result in &results {
                let label = result
                    .aml
                    .map_or_else(|| "(no oriented plies)".to_string(), |t| t.to_string());
                println!("{:<20} {}", result.laminate, label);
            }
        }
        Ok(())
    }
}

impl ProjectArgs {
    fn duplicates(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project, ctx)?;
        let groups = check_duplicates(&project.laminates);

        if self.json {
            print_json(&groups)?;
        } else if groups.is_empty() {
            println!("No duplicate laminates");
        } else {
            for group in &groups {
                println!("{} ({}):", group.summary, group.laminates.len());
                println!("  {}", group.laminates.join(", "));
            }
        }
        Ok(())
    }
}

impl VerifyArgs {
    /// Execute the verify command
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let project = load_project(&self.project.project, ctx)?;
        let report = verify_project(&project);

        if self.project.json {
            print_json(&report)?;
        } else if report.errors.is_empty() && report.warnings.is_empty() {
            println!("✓ Verification passed");
        } else {
            if report.is_valid() {
                println!("✓ Verification passed with warnings\n");
            } else {
                println!("✗ Verification failed\n");
            }
            print!("{}", report.format_message());
        }

        if !report.is_valid() {
            return Err(CliError::validation("Verification failed"));
        }
        if self.strict && !report.warnings.is_empty() {
            return Err(CliError::validation("Warnings found in strict mode"));
        }
        Ok(())
    }
}
