//! Command implementations for the irislab CLI.

pub mod generate;
pub mod plot;
pub mod runs;
pub mod sweep;
pub mod train;
pub mod types;

pub use types::{GenerateArgs, PlotArgs, RunsCommand, SweepArgs, TrainArgs};

use anyhow::Result;
use colored::Colorize;
use irislab_core::PipelineConfig;
use irislab_training::{RunLayout, RunManifest, RunState};

/// Resolved settings every command runs with.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: PipelineConfig,
    pub layout: RunLayout,
}

/// Print a finished run either as JSON or as a short colored summary.
pub fn print_manifest(manifest: &RunManifest, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(manifest)?);
        return Ok(());
    }

    println!();
    let state = match manifest.state {
        RunState::Completed => "completed".green(),
        RunState::Failed => "failed".red(),
        RunState::Running => "running".yellow(),
    };
    println!("{} {}", format!("Run {}", manifest.run_id).bold().cyan(), state);
    println!("  Handler: {}", manifest.handler);
    println!("  Created: {}", manifest.created_at.to_rfc3339().dimmed());

    if !manifest.params.is_empty() {
        println!();
        println!("  {}", "Parameters".bold());
        for (key, value) in &manifest.params {
            println!("    {:<16} {}", key, value);
        }
    }

    if !manifest.results.is_empty() {
        println!();
        println!("  {}", "Results".bold());
        for (key, value) in &manifest.results {
            println!("    {:<16} {}", key, value.to_string().green());
        }
    }

    if !manifest.artifacts.is_empty() {
        println!();
        println!("  {}", "Artifacts".bold());
        for artifact in &manifest.artifacts {
            println!("    {:<16} {}", artifact.key, artifact.path.display().to_string().dimmed());
        }
    }

    if let Some(error) = &manifest.error {
        println!();
        println!("  {} {}", "Error:".red().bold(), error);
    }
    println!();
    Ok(())
}
