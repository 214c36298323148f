//! Runs command implementation.

use super::{CliContext, RunsCommand, print_manifest};
use anyhow::{Context, Result};
use colored::Colorize;
use irislab_training::{RunId, RunState, discover_runs, load_run};
use serde_json::json;

pub fn execute_runs(ctx: &CliContext, command: RunsCommand) -> Result<()> {
    match command {
        RunsCommand::List { json } => list_runs(ctx, json),
        RunsCommand::Show { run_id, json } => show_run(ctx, &run_id, json),
    }
}

fn list_runs(ctx: &CliContext, json_output: bool) -> Result<()> {
    let root = ctx.layout.root();
    let runs = discover_runs(root)
        .with_context(|| format!("Failed to read runs under {}", root.display()))?;

    if json_output {
        let out: Vec<_> = runs
            .iter()
            .map(|m| {
                json!({
                    "run_id": m.run_id,
                    "handler": m.handler,
                    "state": m.state,
                    "created_at": m.created_at,
                    "results": m.results,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Runs ({})", runs.len()).bold().cyan());
    println!();

    if runs.is_empty() {
        println!("  {}", format!("No runs found under {}.", root.display()).dimmed());
        return Ok(());
    }

    println!("{:<38} {:<10} {:<10} {}", "ID", "Handler", "State", "Created");
    println!("{}", "─".repeat(90));
    for m in runs {
        let state = match m.state {
            RunState::Completed => "completed".green(),
            RunState::Failed => "failed".red(),
            RunState::Running => "running".yellow(),
        };
        println!(
            "{:<38} {:<10} {:<10} {}",
            m.run_id.to_string().cyan(),
            m.handler,
            state,
            m.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!();
    Ok(())
}

fn show_run(ctx: &CliContext, run_id: &str, json_output: bool) -> Result<()> {
    let manifest = load_run(ctx.layout.root(), &RunId(run_id.to_string()))
        .with_context(|| format!("Failed to load run {run_id}"))?;
    print_manifest(&manifest, json_output)
}
