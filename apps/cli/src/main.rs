//! irislab CLI - drive the iris pipeline stages from the command line
//!
//! Every stage runs as a tracked run under `<root>/runs/<run_id>/`, with its
//! manifest and artifacts stored next to each other.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{
    CliContext, GenerateArgs, PlotArgs, RunsCommand, SweepArgs, TrainArgs, generate, plot, runs,
    sweep, train,
};
use irislab_core::{LoggingOptions, PipelineConfig, init_logging};
use irislab_training::RunLayout;

/// irislab - iris dataset generation, boosted-tree training and iteration plots
#[derive(Parser, Debug)]
#[command(
    name = "irislab",
    author,
    version,
    about = "irislab - a small tracked ML pipeline on the iris dataset"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Directory holding tracked runs (default: .irislab)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Explicit configuration file, applied over discovered ones
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Silence warnings about ineffective settings
    #[arg(long, global = true)]
    suppress_warnings: bool,

    /// Emit log events as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the built-in iris dataset as a tracked table artifact
    Generate(GenerateArgs),

    /// Train a boosted-tree classifier and record its holdout accuracy
    ///
    /// Loads a CSV with a `label` column, holds out 20% of the rows, trains
    /// on the rest and stores the serialized model as an artifact.
    Train(TrainArgs),

    /// Render a histogram of an iteration log column
    Plot(PlotArgs),

    /// Train over a grid of hyperparameters and record an iteration log
    Sweep(SweepArgs),

    /// Inspect tracked runs
    #[command(subcommand)]
    Runs(RunsCommand),
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        PipelineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let logging = LoggingOptions {
        level: args
            .log_level
            .clone()
            .or_else(|| config.log_level.clone())
            .unwrap_or_else(|| "info".to_string()),
        suppress_warnings: args.suppress_warnings || config.suppress_warnings.unwrap_or(false),
        json: args.log_json,
    };
    init_logging(&logging)?;

    let root = args.root.clone().unwrap_or_else(|| config.root_dir());
    let layout = RunLayout::new(root).absolute().context("Failed to resolve run root")?;
    tracing::debug!(root = %layout.root().display(), "using run root");
    let ctx = CliContext { config, layout };

    match args.command {
        Command::Generate(cmd) => generate::execute_generate(&ctx, cmd)?,
        Command::Train(cmd) => train::execute_train(&ctx, cmd)?,
        Command::Plot(cmd) => plot::execute_plot(&ctx, cmd)?,
        Command::Sweep(cmd) => sweep::execute_sweep(&ctx, cmd)?,
        Command::Runs(cmd) => runs::execute_runs(&ctx, cmd)?,
    }

    Ok(())
}
