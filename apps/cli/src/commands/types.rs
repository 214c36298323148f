//! Command type definitions shared between main.rs and tests.

use clap::{Args, Subcommand};
use irislab_core::PlotFormat;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Destination of the iris CSV (relative paths land in the run's artifact directory)
    #[arg(long)]
    pub target: PathBuf,

    /// Output the run manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// CSV dataset with a `label` column
    #[arg(long)]
    pub dataset: PathBuf,

    /// File name of the serialized model artifact
    #[arg(long)]
    pub model_name: Option<String>,

    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Number of classes the booster predicts
    #[arg(long)]
    pub num_class: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub eta: Option<f32>,

    /// Minimum loss reduction required to split
    #[arg(long)]
    pub gamma: Option<f32>,

    /// Boosting rounds
    #[arg(long)]
    pub steps: Option<usize>,

    /// Seed for the train/holdout split (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Output the run manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlotArgs {
    /// Iteration log CSV with `output.<col>` columns
    #[arg(long)]
    pub iterations: PathBuf,

    /// Metric to plot
    #[arg(long)]
    pub col: Option<String>,

    #[arg(long)]
    pub num_bins: Option<usize>,

    /// Figure format (svg, png)
    #[arg(long)]
    pub format: Option<PlotFormat>,

    /// Output the run manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// CSV dataset with a `label` column
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long)]
    pub model_name: Option<String>,

    /// Comma separated candidates, e.g. `3,6`
    #[arg(long, value_delimiter = ',')]
    pub max_depth: Vec<u32>,

    #[arg(long, value_delimiter = ',')]
    pub num_class: Vec<usize>,

    #[arg(long, value_delimiter = ',')]
    pub eta: Vec<f32>,

    #[arg(long, value_delimiter = ',')]
    pub gamma: Vec<f32>,

    #[arg(long, value_delimiter = ',')]
    pub steps: Vec<usize>,

    /// Seed shared by every iteration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output the run manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RunsCommand {
    /// List tracked runs, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one run's parameters, results and artifacts
    Show {
        /// Run ID
        run_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
