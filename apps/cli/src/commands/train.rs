//! Train command implementation.

use super::{CliContext, TrainArgs, print_manifest};
use anyhow::{Context, Result};
use irislab_core::{GbdtTrainer, execute};
use irislab_training::TrainingJobSpec;

/// Build the job from configured defaults overridden by flags.
pub fn job_from_args(ctx: &CliContext, args: &TrainArgs) -> TrainingJobSpec {
    let mut hp = ctx.config.hyperparams();
    if let Some(v) = args.max_depth {
        hp.max_depth = v;
    }
    if let Some(v) = args.num_class {
        hp.num_class = v;
    }
    if let Some(v) = args.eta {
        hp.eta = v;
    }
    if let Some(v) = args.gamma {
        hp.gamma = v;
    }
    if let Some(v) = args.steps {
        hp.steps = v;
    }
    if let Some(v) = args.test_fraction {
        hp.test_fraction = v;
    }
    if args.seed.is_some() {
        hp.seed = args.seed;
    }

    TrainingJobSpec {
        dataset: args.dataset.clone(),
        model_name: args.model_name.clone().unwrap_or_else(|| ctx.config.model_name()),
        hyperparams: hp,
    }
}

pub fn execute_train(ctx: &CliContext, args: TrainArgs) -> Result<()> {
    let job = job_from_args(ctx, &args);
    let dataset = job.dataset.display().to_string();
    let manifest = execute(&ctx.layout, &GbdtTrainer { job })
        .with_context(|| format!("Training on {dataset} failed"))?;
    print_manifest(&manifest, args.json)
}
