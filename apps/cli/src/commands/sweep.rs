//! Sweep command implementation.

use super::{CliContext, SweepArgs, print_manifest};
use anyhow::{Context, Result};
use colored::Colorize;
use irislab_core::{GridSweep, ParamGrid, SweepSpec, execute};

pub fn execute_sweep(ctx: &CliContext, args: SweepArgs) -> Result<()> {
    let mut base = ctx.config.hyperparams();
    if args.seed.is_some() {
        base.seed = args.seed;
    }
    let grid = ParamGrid {
        max_depth: args.max_depth,
        num_class: args.num_class,
        eta: args.eta,
        gamma: args.gamma,
        steps: args.steps,
    };
    let iterations = grid.combinations(&base).len();
    let spec = SweepSpec {
        dataset: args.dataset,
        model_name: args.model_name.unwrap_or_else(|| ctx.config.model_name()),
        base,
        grid,
    };

    if !args.json {
        println!("{}", format!("Sweeping {iterations} iterations").bold());
    }
    let manifest = execute(&ctx.layout, &GridSweep { spec }).context("Sweep failed")?;
    print_manifest(&manifest, args.json)
}
