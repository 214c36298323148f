//! Plot command implementation.

use super::{CliContext, PlotArgs, print_manifest};
use anyhow::{Context, Result};
use irislab_core::{FileSource, IterationPlotter, PlotSpec, execute};

pub fn execute_plot(ctx: &CliContext, args: PlotArgs) -> Result<()> {
    let spec = PlotSpec {
        col: args.col.unwrap_or_else(|| ctx.config.plot_column()),
        num_bins: args.num_bins.unwrap_or_else(|| ctx.config.num_bins()),
        format: args.format.unwrap_or_else(|| ctx.config.plot_format()),
    };
    let plotter = IterationPlotter {
        source: FileSource(args.iterations),
        spec,
    };
    let manifest = execute(&ctx.layout, &plotter)
        .with_context(|| format!("Failed to plot iterations from {}", plotter.source.0.display()))?;
    print_manifest(&manifest, args.json)
}
