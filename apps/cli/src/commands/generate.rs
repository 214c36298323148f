//! Generate command implementation.

use super::{CliContext, GenerateArgs, print_manifest};
use anyhow::{Context, Result};
use irislab_core::{IrisGenerator, execute};

pub fn execute_generate(ctx: &CliContext, args: GenerateArgs) -> Result<()> {
    let handler = IrisGenerator {
        target: args.target,
    };
    let manifest = execute(&ctx.layout, &handler).with_context(|| {
        format!("Failed to generate iris dataset at {}", handler.target.display())
    })?;
    print_manifest(&manifest, args.json)
}
