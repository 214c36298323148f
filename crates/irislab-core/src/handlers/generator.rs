use super::Handler;
use irislab_training::{ArtifactRecord, ArtifactRequest, RunContext, TrainingResult, load_iris};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DATASET_ARTIFACT_KEY: &str = "iris_dataset";

/// Record the built-in iris table (features plus `label`) as a table artifact
/// stored at `target`.
pub fn generate_iris(
    ctx: &mut dyn RunContext,
    target: &str,
) -> TrainingResult<ArtifactRecord> {
    let iris = load_iris()?;
    let table = iris.features.hconcat(iris.labels)?;

    ctx.info(&format!("saving iris dataframe to {target}"));
    ctx.info(&format!(
        "iris dataframe has {} rows and {} columns",
        table.n_rows(),
        table.n_cols()
    ));

    let request = ArtifactRequest::table(DATASET_ARTIFACT_KEY, &table)?.with_target_path(target);
    ctx.record_artifact(request)
}

#[derive(Debug, Clone)]
pub struct IrisGenerator {
    pub target: PathBuf,
}

impl Handler for IrisGenerator {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn params(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::from([("target".to_string(), self.target.display().to_string().into())])
    }

    fn run(&self, ctx: &mut dyn RunContext) -> TrainingResult<()> {
        generate_iris(ctx, &self.target.to_string_lossy()).map(|_| ())
    }
}
