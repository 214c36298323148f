use super::Handler;
use crate::logging::FUTURE_WARNINGS_TARGET;
use irislab_training::{
    ArtifactKind, ArtifactRequest, ConfusionMatrix, GbdtModel, LABEL_COLUMN, LabeledData,
    PerClassStats, RunContext, Table, TrainingJobSpec, TrainingResult, accuracy_score,
    precision_recall_by_class, train_gbdt, train_test_split,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

pub const MODEL_ARTIFACT_KEY: &str = "model";
pub const FRAMEWORK_LABEL: &str = "irislab-gbdt";
/// Result key holding holdout precision, recall and support keyed by class index.
pub const PER_CLASS_RESULT_KEY: &str = "per_class";

/// Outcome of a training stage.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Seed actually used for the split.
    pub seed: u64,
    pub accuracy: f64,
    pub per_class: Vec<PerClassStats>,
    pub n_train: usize,
    pub n_test: usize,
    pub model: GbdtModel,
    pub holdout: LabeledData,
}

/// Train a booster on the CSV at `job.dataset`, record holdout accuracy and
/// the serialized model.
pub fn train_model(
    ctx: &mut dyn RunContext,
    job: &TrainingJobSpec,
) -> TrainingResult<TrainingReport> {
    job.validate()?;
    let hp = &job.hyperparams;

    let table = Table::read_csv_path(&job.dataset)?;
    let data = table.split_target(LABEL_COLUMN)?;
    ctx.info(&format!(
        "loaded {} rows with {} features from {}",
        data.len(),
        data.feature_names.len(),
        job.dataset.display()
    ));

    if hp.num_class > data.label_range() {
        tracing::warn!(
            target: FUTURE_WARNINGS_TARGET,
            num_class = hp.num_class,
            label_range = data.label_range(),
            "num_class exceeds the observed label range; extra classes receive no training rows"
        );
    }

    let seed = hp.seed.unwrap_or_else(rand::random);
    ctx.info(&format!("splitting with seed {seed}"));
    let mut rng = StdRng::seed_from_u64(seed);
    let (train, holdout) = train_test_split(&data, hp.test_fraction, &mut rng)?;

    let model = train_gbdt(&train, &hp.train_options())?;

    let predicted = model.predict_classes(&holdout.x)?;
    let accuracy = accuracy_score(&holdout.y, &predicted)?;
    ctx.info(&format!("holdout accuracy {accuracy:.4} over {} rows", holdout.len()));
    ctx.record_result("accuracy", accuracy.into())?;

    let confusion = ConfusionMatrix::from_predictions(model.num_class, &holdout.y, &predicted)?;
    let per_class = precision_recall_by_class(&confusion);
    let by_class: serde_json::Map<String, serde_json::Value> = per_class
        .iter()
        .enumerate()
        .map(|(class, stats)| serde_json::to_value(stats).map(|v| (class.to_string(), v)))
        .collect::<Result<_, _>>()?;
    ctx.record_result(PER_CLASS_RESULT_KEY, by_class.into())?;

    let request =
        ArtifactRequest::new(MODEL_ARTIFACT_KEY, ArtifactKind::Model, "json", model.to_bytes()?)
            .with_target_path(&job.model_name)
            .with_label("framework", FRAMEWORK_LABEL);
    ctx.record_artifact(request)?;

    Ok(TrainingReport {
        seed,
        accuracy,
        per_class,
        n_train: train.len(),
        n_test: holdout.len(),
        model,
        holdout,
    })
}

#[derive(Debug, Clone)]
pub struct GbdtTrainer {
    pub job: TrainingJobSpec,
}

impl Handler for GbdtTrainer {
    fn name(&self) -> &'static str {
        "train"
    }

    fn params(&self) -> BTreeMap<String, serde_json::Value> {
        let mut params = self.job.hyperparams.as_params();
        params.insert("dataset".to_string(), self.job.dataset.display().to_string().into());
        params.insert("model_name".to_string(), self.job.model_name.clone().into());
        params
    }

    fn run(&self, ctx: &mut dyn RunContext) -> TrainingResult<()> {
        let report = train_model(ctx, &self.job)?;
        if self.job.hyperparams.seed.is_none() {
            ctx.record_result("seed", report.seed.into())?;
        }
        Ok(())
    }
}
