//! Grid sweep over trainer hyperparameters.
//!
//! Every combination of the grid runs the trainer stage through an
//! [`IterationContext`], which namespaces the child's artifacts and results
//! inside the parent run. The per-iteration outcomes are written as an
//! iteration log the plotter can read back.

use crate::handlers::{Handler, train_model};
use irislab_training::{
    ArtifactKind, ArtifactRecord, ArtifactRequest, IterationRecord, IterationState, RunContext,
    RunId, TrainingError, TrainingHyperParams, TrainingJobSpec, TrainingResult,
    write_iteration_log,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::Level;

pub const ITERATION_LOG_KEY: &str = "iteration_results";

/// Candidate values per hyperparameter. An empty list keeps the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub max_depth: Vec<u32>,
    pub num_class: Vec<usize>,
    pub eta: Vec<f32>,
    pub gamma: Vec<f32>,
    pub steps: Vec<usize>,
}

impl ParamGrid {
    /// Cartesian product applied over `base`, first axis varying slowest.
    #[must_use]
    pub fn combinations(&self, base: &TrainingHyperParams) -> Vec<TrainingHyperParams> {
        fn axis<T: Clone>(values: &[T], base: T) -> Vec<T> {
            if values.is_empty() { vec![base] } else { values.to_vec() }
        }

        let mut out = Vec::new();
        for max_depth in axis(&self.max_depth, base.max_depth) {
            for num_class in axis(&self.num_class, base.num_class) {
                for &eta in &axis(&self.eta, base.eta) {
                    for &gamma in &axis(&self.gamma, base.gamma) {
                        for steps in axis(&self.steps, base.steps) {
                            out.push(TrainingHyperParams {
                                max_depth,
                                num_class,
                                eta,
                                gamma,
                                steps,
                                ..base.clone()
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct SweepSpec {
    pub dataset: PathBuf,
    pub model_name: String,
    pub base: TrainingHyperParams,
    pub grid: ParamGrid,
}

/// Child view of a parent context for a single sweep iteration.
///
/// Artifact and result keys get a `-<iter>` suffix, relative target paths are
/// placed under `<iter>/` and log lines are tagged with the iteration.
pub struct IterationContext<'a> {
    parent: &'a mut dyn RunContext,
    iter: usize,
}

impl<'a> IterationContext<'a> {
    pub fn new(parent: &'a mut dyn RunContext, iter: usize) -> Self {
        Self { parent, iter }
    }

    fn child_key(&self, key: &str) -> String {
        format!("{key}-{}", self.iter)
    }

    fn child_target(&self, target: &Path) -> PathBuf {
        let dir = self.iter.to_string();
        if target.is_absolute() {
            let parent = target.parent().unwrap_or(target);
            let file_name = target.file_name().map(PathBuf::from).unwrap_or_default();
            parent.join(dir).join(file_name)
        } else {
            Path::new(&dir).join(target)
        }
    }
}

impl RunContext for IterationContext<'_> {
    fn run_id(&self) -> &RunId {
        self.parent.run_id()
    }

    fn log(&self, level: Level, message: &str) {
        self.parent.log(level, &format!("[iter {}] {message}", self.iter));
    }

    fn record_result(&mut self, key: &str, value: serde_json::Value) -> TrainingResult<()> {
        let key = self.child_key(key);
        self.parent.record_result(&key, value)
    }

    fn record_artifact(&mut self, mut request: ArtifactRequest) -> TrainingResult<ArtifactRecord> {
        request.key = self.child_key(&request.key);
        let target = request
            .target_path
            .take()
            .unwrap_or_else(|| PathBuf::from(request.default_file_name()));
        request.target_path = Some(self.child_target(&target));
        request.labels.insert("iteration".to_string(), self.iter.to_string());
        self.parent.record_artifact(request)
    }
}

fn grid_params(hp: &TrainingHyperParams) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("max_depth".to_string(), f64::from(hp.max_depth)),
        ("num_class".to_string(), hp.num_class as f64),
        ("eta".to_string(), f64::from(hp.eta)),
        ("gamma".to_string(), f64::from(hp.gamma)),
        ("steps".to_string(), hp.steps as f64),
    ])
}

/// Train once per grid combination and record the iteration log.
///
/// Failing iterations are logged and kept in the log with `state = error`;
/// only an invalid sweep definition or a failure to record the log aborts.
pub fn run_sweep(
    ctx: &mut dyn RunContext,
    spec: &SweepSpec,
) -> TrainingResult<Vec<IterationRecord>> {
    let combos = spec.grid.combinations(&spec.base);
    if combos.is_empty() {
        return Err(TrainingError::InvalidSpec("parameter grid is empty".to_string()));
    }
    let seed = spec.base.seed.unwrap_or_else(rand::random);
    ctx.info(&format!("running {} iterations with seed {seed}", combos.len()));
    if spec.base.seed.is_none() {
        ctx.record_result("seed", seed.into())?;
    }

    let mut records = Vec::with_capacity(combos.len());
    for (iter, hyperparams) in combos.into_iter().enumerate() {
        let params = grid_params(&hyperparams);
        let job = TrainingJobSpec {
            dataset: spec.dataset.clone(),
            model_name: spec.model_name.clone(),
            hyperparams: TrainingHyperParams {
                seed: Some(seed),
                ..hyperparams
            },
        };

        let mut child = IterationContext::new(ctx, iter);
        let (state, outputs) = match train_model(&mut child, &job) {
            Ok(report) => (
                IterationState::Completed,
                BTreeMap::from([("accuracy".to_string(), report.accuracy)]),
            ),
            Err(e) => {
                child.log(Level::ERROR, &format!("iteration failed: {e}"));
                (IterationState::Error, BTreeMap::new())
            }
        };
        records.push(IterationRecord {
            iter,
            state,
            params,
            outputs,
        });
    }

    let log = write_iteration_log(&records)?;
    ctx.record_artifact(ArtifactRequest::new(
        ITERATION_LOG_KEY,
        ArtifactKind::Table,
        "csv",
        log,
    ))?;

    let best = records
        .iter()
        .filter_map(|r| r.outputs.get("accuracy").map(|a| (r.iter, *a)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    match best {
        Some((iter, accuracy)) => {
            ctx.info(&format!("best iteration {iter} with accuracy {accuracy:.4}"));
            ctx.record_result("best_iteration", iter.into())?;
            ctx.record_result("accuracy", accuracy.into())?;
        }
        None => ctx.warn("no iteration completed"),
    }
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct GridSweep {
    pub spec: SweepSpec,
}

impl Handler for GridSweep {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn params(&self) -> BTreeMap<String, serde_json::Value> {
        let mut params = self.spec.base.as_params();
        params.insert("dataset".to_string(), self.spec.dataset.display().to_string().into());
        params.insert("model_name".to_string(), self.spec.model_name.clone().into());
        if let Ok(grid) = serde_json::to_value(&self.spec.grid) {
            params.insert("grid".to_string(), grid);
        }
        params
    }

    fn run(&self, ctx: &mut dyn RunContext) -> TrainingResult<()> {
        run_sweep(ctx, &self.spec).map(|_| ())
    }
}
