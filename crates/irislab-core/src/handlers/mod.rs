//! Pipeline stages.
//!
//! Each stage is a plain function taking a [`RunContext`] plus a small struct
//! implementing [`Handler`] so the stage can be driven by a tracked run.

pub mod generator;
pub mod plotter;
pub mod source;
pub mod trainer;

use irislab_training::{RunContext, TrainingResult};
use std::collections::BTreeMap;

pub use generator::{DATASET_ARTIFACT_KEY, IrisGenerator, generate_iris};
pub use plotter::{IterationPlotter, PLOT_ARTIFACT_KEY, PlotSpec, plot_iterations};
pub use source::{ByteSource, FileSource};
pub use trainer::{
    FRAMEWORK_LABEL, GbdtTrainer, MODEL_ARTIFACT_KEY, PER_CLASS_RESULT_KEY, TrainingReport,
    train_model,
};

/// A stage that can run inside a tracked run.
pub trait Handler {
    /// Name recorded in the run manifest.
    fn name(&self) -> &'static str;

    /// Parameters recorded in the run manifest before the stage starts.
    fn params(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }

    fn run(&self, ctx: &mut dyn RunContext) -> TrainingResult<()>;
}
