//! irislab training primitives
//!
//! Building blocks for the iris pipeline:
//! - Numeric tables, the built-in iris data and train/holdout splitting
//! - A softmax gradient-boosted tree classifier and its metrics
//! - Histograms and iteration logs
//! - Run tracking: the `RunContext` trait, artifacts, manifests, layout and registry

pub mod artifacts;
pub mod booster;
pub mod context;
pub mod dataset;
pub mod error;
pub mod histogram;
pub mod iris;
pub mod iterations;
pub mod job;
pub mod layout;
pub mod metrics;
pub mod registry;
pub mod split;

pub use artifacts::{
    ArtifactKind, ArtifactRecord, ArtifactRequest, RunManifest, RunState, sha256_bytes, sha256_file,
};
pub use booster::{GbdtModel, TrainOptions, train_gbdt};
pub use context::{MemoryRunContext, RunContext};
pub use dataset::{LABEL_COLUMN, LabeledData, Table};
pub use error::{TrainingError, TrainingResult};
pub use histogram::Histogram;
pub use iris::{IrisData, load_iris};
pub use iterations::{IterationRecord, IterationState, read_output_column, write_iteration_log};
pub use job::{DEFAULT_MODEL_NAME, RunId, TrainingHyperParams, TrainingJobSpec};
pub use layout::RunLayout;
pub use metrics::{ConfusionMatrix, PerClassStats, accuracy_score, precision_recall_by_class};
pub use registry::{discover_runs, load_run, read_manifest, write_manifest};
pub use split::train_test_split;
