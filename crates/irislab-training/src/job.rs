use crate::booster::TrainOptions;
use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier for a tracked run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub const DEFAULT_MODEL_NAME: &str = "model.bst";

/// Hyperparameters of the trainer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingHyperParams {
    pub max_depth: u32,
    pub num_class: usize,
    /// Learning rate.
    pub eta: f32,
    /// Minimum loss reduction to keep a split.
    pub gamma: f32,
    /// Boosting rounds.
    pub steps: usize,
    /// Seed for the train/holdout shuffle; drawn from entropy when absent.
    pub seed: Option<u64>,
    pub test_fraction: f64,
}

impl Default for TrainingHyperParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            num_class: 10,
            eta: 0.2,
            gamma: 0.1,
            steps: 20,
            seed: None,
            test_fraction: 0.2,
        }
    }
}

impl TrainingHyperParams {
    pub fn validate(&self) -> TrainingResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TrainingError::InvalidSpec("test_fraction must be in (0, 1)".to_string()));
        }
        self.train_options().validate()
    }

    #[must_use]
    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            num_class: self.num_class,
            rounds: self.steps,
            max_depth: self.max_depth,
            learning_rate: self.eta,
            gamma: self.gamma,
            ..TrainOptions::default()
        }
    }

    /// Flat view recorded as run parameters.
    #[must_use]
    pub fn as_params(&self) -> BTreeMap<String, serde_json::Value> {
        let mut params = BTreeMap::new();
        params.insert("max_depth".to_string(), self.max_depth.into());
        params.insert("num_class".to_string(), self.num_class.into());
        params.insert("eta".to_string(), f64::from(self.eta).into());
        params.insert("gamma".to_string(), f64::from(self.gamma).into());
        params.insert("steps".to_string(), self.steps.into());
        params.insert("test_fraction".to_string(), self.test_fraction.into());
        if let Some(seed) = self.seed {
            params.insert("seed".to_string(), seed.into());
        }
        params
    }
}

/// Everything the trainer stage needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJobSpec {
    pub dataset: PathBuf,
    pub model_name: String,
    #[serde(default)]
    pub hyperparams: TrainingHyperParams,
}

impl TrainingJobSpec {
    #[must_use]
    pub fn new(dataset: PathBuf) -> Self {
        Self {
            dataset,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            hyperparams: TrainingHyperParams::default(),
        }
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.dataset.as_os_str().is_empty() {
            return Err(TrainingError::InvalidSpec("dataset path is required".to_string()));
        }
        if self.model_name.trim().is_empty() {
            return Err(TrainingError::InvalidSpec("model_name is required".to_string()));
        }
        self.hyperparams.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline() {
        let hp = TrainingHyperParams::default();
        assert_eq!(hp.max_depth, 6);
        assert_eq!(hp.num_class, 10);
        assert!((hp.eta - 0.2).abs() < f32::EPSILON);
        assert!((hp.gamma - 0.1).abs() < f32::EPSILON);
        assert_eq!(hp.steps, 20);
        assert!(hp.validate().is_ok());
    }

    #[test]
    fn test_job_spec_validate_requires_fields() {
        let mut spec = TrainingJobSpec::new(PathBuf::new());
        assert!(spec.validate().is_err());
        spec.dataset = PathBuf::from("iris.csv");
        spec.model_name = " ".to_string();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_params_include_seed_only_when_set() {
        let mut hp = TrainingHyperParams::default();
        assert!(!hp.as_params().contains_key("seed"));
        hp.seed = Some(42);
        assert_eq!(hp.as_params()["seed"], serde_json::json!(42));
    }

    #[test]
    fn test_partial_params_keep_defaults() {
        let hp: TrainingHyperParams = serde_json::from_str(r#"{"max_depth": 3}"#).unwrap();
        assert_eq!(hp.max_depth, 3);
        assert_eq!(hp.steps, 20);
    }
}
