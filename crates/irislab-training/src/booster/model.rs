use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// Format version written into serialized models.
pub const MODEL_VERSION: i64 = 1;

/// One node of a regression tree. Children always sit after their parent in
/// the node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        /// Feature index used for the split.
        feature: u16,
        /// Rows with `feature < threshold` go left.
        threshold: f32,
        left: u32,
        right: u32,
    },
    Leaf {
        /// Margin contribution, already scaled by the learning rate.
        value: f32,
    },
}

/// Depth-limited regression tree; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = features.get(*feature as usize).copied().unwrap_or(0.0);
                    idx = if v < *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
            }
        }
        walk(&self.nodes, 0)
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                let (left, right) = (*left as usize, *right as usize);
                let n_nodes = self.nodes.len();
                if left <= idx || right <= idx || left >= n_nodes || right >= n_nodes {
                    return Err(format!("node {idx} has out-of-order children"));
                }
                if *feature as usize >= n_features {
                    return Err(format!("node {idx} splits on unknown feature {feature}"));
                }
            }
        }
        Ok(())
    }
}

/// Gradient-boosted tree ensemble for multi-class classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    pub model_version: i64,
    /// Names of the feature columns, in input order.
    pub feature_names: Vec<String>,
    pub num_class: usize,
    /// Initial margin for every class.
    pub base_score: f32,
    pub learning_rate: f32,
    /// Shape: `[n_rounds][num_class]`.
    pub trees: Vec<Vec<RegressionTree>>,
}

impl GbdtModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> TrainingResult<()> {
        if self.num_class < 2 {
            return Err(TrainingError::Model("model must contain at least 2 classes".to_string()));
        }
        for (round_idx, round) in self.trees.iter().enumerate() {
            if round.len() != self.num_class {
                return Err(TrainingError::Model(format!(
                    "round {round_idx} has {} trees but expected {}",
                    round.len(),
                    self.num_class
                )));
            }
            for (class_idx, tree) in round.iter().enumerate() {
                tree.validate(self.feature_names.len()).map_err(|e| {
                    TrainingError::Model(format!("round {round_idx} class {class_idx}: {e}"))
                })?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }

    /// Serialize the model to a byte blob.
    pub fn to_bytes(&self) -> TrainingResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Load a model previously produced by [`GbdtModel::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> TrainingResult<Self> {
        let model: Self = serde_json::from_slice(bytes)?;
        if model.model_version != MODEL_VERSION {
            return Err(TrainingError::Model(format!(
                "unsupported model version {} (expected {MODEL_VERSION})",
                model.model_version
            )));
        }
        model.validate()?;
        Ok(model)
    }

    /// Raw margins for a feature vector.
    pub fn predict_raw(&self, features: &[f32]) -> Vec<f32> {
        let mut raw = vec![self.base_score; self.num_class];
        for round in &self.trees {
            for (class_idx, tree) in round.iter().enumerate() {
                raw[class_idx] += tree.predict(features);
            }
        }
        raw
    }

    /// Class probabilities for a feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        softmax(&self.predict_raw(features))
    }

    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_raw(features))
    }

    /// Predicted class for every row. A row whose width differs from
    /// `feature_names` is an error rather than a prediction on missing values.
    pub fn predict_classes(&self, rows: &[Vec<f32>]) -> TrainingResult<Vec<usize>> {
        let n_features = self.feature_names.len();
        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                if row.len() != n_features {
                    return Err(TrainingError::Dataset(format!(
                        "row {idx} has {} features but the model was trained on {n_features}",
                        row.len()
                    )));
                }
                Ok(self.predict_class_index(row))
            })
            .collect()
    }
}

/// Numerically-stable softmax.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = raw.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_tree(feature: u16, threshold: f32, left: f32, right: f32) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: left },
                Node::Leaf { value: right },
            ],
        }
    }

    fn two_class_model() -> GbdtModel {
        GbdtModel {
            model_version: MODEL_VERSION,
            feature_names: vec!["a".into(), "b".into()],
            num_class: 2,
            base_score: 0.5,
            learning_rate: 1.0,
            trees: vec![vec![
                split_tree(0, 0.5, 1.0, -1.0),
                split_tree(0, 0.5, -1.0, 1.0),
            ]],
        }
    }

    #[test]
    fn tree_routes_strictly_below_threshold_left() {
        let tree = split_tree(0, 0.5, -1.0, 2.0);
        assert_eq!(tree.predict(&[0.4]), -1.0);
        assert_eq!(tree.predict(&[0.5]), 2.0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn model_predicts_argmax() {
        let model = two_class_model();
        assert_eq!(model.predict_class_index(&[0.0, 0.0]), 0);
        assert_eq!(model.predict_class_index(&[1.0, 0.0]), 1);
        let proba = model.predict_proba(&[0.0, 0.0]);
        assert!((proba.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn batch_prediction_checks_row_width() {
        let model = two_class_model();
        let rows = vec![vec![0.0, 0.0], vec![1.0, 0.0]];
        assert_eq!(model.predict_classes(&rows).unwrap(), vec![0, 1]);

        let short = vec![vec![0.0, 0.0], vec![1.0]];
        let err = model.predict_classes(&short).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
        assert!(err.to_string().contains("row 1 has 1 features"));
        assert!(model.predict_classes(&[vec![0.0, 0.0, 7.0]]).is_err());
    }

    #[test]
    fn bytes_reload_to_same_model() {
        let model = two_class_model();
        let loaded = GbdtModel::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let mut model = two_class_model();
        model.trees[0][0].nodes[0] = Node::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 2,
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn validate_rejects_wrong_round_width() {
        let mut model = two_class_model();
        model.trees[0].pop();
        assert!(matches!(model.validate(), Err(TrainingError::Model(_))));
    }

    #[test]
    fn softmax_handles_empty_and_large_values() {
        assert!(softmax(&[]).is_empty());
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
    }
}
