use super::model::{GbdtModel, MODEL_VERSION, Node, RegressionTree, softmax};
use crate::dataset::LabeledData;
use crate::error::{TrainingError, TrainingResult};

const HESSIAN_FLOOR: f64 = 1e-16;
const MIN_GAIN: f64 = 1e-6;

/// Boosting hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of output classes; labels must be below this.
    pub num_class: usize,
    /// Number of boosting rounds.
    pub rounds: usize,
    /// Maximum depth of each tree.
    pub max_depth: u32,
    /// Shrinkage applied to every leaf weight.
    pub learning_rate: f32,
    /// Minimum loss reduction required to keep a split.
    pub gamma: f32,
    /// L2 regularization on leaf weights.
    pub lambda: f32,
    /// Minimum hessian sum on each side of a split.
    pub min_child_weight: f32,
    /// Initial margin for every class.
    pub base_score: f32,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            num_class: 10,
            rounds: 20,
            max_depth: 6,
            learning_rate: 0.2,
            gamma: 0.1,
            lambda: 1.0,
            min_child_weight: 1.0,
            base_score: 0.5,
        }
    }
}

impl TrainOptions {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.num_class < 2 {
            return Err(TrainingError::InvalidSpec("num_class must be >= 2".to_string()));
        }
        if self.rounds == 0 {
            return Err(TrainingError::InvalidSpec("rounds must be >= 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(TrainingError::InvalidSpec("max_depth must be >= 1".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainingError::InvalidSpec("learning_rate must be > 0".to_string()));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(TrainingError::InvalidSpec("gamma must be >= 0".to_string()));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(TrainingError::InvalidSpec("lambda must be >= 0".to_string()));
        }
        if !self.min_child_weight.is_finite() || self.min_child_weight < 0.0 {
            return Err(TrainingError::InvalidSpec("min_child_weight must be >= 0".to_string()));
        }
        Ok(())
    }
}

/// Train a multi-class tree ensemble with softmax gradient boosting.
///
/// Every round fits one tree per class on the first and second order
/// gradients of the softmax cross-entropy, evaluated against the margins at
/// the start of the round.
pub fn train_gbdt(data: &LabeledData, options: &TrainOptions) -> TrainingResult<GbdtModel> {
    options.validate()?;
    if data.x.len() != data.y.len() {
        return Err(TrainingError::Dataset("mismatched feature/label lengths".to_string()));
    }
    if data.is_empty() {
        return Err(TrainingError::Dataset("cannot train on an empty dataset".to_string()));
    }
    let n_features = data.feature_names.len();
    if n_features == 0 || n_features > usize::from(u16::MAX) {
        return Err(TrainingError::Dataset(format!("unsupported feature count {n_features}")));
    }
    if let Some((row, _)) = data.x.iter().enumerate().find(|(_, r)| r.len() != n_features) {
        return Err(TrainingError::Dataset(format!(
            "row {row} does not have {n_features} features"
        )));
    }
    if let Some(&label) = data.y.iter().find(|&&l| l >= options.num_class) {
        return Err(TrainingError::InvalidSpec(format!(
            "label {label} is out of range for num_class {} (labels must be in [0, num_class))",
            options.num_class
        )));
    }

    let n = data.len();
    let sorted = presort(&data.x, n_features);
    let mut margins = vec![vec![options.base_score; options.num_class]; n];
    let mut trees = Vec::with_capacity(options.rounds);

    for round in 0..options.rounds {
        let probs: Vec<Vec<f32>> = margins.iter().map(|m| softmax(m)).collect();
        let mut round_trees = Vec::with_capacity(options.num_class);

        for class_idx in 0..options.num_class {
            let grads = class_gradients(&data.y, &probs, class_idx);
            let tree = TreeBuilder {
                x: &data.x,
                grads: &grads,
                sorted: &sorted,
                options,
            }
            .build();
            for (row, margin) in data.x.iter().zip(margins.iter_mut()) {
                margin[class_idx] += tree.predict(row);
            }
            round_trees.push(tree);
        }

        tracing::trace!(round, "boosting round complete");
        trees.push(round_trees);
    }

    Ok(GbdtModel {
        model_version: MODEL_VERSION,
        feature_names: data.feature_names.clone(),
        num_class: options.num_class,
        base_score: options.base_score,
        learning_rate: options.learning_rate,
        trees,
    })
}

#[derive(Debug, Clone, Copy)]
struct GradPair {
    grad: f64,
    hess: f64,
}

fn class_gradients(y: &[usize], probs: &[Vec<f32>], class_idx: usize) -> Vec<GradPair> {
    y.iter()
        .zip(probs)
        .map(|(&label, p)| {
            let p = f64::from(p[class_idx]);
            let target = if label == class_idx { 1.0 } else { 0.0 };
            GradPair {
                grad: p - target,
                hess: (2.0 * p * (1.0 - p)).max(HESSIAN_FLOOR),
            }
        })
        .collect()
}

/// Row indices ordered by each feature's value.
fn presort(x: &[Vec<f32>], n_features: usize) -> Vec<Vec<usize>> {
    (0..n_features)
        .map(|j| {
            let mut idx: Vec<usize> = (0..x.len()).collect();
            idx.sort_by(|&a, &b| x[a][j].total_cmp(&x[b][j]));
            idx
        })
        .collect()
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: usize,
    threshold: f32,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f32>],
    grads: &'a [GradPair],
    sorted: &'a [Vec<usize>],
    options: &'a TrainOptions,
}

impl TreeBuilder<'_> {
    fn build(&self) -> RegressionTree {
        let rows: Vec<usize> = (0..self.x.len()).collect();
        let mut nodes = Vec::new();
        self.grow(&rows, 0, &mut nodes);
        RegressionTree { nodes }
    }

    fn grow(&self, rows: &[usize], depth: u32, nodes: &mut Vec<Node>) -> u32 {
        let (g, h) = self.sums(rows);
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            value: self.leaf_value(g, h),
        });

        if depth < self.options.max_depth {
            if let Some(split) = self.best_split(rows, g, h) {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .partition(|&&i| self.x[i][split.feature] < split.threshold);
                let left = self.grow(&left_rows, depth + 1, nodes);
                let right = self.grow(&right_rows, depth + 1, nodes);
                nodes[idx] = Node::Split {
                    feature: split.feature as u16,
                    threshold: split.threshold,
                    left,
                    right,
                };
            }
        }

        idx as u32
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        let g = rows.iter().map(|&i| self.grads[i].grad).sum();
        let h = rows.iter().map(|&i| self.grads[i].hess).sum();
        (g, h)
    }

    fn leaf_value(&self, g: f64, h: f64) -> f32 {
        let weight = -g / (h + f64::from(self.options.lambda));
        (weight * f64::from(self.options.learning_rate)) as f32
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + f64::from(self.options.lambda))
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        if rows.len() < 2 {
            return None;
        }
        let mut in_node = vec![false; self.x.len()];
        for &i in rows {
            in_node[i] = true;
        }

        let min_child = f64::from(self.options.min_child_weight);
        let parent = self.score(g, h);
        let mut best: Option<SplitCandidate> = None;

        for (feature, order) in self.sorted.iter().enumerate() {
            let mut gl = 0.0f64;
            let mut hl = 0.0f64;
            let mut prev: Option<f32> = None;

            for &i in order.iter().filter(|&&i| in_node[i]) {
                let v = self.x[i][feature];
                if let Some(pv) = prev {
                    let hr = h - hl;
                    if v > pv && hl >= min_child && hr >= min_child {
                        let gain = self.score(gl, hl) + self.score(g - gl, hr) - parent;
                        if best.as_ref().is_none_or(|b| gain > b.gain) {
                            let mut threshold = pv + (v - pv) / 2.0;
                            if threshold <= pv {
                                threshold = v;
                            }
                            best = Some(SplitCandidate {
                                feature,
                                threshold,
                                gain,
                            });
                        }
                    }
                }
                gl += self.grads[i].grad;
                hl += self.grads[i].hess;
                prev = Some(v);
            }
        }

        let gamma = f64::from(self.options.gamma);
        best.filter(|b| b.gain > gamma && b.gain > MIN_GAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iris::load_iris;

    fn iris_data() -> LabeledData {
        let iris = load_iris().unwrap();
        iris.features
            .hconcat(iris.labels)
            .unwrap()
            .split_target("label")
            .unwrap()
    }

    fn accuracy(model: &GbdtModel, data: &LabeledData) -> f64 {
        let correct = data
            .x
            .iter()
            .zip(&data.y)
            .filter(|(row, label)| model.predict_class_index(row) == **label)
            .count();
        correct as f64 / data.len() as f64
    }

    #[test]
    fn separable_data_is_learned() {
        let data = LabeledData {
            feature_names: vec!["x".to_string()],
            x: (0..20).map(|i| vec![i as f32]).collect(),
            y: (0..20).map(|i| usize::from(i >= 10)).collect(),
        };
        let options = TrainOptions {
            num_class: 2,
            rounds: 10,
            max_depth: 2,
            ..Default::default()
        };
        let model = train_gbdt(&data, &options).unwrap();
        assert_eq!(model.n_rounds(), 10);
        assert_eq!(accuracy(&model, &data), 1.0);
    }

    #[test]
    fn iris_training_fit_is_high() {
        let data = iris_data();
        let model = train_gbdt(&data, &TrainOptions::default()).unwrap();
        assert_eq!(model.num_class, 10);
        assert!(accuracy(&model, &data) > 0.95);
        for round in &model.trees {
            for tree in round {
                assert!(tree.depth() <= 6);
            }
        }
    }

    #[test]
    fn label_outside_num_class_is_rejected() {
        let data = iris_data();
        let options = TrainOptions {
            num_class: 2,
            ..Default::default()
        };
        let err = train_gbdt(&data, &options).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidSpec(_)));
    }

    #[test]
    fn huge_gamma_prunes_every_split() {
        let data = iris_data();
        let options = TrainOptions {
            gamma: 1.0e9,
            rounds: 2,
            ..Default::default()
        };
        let model = train_gbdt(&data, &options).unwrap();
        assert!(model.trees.iter().flatten().all(|t| t.n_leaves() == 1));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let data = iris_data();
        let invalid = [
            TrainOptions {
                rounds: 0,
                ..Default::default()
            },
            TrainOptions {
                max_depth: 0,
                ..Default::default()
            },
            TrainOptions {
                learning_rate: 0.0,
                ..Default::default()
            },
            TrainOptions {
                gamma: -1.0,
                ..Default::default()
            },
        ];
        for options in invalid {
            let result = train_gbdt(&data, &options);
            assert!(matches!(result, Err(TrainingError::InvalidSpec(_))));
        }
    }

    #[test]
    fn training_is_deterministic() {
        let data = iris_data();
        let options = TrainOptions {
            rounds: 3,
            ..Default::default()
        };
        let first = train_gbdt(&data, &options).unwrap();
        assert_eq!(first, train_gbdt(&data, &options).unwrap());
    }
}
