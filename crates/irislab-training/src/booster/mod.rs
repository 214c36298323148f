//! Gradient-boosted decision-tree classifier.
//!
//! Multi-class classification via softmax boosting with depth-limited,
//! second-order regression trees. Models serialize to JSON bytes and reload to
//! identical predictions.

mod model;
mod train;

pub use model::{GbdtModel, MODEL_VERSION, Node, RegressionTree, argmax, softmax};
pub use train::{TrainOptions, train_gbdt};
