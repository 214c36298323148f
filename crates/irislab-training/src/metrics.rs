//! Evaluation metrics for classification models.

use crate::error::{TrainingError, TrainingResult};
use serde::Serialize;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn from_predictions(
        n_classes: usize,
        truth: &[usize],
        predicted: &[usize],
    ) -> TrainingResult<Self> {
        check_lengths(truth, predicted)?;
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        Ok(cm)
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }
}

/// Precision/recall statistics for a single class.
#[derive(Debug, Clone, Serialize)]
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    pub support: u32,
}

pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    (0..k)
        .map(|class_idx| {
            let tp = f64::from(cm.get(class_idx, class_idx));
            let support: u32 = (0..k).map(|j| cm.get(class_idx, j)).sum();
            let fn_ = f64::from(support) - tp;
            let fp: f64 = (0..k)
                .filter(|&i| i != class_idx)
                .map(|i| f64::from(cm.get(i, class_idx)))
                .sum();
            PerClassStats {
                precision: if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) },
                recall: if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) },
                support,
            }
        })
        .collect()
}

/// Fraction of rows whose predicted label equals the true label.
pub fn accuracy_score(truth: &[usize], predicted: &[usize]) -> TrainingResult<f64> {
    check_lengths(truth, predicted)?;
    if truth.is_empty() {
        return Err(TrainingError::Dataset("accuracy of an empty set is undefined".to_string()));
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / truth.len() as f64)
}

fn check_lengths(truth: &[usize], predicted: &[usize]) -> TrainingResult<()> {
    if truth.len() != predicted.len() {
        return Err(TrainingError::Dataset(format!(
            "found {} true labels but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    Ok(())
}
