use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// Equal-width histogram with density normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `n_bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    /// `count / (total * bin_width)`; integrates to 1 when any value is present.
    pub density: Vec<f64>,
}

impl Histogram {
    /// Bin `values` into `num_bins` equal-width bins spanning their range.
    ///
    /// Bins are half-open except the last, which also holds the maximum. A
    /// constant input is widened by 0.5 on both sides; an empty input spans
    /// `[0, 1]` with zero density.
    pub fn compute(values: &[f64], num_bins: usize) -> TrainingResult<Self> {
        if num_bins == 0 {
            return Err(TrainingError::InvalidSpec("num_bins must be >= 1".to_string()));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(TrainingError::Dataset(format!("cannot bin non-finite value {bad}")));
        }

        let (mut lo, mut hi) = if values.is_empty() {
            (0.0, 1.0)
        } else {
            values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / num_bins as f64;
        let edges: Vec<f64> = (0..=num_bins)
            .map(|i| {
                if i == num_bins {
                    hi
                } else {
                    lo + width * i as f64
                }
            })
            .collect();

        let mut counts = vec![0u64; num_bins];
        for &v in values {
            let mut bin = ((v - lo) / width).floor() as usize;
            if bin >= num_bins {
                bin = num_bins - 1;
            }
            // floating error can put a value just below its edge
            while bin > 0 && v < edges[bin] {
                bin -= 1;
            }
            while bin + 1 < num_bins && v >= edges[bin + 1] {
                bin += 1;
            }
            counts[bin] += 1;
        }

        let total = values.len() as f64;
        let density = counts
            .iter()
            .zip(edges.windows(2))
            .map(|(&c, e)| {
                if total == 0.0 {
                    0.0
                } else {
                    c as f64 / (total * (e[1] - e[0]))
                }
            })
            .collect();

        Ok(Self {
            edges,
            counts,
            density,
        })
    }

    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    #[must_use]
    pub fn max_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0, f64::max)
    }
}
