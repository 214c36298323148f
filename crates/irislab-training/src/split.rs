use crate::dataset::LabeledData;
use crate::error::{TrainingError, TrainingResult};
use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffle rows and split them into `(train, holdout)`.
///
/// The holdout receives `ceil(test_fraction * n)` rows; both sides must end up
/// non-empty.
pub fn train_test_split<R: Rng + ?Sized>(
    data: &LabeledData,
    test_fraction: f64,
    rng: &mut R,
) -> TrainingResult<(LabeledData, LabeledData)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrainingError::InvalidSpec(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n = data.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainingError::Dataset(format!(
            "cannot split {n} rows with test_fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok((data.select(train_idx), data.select(test_idx)))
}
