//! Built-in copy of Fisher's iris measurements.

use crate::dataset::{LABEL_COLUMN, Table};
use crate::error::{TrainingError, TrainingResult};

const IRIS_CSV: &str = include_str!("../data/iris.csv");

pub const IRIS_FEATURE_NAMES: [&str; 4] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];

/// The reference dataset, split the way it is usually shipped: a feature table
/// and a single-column `label` table.
#[derive(Debug, Clone)]
pub struct IrisData {
    pub features: Table,
    pub labels: Table,
}

pub fn load_iris() -> TrainingResult<IrisData> {
    let table = Table::read_csv(IRIS_CSV.as_bytes())?;
    let label_idx = table.column_index(LABEL_COLUMN).ok_or_else(|| {
        TrainingError::Dataset("embedded iris data has no label column".to_string())
    })?;

    let feature_columns: Vec<String> =
        IRIS_FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect();
    let mut features = Table::new(feature_columns);
    let mut labels = Table::new(vec![LABEL_COLUMN.to_string()]);

    for row in table.rows() {
        let mut values = row.clone();
        let label = values.remove(label_idx);
        features.push_row(values)?;
        labels.push_row(vec![label])?;
    }

    Ok(IrisData { features, labels })
}
