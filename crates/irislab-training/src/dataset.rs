use crate::error::{TrainingError, TrainingResult};
use std::io::Read;
use std::path::Path;

/// Name of the target column in every labeled table.
pub const LABEL_COLUMN: &str = "label";

/// Row-aligned numeric table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> TrainingResult<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<f64>) -> TrainingResult<()> {
        if row.len() != self.columns.len() {
            return Err(TrainingError::Dataset(format!(
                "row {} has {} values but the table has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> TrainingResult<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TrainingError::Dataset(format!("column '{name}' not found")))?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Join two tables side by side. Both must have the same number of rows.
    pub fn hconcat(mut self, other: Self) -> TrainingResult<Self> {
        if self.rows.len() != other.rows.len() {
            return Err(TrainingError::Dataset(format!(
                "cannot concatenate tables with {} and {} rows",
                self.rows.len(),
                other.rows.len()
            )));
        }
        for name in &other.columns {
            if self.columns.contains(name) {
                return Err(TrainingError::Dataset(format!("duplicate column '{name}'")));
            }
        }
        self.columns.extend(other.columns);
        for (row, extra) in self.rows.iter_mut().zip(other.rows) {
            row.extend(extra);
        }
        Ok(self)
    }

    /// Parse a headed CSV where every cell is numeric.
    pub fn read_csv<R: Read>(reader: R) -> TrainingResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(ToString::to_string).collect();
        if columns.is_empty() {
            return Err(TrainingError::Dataset("csv has no header row".to_string()));
        }

        let mut table = Self::new(columns);
        for (idx, record) in rdr.records().enumerate() {
            let record = record?;
            let mut row = Vec::with_capacity(record.len());
            for (col, cell) in record.iter().enumerate() {
                let value = cell.parse::<f64>().map_err(|_| {
                    TrainingError::Dataset(format!(
                        "row {} column '{}': '{}' is not numeric",
                        idx + 1,
                        table.columns.get(col).map_or("?", String::as_str),
                        cell
                    ))
                })?;
                row.push(value);
            }
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn read_csv_path(path: &Path) -> TrainingResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_csv(file)
    }

    pub fn to_csv_bytes(&self) -> TrainingResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(f64::to_string))?;
        }
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| TrainingError::Dataset(format!("failed to finish csv buffer: {e}")))
    }

    /// Split into features (every column but `target`) and integer class labels.
    pub fn split_target(&self, target: &str) -> TrainingResult<LabeledData> {
        let target_idx = self.column_index(target).ok_or_else(|| {
            TrainingError::Dataset(format!("target column '{target}' not found in dataset"))
        })?;

        let feature_names: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, c)| c.clone())
            .collect();

        let mut x = Vec::with_capacity(self.rows.len());
        let mut y = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let label = row[target_idx];
            if !label.is_finite() || label < 0.0 || label.fract() != 0.0 {
                return Err(TrainingError::InvalidSpec(format!(
                    "row {}: label {label} is not a non-negative integer",
                    row_idx + 1
                )));
            }
            y.push(label as usize);
            x.push(
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != target_idx)
                    .map(|(_, v)| *v as f32)
                    .collect(),
            );
        }

        Ok(LabeledData {
            feature_names,
            x,
            y,
        })
    }
}

/// Feature matrix with aligned class indices.
#[derive(Debug, Clone, Default)]
pub struct LabeledData {
    pub feature_names: Vec<String>,
    /// Row-major feature matrix.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

impl LabeledData {
    #[must_use]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of distinct label values implied by the largest label.
    #[must_use]
    pub fn label_range(&self) -> usize {
        self.y.iter().max().map_or(0, |m| m + 1)
    }

    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}
