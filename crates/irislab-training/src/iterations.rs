//! Iteration logs: one row per child run, `param.*` inputs and `output.*` results.

use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const OUTPUT_PREFIX: &str = "output.";
pub const PARAM_PREFIX: &str = "param.";

#[must_use]
pub fn output_column_name(col: &str) -> String {
    format!("{OUTPUT_PREFIX}{col}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationState {
    Completed,
    Error,
}

impl fmt::Display for IterationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iter: usize,
    pub state: IterationState,
    pub params: BTreeMap<String, f64>,
    pub outputs: BTreeMap<String, f64>,
}

/// Encode iteration records as CSV with columns
/// `iter, state, param.*, output.*`. Missing values are left empty.
pub fn write_iteration_log(records: &[IterationRecord]) -> TrainingResult<Vec<u8>> {
    let params: BTreeSet<&str> =
        records.iter().flat_map(|r| r.params.keys().map(String::as_str)).collect();
    let outputs: BTreeSet<&str> =
        records.iter().flat_map(|r| r.outputs.keys().map(String::as_str)).collect();

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let mut header = vec!["iter".to_string(), "state".to_string()];
    header.extend(params.iter().map(|p| format!("{PARAM_PREFIX}{p}")));
    header.extend(outputs.iter().map(|o| output_column_name(o)));
    writer.write_record(&header)?;

    let cell = |values: &BTreeMap<String, f64>, name: &str| {
        values.get(name).map(ToString::to_string).unwrap_or_default()
    };
    for record in records {
        let mut row = vec![record.iter.to_string(), record.state.to_string()];
        row.extend(params.iter().map(|p| cell(&record.params, p)));
        row.extend(outputs.iter().map(|o| cell(&record.outputs, o)));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| TrainingError::Dataset(format!("failed to finish iteration log: {e}")))
}

/// Read the numeric values of `output.<col>` from an iteration log.
///
/// Empty cells (iterations that produced no output) are skipped.
pub fn read_output_column(bytes: &[u8], col: &str) -> TrainingResult<Vec<f64>> {
    let name = output_column_name(col);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = rdr.headers()?.clone();
    let idx = headers.iter().position(|h| h == name).ok_or_else(|| {
        let available: Vec<&str> =
            headers.iter().filter(|h| h.starts_with(OUTPUT_PREFIX)).collect();
        TrainingError::Dataset(format!(
            "column '{name}' not found in iteration log (available outputs: [{}])",
            available.join(", ")
        ))
    })?;

    let mut values = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = record.get(idx).unwrap_or("");
        if cell.is_empty() {
            continue;
        }
        let value = cell.parse::<f64>().map_err(|_| {
            TrainingError::Dataset(format!(
                "row {}: '{cell}' in column '{name}' is not numeric",
                row + 1
            ))
        })?;
        values.push(value);
    }
    Ok(values)
}
