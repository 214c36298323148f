use crate::dataset::Table;
use crate::error::{TrainingError, TrainingResult};
use crate::job::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Table,
    Model,
    Plot,
    Other,
}

/// An artifact a stage asks the run context to persist.
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    pub key: String,
    pub kind: ArtifactKind,
    /// File extension of the body (`csv`, `json`, `svg`, ...).
    pub format: String,
    pub body: Vec<u8>,
    /// Explicit destination; relative paths resolve against the run's artifact dir.
    pub target_path: Option<PathBuf>,
    pub labels: BTreeMap<String, String>,
}

impl ArtifactRequest {
    pub fn new(
        key: impl Into<String>,
        kind: ArtifactKind,
        format: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            format: format.into(),
            body,
            target_path: None,
            labels: BTreeMap::new(),
        }
    }

    pub fn table(key: impl Into<String>, table: &Table) -> TrainingResult<Self> {
        Ok(Self::new(key, ArtifactKind::Table, "csv", table.to_csv_bytes()?))
    }

    #[must_use]
    pub fn with_target_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.target_path = Some(path);
        }
        self
    }

    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.key.trim().is_empty() {
            return Err(TrainingError::Artifact("artifact key must not be empty".to_string()));
        }
        if self.key.contains(['/', '\\']) {
            return Err(TrainingError::Artifact(format!(
                "artifact key '{}' must not contain path separators",
                self.key
            )));
        }
        Ok(())
    }

    /// File name used when no target path is given.
    #[must_use]
    pub fn default_file_name(&self) -> String {
        if self.format.is_empty() {
            self.key.clone()
        } else {
            format!("{}.{}", self.key, self.format)
        }
    }
}

/// A persisted artifact as recorded in the run manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub key: String,
    pub kind: ArtifactKind,
    pub format: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub sha256: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub handler: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub state: RunState,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub results: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RunManifest {
    #[must_use]
    pub fn new(run_id: RunId, handler: impl Into<String>) -> Self {
        Self {
            run_id,
            handler: handler.into(),
            created_at: Utc::now(),
            finished_at: None,
            state: RunState::Running,
            params: BTreeMap::new(),
            results: BTreeMap::new(),
            artifacts: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn artifact(&self, key: &str) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.key == key)
    }

    /// Insert or replace the record with the same key.
    pub fn upsert_artifact(&mut self, record: ArtifactRecord) {
        if let Some(existing) = self.artifacts.iter_mut().find(|a| a.key == record.key) {
            *existing = record;
        } else {
            self.artifacts.push(record);
        }
    }

    pub fn finish(&mut self, error: Option<String>) {
        self.finished_at = Some(Utc::now());
        self.state = if error.is_some() {
            RunState::Failed
        } else {
            RunState::Completed
        };
        self.error = error;
    }
}

#[must_use]
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn sha256_file(path: &Path) -> TrainingResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(sha256_bytes(&bytes))
}
