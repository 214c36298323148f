use crate::artifacts::{ArtifactRecord, ArtifactRequest, sha256_bytes};
use crate::error::TrainingResult;
use crate::job::RunId;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

/// Tracking context injected into every pipeline stage.
///
/// Stages log through it, record named scalar results and hand it artifacts
/// to persist. Implementations decide where things end up.
pub trait RunContext {
    fn run_id(&self) -> &RunId;

    fn log(&self, level: Level, message: &str);

    fn record_result(&mut self, key: &str, value: serde_json::Value) -> TrainingResult<()>;

    fn record_artifact(&mut self, request: ArtifactRequest) -> TrainingResult<ArtifactRecord>;

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }
}

/// A context that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryRunContext {
    run_id: RunId,
    logs: Mutex<Vec<(Level, String)>>,
    pub results: BTreeMap<String, serde_json::Value>,
    pub artifacts: BTreeMap<String, (ArtifactRecord, Vec<u8>)>,
}

impl MemoryRunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logs(&self) -> Vec<(Level, String)> {
        self.logs.lock().map(|l| l.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn artifact_body(&self, key: &str) -> Option<&[u8]> {
        self.artifacts.get(key).map(|(_, body)| body.as_slice())
    }
}

impl RunContext for MemoryRunContext {
    fn run_id(&self) -> &RunId {
        &self.run_id
    }

    fn log(&self, level: Level, message: &str) {
        tracing::event!(
            target: "irislab::run",
            Level::DEBUG,
            run_id = %self.run_id,
            %level,
            "{message}"
        );
        if let Ok(mut logs) = self.logs.lock() {
            logs.push((level, message.to_string()));
        }
    }

    fn record_result(&mut self, key: &str, value: serde_json::Value) -> TrainingResult<()> {
        self.results.insert(key.to_string(), value);
        Ok(())
    }

    fn record_artifact(&mut self, request: ArtifactRequest) -> TrainingResult<ArtifactRecord> {
        request.validate()?;
        let path = request
            .target_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(request.default_file_name()));
        let record = ArtifactRecord {
            key: request.key.clone(),
            kind: request.kind,
            format: request.format.clone(),
            path,
            size_bytes: request.body.len() as u64,
            sha256: sha256_bytes(&request.body),
            labels: request.labels.clone(),
        };
        self.artifacts.insert(request.key, (record.clone(), request.body));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactKind;

    #[test]
    fn test_memory_context_records_everything() {
        let mut ctx = MemoryRunContext::new();
        ctx.info("hello");
        ctx.record_result("accuracy", serde_json::json!(0.5)).unwrap();
        let request = ArtifactRequest::new("myfig", ArtifactKind::Plot, "svg", b"<svg/>".to_vec());
        let record = ctx.record_artifact(request).unwrap();

        assert_eq!(ctx.logs(), vec![(Level::INFO, "hello".to_string())]);
        assert_eq!(ctx.results["accuracy"], serde_json::json!(0.5));
        assert_eq!(record.path, PathBuf::from("myfig.svg"));
        assert_eq!(ctx.artifact_body("myfig"), Some(b"<svg/>".as_slice()));
    }

    #[test]
    fn test_memory_context_rejects_bad_key() {
        let mut ctx = MemoryRunContext::new();
        let request = ArtifactRequest::new("", ArtifactKind::Other, "", vec![]);
        assert!(ctx.record_artifact(request).is_err());
    }
}
