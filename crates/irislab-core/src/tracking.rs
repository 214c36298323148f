//! Filesystem-backed run tracking.

use crate::error::Result;
use crate::handlers::Handler;
use irislab_training::{
    ArtifactRecord, ArtifactRequest, RunContext, RunId, RunLayout, RunManifest, TrainingResult,
    sha256_bytes, write_manifest,
};
use std::collections::BTreeMap;
use tracing::Level;

/// A run context that persists artifacts and a JSON manifest under a
/// [`RunLayout`]. The manifest is rewritten after every recorded item.
#[derive(Debug)]
pub struct FsRunContext {
    layout: RunLayout,
    manifest: RunManifest,
}

impl FsRunContext {
    pub fn create(
        layout: RunLayout,
        handler: &str,
        params: BTreeMap<String, serde_json::Value>,
    ) -> TrainingResult<Self> {
        let layout = layout.absolute()?;
        let run_id = RunId::new();
        layout.ensure_run_dirs(&run_id)?;
        let mut manifest = RunManifest::new(run_id, handler);
        manifest.params = params;

        let ctx = Self { layout, manifest };
        ctx.persist()?;
        tracing::debug!(run_id = %ctx.manifest.run_id, handler, "run started");
        Ok(ctx)
    }

    #[must_use]
    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    #[must_use]
    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// Close the run, marking it failed when `error` is set.
    pub fn finish(mut self, error: Option<String>) -> TrainingResult<RunManifest> {
        self.manifest.finish(error);
        self.persist()?;
        tracing::debug!(
            run_id = %self.manifest.run_id,
            state = ?self.manifest.state,
            "run finished"
        );
        Ok(self.manifest)
    }

    fn persist(&self) -> TrainingResult<()> {
        write_manifest(&self.layout.manifest_path(&self.manifest.run_id), &self.manifest)
    }
}

impl RunContext for FsRunContext {
    fn run_id(&self) -> &RunId {
        &self.manifest.run_id
    }

    fn log(&self, level: Level, message: &str) {
        let run_id = &self.manifest.run_id;
        match level {
            Level::ERROR => tracing::error!(%run_id, "{message}"),
            Level::WARN => tracing::warn!(%run_id, "{message}"),
            Level::INFO => tracing::info!(%run_id, "{message}"),
            Level::DEBUG => tracing::debug!(%run_id, "{message}"),
            _ => tracing::trace!(%run_id, "{message}"),
        }
    }

    fn record_result(&mut self, key: &str, value: serde_json::Value) -> TrainingResult<()> {
        tracing::debug!(run_id = %self.manifest.run_id, key, %value, "result recorded");
        self.manifest.results.insert(key.to_string(), value);
        self.persist()
    }

    fn record_artifact(&mut self, request: ArtifactRequest) -> TrainingResult<ArtifactRecord> {
        request.validate()?;
        let artifacts_dir = self.layout.artifacts_dir(&self.manifest.run_id);
        let path = match &request.target_path {
            Some(target) if target.is_absolute() => target.clone(),
            Some(target) => artifacts_dir.join(target),
            None => artifacts_dir.join(request.default_file_name()),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &request.body)?;

        let record = ArtifactRecord {
            key: request.key,
            kind: request.kind,
            format: request.format,
            path,
            size_bytes: request.body.len() as u64,
            sha256: sha256_bytes(&request.body),
            labels: request.labels,
        };
        tracing::debug!(
            run_id = %self.manifest.run_id,
            key = %record.key,
            path = %record.path.display(),
            "artifact stored"
        );
        self.manifest.upsert_artifact(record.clone());
        self.persist()?;
        Ok(record)
    }
}

/// Run a handler in a fresh tracked run under `layout`.
///
/// The manifest is left in the `failed` state with the error message when the
/// handler fails; the handler's error is returned unchanged.
pub fn execute(layout: &RunLayout, handler: &dyn Handler) -> Result<RunManifest> {
    let mut ctx = FsRunContext::create(layout.clone(), handler.name(), handler.params())?;
    match handler.run(&mut ctx) {
        Ok(()) => Ok(ctx.finish(None)?),
        Err(e) => {
            ctx.finish(Some(e.to_string()))?;
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irislab_training::{ArtifactKind, RunState, read_manifest};
    use tempfile::TempDir;

    #[test]
    fn test_artifacts_land_in_run_dir_with_digest() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        let mut ctx = FsRunContext::create(layout.clone(), "test", BTreeMap::new()).unwrap();

        let notes = ArtifactRequest::new("notes", ArtifactKind::Other, "txt", b"abc".to_vec());
        let record = ctx.record_artifact(notes).unwrap();
        assert_eq!(record.path, layout.artifacts_dir(ctx.run_id()).join("notes.txt"));
        assert_eq!(std::fs::read(&record.path).unwrap(), b"abc");
        assert_eq!(record.sha256, sha256_bytes(b"abc"));

        let model = ArtifactRequest::new("model", ArtifactKind::Model, "json", b"{}".to_vec())
            .with_target_path("m/model.bst");
        let nested = ctx.record_artifact(model).unwrap();
        assert!(nested.path.ends_with("artifacts/m/model.bst"));

        let absolute = temp.path().join("elsewhere.csv");
        let table = ArtifactRequest::new("t", ArtifactKind::Table, "csv", vec![])
            .with_target_path(&absolute);
        let outside = ctx.record_artifact(table).unwrap();
        assert_eq!(outside.path, absolute);
    }

    #[test]
    fn test_manifest_tracks_results_and_state() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        let mut ctx = FsRunContext::create(layout.clone(), "test", BTreeMap::new()).unwrap();
        let run_id = ctx.run_id().clone();

        ctx.record_result("accuracy", serde_json::json!(0.9)).unwrap();
        let on_disk = read_manifest(&layout.manifest_path(&run_id)).unwrap();
        assert_eq!(on_disk.state, RunState::Running);
        assert_eq!(on_disk.results["accuracy"], serde_json::json!(0.9));

        let manifest = ctx.finish(Some("boom".to_string())).unwrap();
        assert_eq!(manifest.state, RunState::Failed);
        let on_disk = read_manifest(&layout.manifest_path(&run_id)).unwrap();
        assert_eq!(on_disk.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_relative_root_records_absolute_paths() {
        let temp = TempDir::new().unwrap();
        let cwd = std::env::current_dir().unwrap();
        let relative = relative_to(&cwd, temp.path());
        let layout = RunLayout::new(relative);
        let mut ctx = FsRunContext::create(layout, "test", BTreeMap::new()).unwrap();
        assert!(ctx.layout().root().is_absolute());

        let notes = ArtifactRequest::new("notes", ArtifactKind::Other, "txt", b"abc".to_vec());
        let record = ctx.record_artifact(notes).unwrap();
        assert!(record.path.is_absolute());
        let expected = std::fs::canonicalize(temp.path())
            .unwrap()
            .join("runs")
            .join(ctx.run_id().0.as_str())
            .join("artifacts/notes.txt");
        assert_eq!(std::fs::canonicalize(&record.path).unwrap(), expected);
        assert_eq!(std::fs::read(&record.path).unwrap(), b"abc");
    }

    /// `target` spelled relative to `base` through `..` components.
    fn relative_to(base: &std::path::Path, target: &std::path::Path) -> std::path::PathBuf {
        let mut relative = std::path::PathBuf::new();
        for _ in base.components().skip(1) {
            relative.push("..");
        }
        relative.extend(target.components().skip(1));
        relative
    }
}
