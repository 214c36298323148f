use crate::error::TrainingResult;
use crate::job::RunId;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "run_manifest.json";

/// Filesystem layout for tracked runs.
///
/// Layout is `<root>/runs/<run_id>/{run_manifest.json, artifacts/}`.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The same layout rooted at an absolute path, resolved against the
    /// current directory when `root` is relative. Artifact paths recorded
    /// under it stay valid from any working directory.
    pub fn absolute(&self) -> TrainingResult<Self> {
        Ok(Self {
            root: std::path::absolute(&self.root)?,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    #[must_use]
    pub fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.runs_dir().join(run_id.0.as_str())
    }

    #[must_use]
    pub fn manifest_path(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join(MANIFEST_FILE_NAME)
    }

    #[must_use]
    pub fn artifacts_dir(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join("artifacts")
    }

    pub fn ensure_run_dirs(&self, run_id: &RunId) -> TrainingResult<()> {
        std::fs::create_dir_all(self.artifacts_dir(run_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        let id = RunId("run-1".to_string());

        assert!(layout.run_dir(&id).ends_with("runs/run-1"));
        assert!(layout.manifest_path(&id).ends_with(MANIFEST_FILE_NAME));

        layout.ensure_run_dirs(&id).unwrap();
        assert!(layout.artifacts_dir(&id).is_dir());
    }

    #[test]
    fn test_absolute_resolves_relative_root() {
        let layout = RunLayout::new(PathBuf::from(".irislab")).absolute().unwrap();
        assert!(layout.root().is_absolute());
        assert!(layout.root().ends_with(".irislab"));

        let temp = TempDir::new().unwrap();
        let fixed = RunLayout::new(temp.path().to_path_buf()).absolute().unwrap();
        assert_eq!(fixed.root(), temp.path());
    }
}
