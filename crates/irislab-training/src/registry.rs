use crate::artifacts::RunManifest;
use crate::error::{TrainingError, TrainingResult};
use crate::job::RunId;
use crate::layout::{MANIFEST_FILE_NAME, RunLayout};
use std::path::Path;

pub fn read_manifest(path: &Path) -> TrainingResult<RunManifest> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice::<RunManifest>(&bytes)?)
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> TrainingResult<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Discover runs by scanning `<root>/runs/*/run_manifest.json`, newest first.
///
/// Directories without a manifest are skipped.
pub fn discover_runs(root: &Path) -> TrainingResult<Vec<RunManifest>> {
    let layout = RunLayout::new(root.to_path_buf());
    let mut out = Vec::new();

    let dir = match std::fs::read_dir(layout.runs_dir()) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e.into()),
    };

    for entry in dir {
        let run_dir = entry?.path();
        if !run_dir.is_dir() {
            continue;
        }
        let manifest_path = run_dir.join(MANIFEST_FILE_NAME);
        if !manifest_path.exists() {
            continue;
        }
        out.push(read_manifest(&manifest_path)?);
    }

    out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.run_id.cmp(&b.run_id)));
    Ok(out)
}

/// Load the manifest of one run.
pub fn load_run(root: &Path, run_id: &RunId) -> TrainingResult<RunManifest> {
    let path = RunLayout::new(root.to_path_buf()).manifest_path(run_id);
    if !path.exists() {
        return Err(TrainingError::InvalidSpec(format!(
            "run not found (missing manifest): {run_id}"
        )));
    }
    read_manifest(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_run(layout: &RunLayout, id: &str, handler: &str) -> RunManifest {
        let run_id = RunId(id.to_string());
        layout.ensure_run_dirs(&run_id).unwrap();
        let manifest = RunManifest::new(run_id.clone(), handler);
        write_manifest(&layout.manifest_path(&run_id), &manifest).unwrap();
        manifest
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(discover_runs(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_discover_and_load() {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path().to_path_buf());
        write_run(&layout, "a", "train");
        std::thread::sleep(std::time::Duration::from_millis(5));
        write_run(&layout, "b", "plot");
        std::fs::create_dir_all(layout.runs_dir().join("empty")).unwrap();

        let runs = discover_runs(temp.path()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id.0, "b");

        let loaded = load_run(temp.path(), &RunId("a".to_string())).unwrap();
        assert_eq!(loaded.handler, "train");
        assert!(load_run(temp.path(), &RunId("zzz".to_string())).is_err());
    }
}
