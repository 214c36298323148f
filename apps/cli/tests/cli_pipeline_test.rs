//! Integration tests for the `irislab` pipeline commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Command isolated from any user configuration.
fn irislab(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("irislab").unwrap();
    cmd.current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn generate(temp_dir: &TempDir) -> PathBuf {
    let target = temp_dir.path().join("iris.csv");
    irislab(temp_dir)
        .args(["generate", "--target"])
        .arg(&target)
        .assert()
        .success();
    target
}

fn artifact_path(manifest: &serde_json::Value, key: &str) -> PathBuf {
    let artifact = manifest["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["key"] == key)
        .unwrap_or_else(|| panic!("artifact {key} missing"));
    PathBuf::from(artifact["path"].as_str().unwrap())
}

#[test]
fn test_generate_writes_iris_csv() {
    let temp_dir = TempDir::new().unwrap();
    let target = generate(&temp_dir);

    let content = fs::read_to_string(&target).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "sepal length (cm),sepal width (cm),petal length (cm),petal width (cm),label"
    );
    assert_eq!(lines.count(), 150);
    assert!(temp_dir.path().join(".irislab").join("runs").is_dir());
}

#[test]
fn test_train_with_seed_reports_accuracy() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = generate(&temp_dir);

    let manifest = json_stdout(
        irislab(&temp_dir)
            .args(["train", "--seed", "42", "--json", "--dataset"])
            .arg(&dataset),
    );
    assert_eq!(manifest["state"], "completed");
    let accuracy = manifest["results"]["accuracy"].as_f64().unwrap();
    assert!(accuracy >= 0.85, "accuracy {accuracy}");

    let model = artifact_path(&manifest, "model");
    assert!(model.ends_with("model.bst"));
    assert!(model.is_file());
}

#[test]
fn test_train_human_output() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = generate(&temp_dir);

    irislab(&temp_dir)
        .args(["train", "--seed", "1", "--steps", "3", "--model-name", "small.bst", "--dataset"])
        .arg(&dataset)
        .assert()
        .success()
        .stdout(predicate::str::contains("accuracy").and(predicate::str::contains("small.bst")));
}

#[test]
fn test_train_missing_label_fails() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = temp_dir.path().join("nolabel.csv");
    fs::write(&dataset, "a,b\n1,2\n3,4\n").unwrap();

    irislab(&temp_dir)
        .args(["train", "--dataset"])
        .arg(&dataset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("label"));
}

#[test]
fn test_train_num_class_too_small_fails_and_is_tracked() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = generate(&temp_dir);

    irislab(&temp_dir)
        .args(["train", "--num-class", "2", "--dataset"])
        .arg(&dataset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("num_class"));

    let runs = json_stdout(irislab(&temp_dir).args(["runs", "list", "--json"]));
    let states: Vec<&str> = runs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["state"].as_str().unwrap())
        .collect();
    assert!(states.contains(&"failed"));
}

#[test]
fn test_plot_records_myfig() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("iterations.csv");
    fs::write(&log, "iter,output.accuracy\n0,0.9\n1,0.95\n2,0.92\n3,0.88\n").unwrap();

    let manifest = json_stdout(
        irislab(&temp_dir)
            .args(["plot", "--num-bins", "4", "--json", "--iterations"])
            .arg(&log),
    );
    let artifacts = manifest["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 1);
    let figure = fs::read_to_string(artifact_path(&manifest, "myfig")).unwrap();
    assert!(figure.contains("Accuracy"));
}

#[test]
fn test_plot_png_format() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("iterations.csv");
    fs::write(&log, "output.accuracy\n0.5\n").unwrap();

    let manifest = json_stdout(
        irislab(&temp_dir)
            .args(["plot", "--format", "png", "--json", "--iterations"])
            .arg(&log),
    );
    let bytes = fs::read(artifact_path(&manifest, "myfig")).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_plot_unknown_format_rejected() {
    let temp_dir = TempDir::new().unwrap();
    irislab(&temp_dir)
        .args(["plot", "--format", "gif", "--iterations", "log.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gif"));
}

#[test]
fn test_sweep_then_plot() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = generate(&temp_dir);

    let manifest = json_stdout(
        irislab(&temp_dir)
            .args(["sweep", "--max-depth", "2,4", "--num-class", "3", "--steps", "4"])
            .args(["--seed", "5", "--json", "--dataset"])
            .arg(&dataset),
    );
    assert_eq!(manifest["state"], "completed");
    assert!(manifest["results"]["best_iteration"].is_u64());

    let log = artifact_path(&manifest, "iteration_results");
    let content = fs::read_to_string(&log).unwrap();
    assert!(content.lines().next().unwrap().contains("output.accuracy"));
    assert_eq!(content.lines().count(), 3);

    irislab(&temp_dir)
        .args(["plot", "--iterations"])
        .arg(&log)
        .assert()
        .success();
}

#[test]
fn test_runs_show_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("iris.csv");
    let manifest = json_stdout(
        irislab(&temp_dir)
            .args(["generate", "--json", "--target"])
            .arg(&target),
    );
    let run_id = manifest["run_id"].as_str().unwrap().to_string();

    irislab(&temp_dir)
        .args(["runs", "show", &run_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("iris_dataset"));

    irislab(&temp_dir)
        .args(["runs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Runs (1)"));

    irislab(&temp_dir)
        .args(["runs", "show", "no-such-run"])
        .assert()
        .failure();
}

#[test]
fn test_root_and_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("irislab.toml");
    fs::write(&config, "root = \"custom-root\"\n\n[train]\nsteps = 2\nseed = 9\n").unwrap();

    let target = temp_dir.path().join("iris.csv");
    irislab(&temp_dir)
        .arg("--config")
        .arg(&config)
        .args(["generate", "--target"])
        .arg(&target)
        .assert()
        .success();
    assert!(temp_dir.path().join("custom-root").join("runs").is_dir());

    let manifest = json_stdout(
        irislab(&temp_dir)
            .arg("--config")
            .arg(&config)
            .args(["train", "--json", "--dataset"])
            .arg(&target),
    );
    assert_eq!(manifest["params"]["steps"], 2);
    assert_eq!(manifest["params"]["seed"], 9);

    let other_root = temp_dir.path().join("other");
    irislab(&temp_dir)
        .arg("--root")
        .arg(&other_root)
        .args(["runs", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    irislab(&temp_dir)
        .args(["--config", "absent.toml", "runs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn test_suppress_warnings_silences_class_count_warning() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = generate(&temp_dir);

    irislab(&temp_dir)
        .args(["train", "--steps", "2", "--seed", "3", "--dataset"])
        .arg(&dataset)
        .assert()
        .success()
        .stderr(predicate::str::contains("num_class exceeds"));

    irislab(&temp_dir)
        .args(["--suppress-warnings", "train", "--steps", "2", "--seed", "3", "--dataset"])
        .arg(&dataset)
        .assert()
        .success()
        .stderr(predicate::str::contains("num_class exceeds").not());
}

#[test]
fn test_recorded_paths_resolve_from_another_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("iterations.csv");
    fs::write(&log, "output.accuracy\n0.9\n0.8\n").unwrap();

    let manifest = json_stdout(
        irislab(&temp_dir)
            .args(["plot", "--json", "--iterations"])
            .arg(&log),
    );
    let figure = artifact_path(&manifest, "myfig");
    assert!(figure.is_absolute(), "{}", figure.display());

    let elsewhere = TempDir::new().unwrap();
    let root = temp_dir.path().join(".irislab");
    let run_id = manifest["run_id"].as_str().unwrap();
    let shown = json_stdout(
        irislab(&elsewhere)
            .arg("--root")
            .arg(&root)
            .args(["runs", "show", "--json", run_id]),
    );
    let shown_figure = artifact_path(&shown, "myfig");
    assert_eq!(shown_figure, figure);
    assert!(fs::read_to_string(&shown_figure).unwrap().contains("Accuracy"));
}
