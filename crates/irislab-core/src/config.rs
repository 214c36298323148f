//! Pipeline configuration file support.
//!
//! Configuration precedence (highest first):
//! 1. CLI arguments
//! 2. Explicit `--config` file
//! 3. Local config file (`./.irislabrc`)
//! 4. Global config file (`~/.irislab/config.toml`)
//! 5. Built-in defaults

use crate::render::PlotFormat;
use irislab_training::{DEFAULT_MODEL_NAME, TrainingHyperParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ROOT: &str = ".irislab";
pub const DEFAULT_PLOT_COLUMN: &str = "accuracy";
pub const DEFAULT_NUM_BINS: usize = 10;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Trainer defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainSection {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub num_class: Option<usize>,
    #[serde(default)]
    pub eta: Option<f32>,
    #[serde(default)]
    pub gamma: Option<f32>,
    #[serde(default)]
    pub steps: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub test_fraction: Option<f64>,
}

/// Plotter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSection {
    #[serde(default)]
    pub col: Option<String>,
    #[serde(default)]
    pub num_bins: Option<usize>,
    /// `svg` or `png`
    #[serde(default)]
    pub format: Option<String>,
}

/// Pipeline configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding tracked runs
    #[serde(default)]
    pub root: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Silence `irislab::future` warnings
    #[serde(default)]
    pub suppress_warnings: Option<bool>,

    #[serde(default)]
    pub train: TrainSection,

    #[serde(default)]
    pub plot: PlotSection,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".irislab")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".irislabrc")
    }

    /// Load the global then local config files; missing files are skipped.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        if let Ok(global_config) = Self::load_from_file(&Self::default_global_path()) {
            config.merge(&global_config);
        }

        if let Ok(local_config) = Self::load_from_file(&Self::default_local_path()) {
            config.merge(&local_config);
        }

        config
    }

    /// Discovered configuration, overridden by an explicit file when given.
    ///
    /// Unlike discovered files, an explicit file must exist and parse.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::discover_and_load();
        if let Some(path) = explicit {
            config.merge(&Self::load_from_file(path)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if let Some(v) = src {
                *dst = Some(v.clone());
            }
        }

        take(&mut self.root, &other.root);
        take(&mut self.log_level, &other.log_level);
        take(&mut self.suppress_warnings, &other.suppress_warnings);

        take(&mut self.train.model_name, &other.train.model_name);
        take(&mut self.train.max_depth, &other.train.max_depth);
        take(&mut self.train.num_class, &other.train.num_class);
        take(&mut self.train.eta, &other.train.eta);
        take(&mut self.train.gamma, &other.train.gamma);
        take(&mut self.train.steps, &other.train.steps);
        take(&mut self.train.seed, &other.train.seed);
        take(&mut self.train.test_fraction, &other.train.test_fraction);

        take(&mut self.plot.col, &other.plot.col);
        take(&mut self.plot.num_bins, &other.plot.num_bins);
        take(&mut self.plot.format, &other.plot.format);
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(format) = &self.plot.format {
            format.parse::<PlotFormat>().map_err(ConfigError::InvalidValue)?;
        }
        if self.plot.num_bins == Some(0) {
            return Err(ConfigError::InvalidValue("plot.num_bins must be >= 1".to_string()));
        }
        self.hyperparams()
            .validate()
            .map_err(|e| ConfigError::InvalidValue(format!("train: {e}")))
    }

    #[must_use]
    pub fn root_dir(&self) -> PathBuf {
        PathBuf::from(self.root.as_deref().unwrap_or(DEFAULT_ROOT))
    }

    #[must_use]
    pub fn model_name(&self) -> String {
        self.train.model_name.clone().unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string())
    }

    /// Trainer hyperparameters with configured values applied over defaults.
    #[must_use]
    pub fn hyperparams(&self) -> TrainingHyperParams {
        let defaults = TrainingHyperParams::default();
        TrainingHyperParams {
            max_depth: self.train.max_depth.unwrap_or(defaults.max_depth),
            num_class: self.train.num_class.unwrap_or(defaults.num_class),
            eta: self.train.eta.unwrap_or(defaults.eta),
            gamma: self.train.gamma.unwrap_or(defaults.gamma),
            steps: self.train.steps.unwrap_or(defaults.steps),
            seed: self.train.seed.or(defaults.seed),
            test_fraction: self.train.test_fraction.unwrap_or(defaults.test_fraction),
        }
    }

    #[must_use]
    pub fn plot_column(&self) -> String {
        self.plot.col.clone().unwrap_or_else(|| DEFAULT_PLOT_COLUMN.to_string())
    }

    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.plot.num_bins.unwrap_or(DEFAULT_NUM_BINS)
    }

    #[must_use]
    pub fn plot_format(&self) -> PlotFormat {
        self.plot.format.as_deref().and_then(|f| f.parse().ok()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.root_dir(), PathBuf::from(".irislab"));
        assert_eq!(config.model_name(), "model.bst");
        assert_eq!(config.hyperparams(), TrainingHyperParams::default());
        assert_eq!(config.plot_column(), "accuracy");
        assert_eq!(config.num_bins(), 10);
        assert_eq!(config.plot_format(), PlotFormat::Svg);
    }

    #[test]
    fn test_load_partial_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let content = "root = \"runs-here\"\nsuppress_warnings = true\n\n\
                       [train]\nmax_depth = 3\nseed = 7\n\n\
                       [plot]\nformat = \"png\"\n";
        std::fs::write(&path, content).unwrap();

        let config = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.root_dir(), PathBuf::from("runs-here"));
        assert_eq!(config.suppress_warnings, Some(true));
        let hp = config.hyperparams();
        assert_eq!(hp.max_depth, 3);
        assert_eq!(hp.seed, Some(7));
        assert_eq!(hp.steps, 20);
        assert_eq!(config.plot_format(), PlotFormat::Png);
    }

    #[test]
    fn test_merge_prefers_other_when_set() {
        let mut base = PipelineConfig::default();
        base.train.eta = Some(0.3);
        base.log_level = Some("debug".to_string());

        let mut other = PipelineConfig::default();
        other.train.eta = Some(0.1);

        base.merge(&other);
        assert_eq!(base.train.eta, Some(0.1));
        assert_eq!(base.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.plot.format = Some("gif".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = PipelineConfig::default();
        config.train.steps = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.toml");
        assert!(matches!(
            PipelineConfig::load(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));
    }
}
