//! Error types for irislab core.

use crate::config::ConfigError;
use irislab_training::TrainingError;
use thiserror::Error;

/// Core error type for pipeline operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Stage failures (dataset, model, artifact, render).
    #[error(transparent)]
    Training(#[from] TrainingError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging setup errors
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
