//! irislab core
//!
//! Pipeline stages (dataset generator, trainer, iteration plotter), the
//! filesystem-backed run context that tracks them, a grid sweep over the
//! trainer, figure rendering, configuration and logging setup.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod render;
pub mod sweep;
pub mod tracking;

pub use config::{ConfigError, PipelineConfig};
pub use error::{CoreError, Result};
pub use handlers::{
    ByteSource, FileSource, GbdtTrainer, Handler, IrisGenerator, IterationPlotter, PlotSpec,
    TrainingReport, generate_iris, plot_iterations, train_model,
};
pub use logging::{FUTURE_WARNINGS_TARGET, LoggingOptions, init_logging};
pub use render::{AxisLabels, PlotFormat, render_histogram};
pub use sweep::{GridSweep, IterationContext, ParamGrid, SweepSpec, run_sweep};
pub use tracking::{FsRunContext, execute};
