//! Tracing subscriber setup.

use crate::error::{CoreError, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Target for warnings about behavior that will change or carries no effect.
pub const FUTURE_WARNINGS_TARGET: &str = "irislab::future";

/// Logging setup options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Default level used when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,
    /// Silence events on [`FUTURE_WARNINGS_TARGET`] below error level
    pub suppress_warnings: bool,
    /// Emit one JSON object per event instead of human readable lines
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            suppress_warnings: false,
            json: false,
        }
    }
}

/// Filter directives for `options`, with `rust_log` taking precedence over the
/// configured level.
#[must_use]
pub fn filter_directives(options: &LoggingOptions, rust_log: Option<&str>) -> String {
    let mut directives = match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(env) => env.to_string(),
        None => options.level.to_lowercase(),
    };
    if options.suppress_warnings {
        directives.push_str(&format!(",{FUTURE_WARNINGS_TARGET}=error"));
    }
    directives
}

pub fn build_filter(options: &LoggingOptions) -> Result<EnvFilter> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(options, rust_log.as_deref());
    EnvFilter::try_new(&directives)
        .map_err(|e| CoreError::Logging(format!("invalid filter '{directives}': {e}")))
}

/// Install the global subscriber. Events go to stderr so command output on
/// stdout stays machine readable.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(options)?);
    let result = if options.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false);
        registry.with(layer).try_init()
    };
    result.map_err(|e| CoreError::Logging(e.to_string()))
}
