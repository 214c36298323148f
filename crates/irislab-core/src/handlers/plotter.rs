use super::Handler;
use super::source::{ByteSource, FileSource};
use crate::config::{DEFAULT_NUM_BINS, DEFAULT_PLOT_COLUMN};
use crate::render::{AxisLabels, PlotFormat, render_histogram};
use irislab_training::{
    ArtifactKind, ArtifactRequest, Histogram, RunContext, TrainingResult, read_output_column,
};
use std::collections::BTreeMap;

pub const PLOT_ARTIFACT_KEY: &str = "myfig";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSpec {
    /// Metric name; the log column is `output.<col>`.
    pub col: String,
    pub num_bins: usize,
    pub format: PlotFormat,
}

impl Default for PlotSpec {
    fn default() -> Self {
        Self {
            col: DEFAULT_PLOT_COLUMN.to_string(),
            num_bins: DEFAULT_NUM_BINS,
            format: PlotFormat::default(),
        }
    }
}

/// Histogram `output.<col>` of an iteration log and record the figure as `myfig`.
pub fn plot_iterations(
    ctx: &mut dyn RunContext,
    source: &dyn ByteSource,
    spec: &PlotSpec,
) -> TrainingResult<Histogram> {
    let bytes = source.get()?;
    let values = read_output_column(&bytes, &spec.col)?;
    ctx.info(&format!(
        "read {} values of '{}' from {}",
        values.len(),
        spec.col,
        source.describe()
    ));

    let hist = Histogram::compute(&values, spec.num_bins)?;
    let body = render_histogram(&hist, &AxisLabels::default(), spec.format)?;
    let request =
        ArtifactRequest::new(PLOT_ARTIFACT_KEY, ArtifactKind::Plot, spec.format.extension(), body);
    ctx.record_artifact(request)?;
    Ok(hist)
}

#[derive(Debug, Clone)]
pub struct IterationPlotter {
    pub source: FileSource,
    pub spec: PlotSpec,
}

impl Handler for IterationPlotter {
    fn name(&self) -> &'static str {
        "plot"
    }

    fn params(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::from([
            ("iterations".to_string(), self.source.describe().into()),
            ("col".to_string(), self.spec.col.clone().into()),
            ("num_bins".to_string(), self.spec.num_bins.into()),
            ("format".to_string(), self.spec.format.to_string().into()),
        ])
    }

    fn run(&self, ctx: &mut dyn RunContext) -> TrainingResult<()> {
        plot_iterations(ctx, &self.source, &self.spec).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irislab_training::{MemoryRunContext, TrainingError};

    const LOG: &str = "iter,state,output.accuracy\n\
                       0,completed,0.9\n\
                       1,completed,0.95\n\
                       2,completed,0.92\n\
                       3,completed,0.88\n";

    fn log_bytes() -> Vec<u8> {
        LOG.as_bytes().to_vec()
    }

    #[test]
    fn test_records_single_figure() {
        let mut ctx = MemoryRunContext::new();
        let spec = PlotSpec {
            num_bins: 4,
            ..PlotSpec::default()
        };
        let hist = plot_iterations(&mut ctx, &log_bytes(), &spec).unwrap();

        assert_eq!(hist.counts.iter().sum::<u64>(), 4);
        assert_eq!(ctx.artifacts.len(), 1);
        let (record, body) = &ctx.artifacts[PLOT_ARTIFACT_KEY];
        assert_eq!(record.kind, ArtifactKind::Plot);
        assert_eq!(record.format, "svg");
        assert!(String::from_utf8_lossy(body).starts_with("<svg"));
    }

    #[test]
    fn test_fewer_rows_than_bins() {
        let mut ctx = MemoryRunContext::new();
        let hist = plot_iterations(&mut ctx, &log_bytes(), &PlotSpec::default()).unwrap();
        assert_eq!(hist.n_bins(), 10);
        assert_eq!(hist.counts.iter().filter(|&&c| c > 0).count(), 4);
        assert!(ctx.artifacts.contains_key(PLOT_ARTIFACT_KEY));
    }

    #[test]
    fn test_unknown_column_records_nothing() {
        let mut ctx = MemoryRunContext::new();
        let spec = PlotSpec {
            col: "loss".to_string(),
            ..PlotSpec::default()
        };
        let err = plot_iterations(&mut ctx, &log_bytes(), &spec).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
        assert!(ctx.artifacts.is_empty());
    }
}
