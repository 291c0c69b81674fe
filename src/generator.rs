//! Infographics Generator
//! Runs selection and renders every chart spec in order, best effort.

use crate::charts::{Archetype, ChartSelector, RenderError, Renderer, SelectionError};
use crate::config::StyleConfig;
use crate::data::Table;
use crate::stats::StatsCalculator;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("All {attempted} charts failed to render")]
    AllRendersFailed {
        attempted: usize,
        failures: Vec<ChartFailure>,
    },
}

/// One chart that could not be rendered.
#[derive(Debug)]
pub struct ChartFailure {
    pub file_stem: String,
    pub archetype: Archetype,
    pub error: RenderError,
}

/// Outcome of a run with at least one saved chart.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub saved: Vec<PathBuf>,
    pub failures: Vec<ChartFailure>,
}

impl GenerationReport {
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failures.len()
    }
}

/// Drives one run for a company.
pub struct InfographicsGenerator<'a> {
    company: String,
    style: &'a StyleConfig,
}

impl<'a> InfographicsGenerator<'a> {
    pub fn new(company: impl Into<String>, style: &'a StyleConfig) -> Self {
        Self {
            company: company.into(),
            style,
        }
    }

    /// Select charts for `table` and render each one.
    ///
    /// A failed chart is logged and skipped. The run fails only when
    /// selection fails or no chart could be rendered.
    pub fn run<R: Renderer>(
        &self,
        table: &Table,
        renderer: &R,
    ) -> Result<GenerationReport, GenerateError> {
        for (name, summary) in StatsCalculator::summarize(table) {
            info!(
                "{}: count={} missing={} min={:.2} max={:.2} mean={:.2} median={:.2} growth={}",
                name,
                summary.count,
                summary.missing,
                summary.min,
                summary.max,
                summary.mean,
                summary.median,
                summary
                    .growth_percent()
                    .map(|g| format!("{g:+.1}%"))
                    .unwrap_or_else(|| "n/a".to_string())
            );
        }

        let specs = ChartSelector::select(table, &self.company, self.style)?;
        info!("Selected {} charts for {}", specs.len(), self.company);

        let mut report = GenerationReport::default();
        for spec in &specs {
            match renderer.render(spec) {
                Ok(path) => {
                    info!("Saved {} chart: {}", spec.archetype(), path.display());
                    report.saved.push(path);
                }
                Err(err) => {
                    error!("Failed to render {}: {}", spec.file_stem, err);
                    report.failures.push(ChartFailure {
                        file_stem: spec.file_stem.clone(),
                        archetype: spec.archetype(),
                        error: err,
                    });
                }
            }
        }

        if report.saved.is_empty() {
            return Err(GenerateError::AllRendersFailed {
                attempted: report.failures.len(),
                failures: report.failures,
            });
        }
        Ok(report)
    }
}
