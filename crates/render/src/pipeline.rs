//! Pipeline orchestration.
//!
//! Runs catalog resolution, normalization, alignment, selection and chart
//! emission for every table pair. Each pair is isolated: whatever happens to
//! one pair is recorded in the report and the next pair is still processed.

use crate::renderer::{output_id_for, ChartRenderer};
use predchart_compare::{align, plan};
use predchart_core::{
    ComparisonMode, ComparisonPlan, Config, Error, ErrorKind, NormalizedSeries, Result, SeriesRole,
    SkipReason, TablePair,
};
use predchart_ingestion::{CatalogResolver, SeriesNormalizer, TableSource};
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairStatus {
    /// An artifact was written.
    Rendered {
        artifact: PathBuf,
        mode: ComparisonMode,
        rows: usize,
        matched_rows: usize,
    },
    /// Nothing to compare; no artifact.
    Skipped { reason: SkipReason },
    /// The pair was aborted.
    Failed { kind: ErrorKind, message: String },
}

impl PairStatus {
    fn failed(err: &Error) -> Self {
        PairStatus::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairOutcome {
    pub pair: TablePair,
    #[serde(flatten)]
    pub status: PairStatus,
    /// Why an existing predicted table was treated as absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_issue: Option<String>,
}

/// Per-pair outcomes in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub outcomes: Vec<PairOutcome>,
}

impl PipelineReport {
    /// Number of pairs that produced an artifact.
    pub fn rendered(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Rendered { .. }))
    }

    /// Number of pairs skipped by the selector.
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Skipped { .. }))
    }

    /// Number of failed pairs.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Failed { .. }))
    }

    /// Paths of all written artifacts.
    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            PairStatus::Rendered { artifact, .. } => Some(artifact),
            _ => None,
        })
    }

    /// Outcome for an actual table name.
    pub fn outcome(&self, actual: &str) -> Option<&PairOutcome> {
        self.outcomes.iter().find(|o| o.pair.actual == actual)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn count(&self, pred: impl Fn(&PairStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// The full comparison pipeline.
#[derive(Debug)]
pub struct Pipeline {
    resolver: CatalogResolver,
    normalizer: SeriesNormalizer,
}

impl Pipeline {
    /// Create a pipeline from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: CatalogResolver::new(&config.catalog),
            normalizer: SeriesNormalizer::from_config(&config.columns),
        }
    }

    /// Use a custom catalog resolver, e.g. one with an explicit pairing.
    pub fn with_resolver(mut self, resolver: CatalogResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Process every pair resolved from `actual`.
    ///
    /// Only a failure to enumerate `actual`'s tables is returned as an error;
    /// per-pair failures are recorded in the report.
    pub fn run(
        &self,
        actual: &dyn TableSource,
        predicted: &dyn TableSource,
        renderer: &dyn ChartRenderer,
    ) -> Result<PipelineReport> {
        let pairs = self.resolver.resolve(actual)?;
        tracing::info!(pairs = pairs.len(), "processing table pairs");

        let mut report = PipelineReport::default();
        for pair in pairs {
            let outcome = self.process_pair(&pair, actual, predicted, renderer);
            report.outcomes.push(outcome);
        }

        tracing::info!(
            rendered = report.rendered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "pipeline finished"
        );
        Ok(report)
    }

    /// Process one pair. Never fails; errors become a `Failed` status.
    pub fn process_pair(
        &self,
        pair: &TablePair,
        actual: &dyn TableSource,
        predicted: &dyn TableSource,
        renderer: &dyn ChartRenderer,
    ) -> PairOutcome {
        tracing::debug!(actual = %pair.actual, predicted = %pair.predicted, "processing pair");

        let mut predicted_issue = None;
        let status = match self.compare(pair, actual, predicted, renderer, &mut predicted_issue) {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(table = %pair.actual, error = %err, "pair failed");
                PairStatus::failed(&err)
            }
        };

        PairOutcome {
            pair: pair.clone(),
            status,
            predicted_issue,
        }
    }

    /// Actual first: its failure aborts the pair before the predicted side is read.
    fn compare(
        &self,
        pair: &TablePair,
        actual: &dyn TableSource,
        predicted: &dyn TableSource,
        renderer: &dyn ChartRenderer,
        predicted_issue: &mut Option<String>,
    ) -> Result<PairStatus> {
        let table = actual.read_table(&pair.actual)?;
        let actual_series = self.normalizer.normalize(&table, SeriesRole::Actual)?;

        let (predicted_series, issue) = self.load_predicted(pair, predicted)?;
        *predicted_issue = issue;
        let dataset = align(&actual_series, predicted_series.as_ref())?;

        let plan = plan(&dataset);
        if let ComparisonPlan::Skip { reason } = &plan {
            tracing::info!(table = %pair.actual, ?reason, "skipping pair");
            return Ok(PairStatus::Skipped { reason: *reason });
        }

        let artifact = renderer.render(&plan, &dataset, &output_id_for(&pair.actual))?;
        tracing::info!(
            table = %pair.actual,
            mode = ?plan.mode(),
            artifact = %artifact.display(),
            "rendered chart"
        );
        Ok(PairStatus::Rendered {
            artifact,
            mode: plan.mode(),
            rows: dataset.len(),
            matched_rows: dataset.matched_rows(),
        })
    }

    /// Load and normalize the predicted table.
    ///
    /// Absence degrades to `None`. A schema error also degrades, with its text
    /// returned as the issue. Any other error, such as a backend failure,
    /// aborts the pair.
    fn load_predicted(
        &self,
        pair: &TablePair,
        source: &dyn TableSource,
    ) -> Result<(Option<NormalizedSeries>, Option<String>)> {
        let loaded = source
            .read_table(&pair.predicted)
            .and_then(|t| self.normalizer.normalize(&t, SeriesRole::Predicted));
        match loaded {
            Ok(series) => Ok((Some(series), None)),
            Err(err) if err.is_not_found() => {
                tracing::debug!(table = %pair.predicted, "no predicted table");
                Ok((None, None))
            }
            Err(err @ Error::Schema(_)) => {
                tracing::warn!(table = %pair.predicted, error = %err, "ignoring predicted table");
                Ok((None, Some(err.to_string())))
            }
            Err(err) => Err(err),
        }
    }
}
