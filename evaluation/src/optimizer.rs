use crate::answer::AnswerNormalizer;
use crate::config::{MetricsConfig, OptimizerConfig};
use crate::dataset::{Answer, GroundTruthSet};
use crate::error::{EvaluationError, Result};
use crate::metrics::{NdcgAtK, RankingMetric};
use async_trait::async_trait;
use codesearch_retrieval::{FusionConfig, HybridRetrieval, SemanticSearch};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upper bound on grid points per search
const MAX_GRID_POINTS: usize = 10_000;

/// Retrieval under a given fusion policy, returning document ids best first
#[async_trait]
pub trait RetrievalCallback: Send + Sync {
    async fn retrieve(&self, query: &str, fusion: &FusionConfig) -> Result<Vec<String>>;
}

#[async_trait]
impl<S: SemanticSearch> RetrievalCallback for HybridRetrieval<S> {
    async fn retrieve(&self, query: &str, fusion: &FusionConfig) -> Result<Vec<String>> {
        Ok(self.search_with(query, fusion).await?.document_ids())
    }
}

/// A query with the documents judged relevant for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledQuery {
    pub query: String,
    #[serde(default)]
    pub relevant: Vec<String>,
}

impl LabeledQuery {
    pub fn new<I, S>(query: impl Into<String>, relevant: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into(),
            relevant: relevant.into_iter().map(Into::into).collect(),
        }
    }
}

/// Fusion parameter space to search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterGrid {
    /// Vector weights `w` from `start` to `end`, each paired with `1 - w`
    Weights { start: f64, end: f64, step: f64 },
    /// RRF constants from `start` to `end`
    RankConstant { start: f64, end: f64, step: f64 },
    Explicit(Vec<FusionConfig>),
}

impl ParameterGrid {
    /// Vector weights 0.0, 0.1, ..., 1.0
    pub fn weights() -> Self {
        Self::Weights {
            start: 0.0,
            end: 1.0,
            step: 0.1,
        }
    }

    /// Grid points in search order
    pub fn points(&self) -> Result<Vec<FusionConfig>> {
        let points = match self {
            Self::Weights { start, end, step } => {
                if *start < 0.0 || *end > 1.0 {
                    return Err(EvaluationError::InvalidGrid(format!(
                        "weights must lie in [0, 1], got [{start}, {end}]"
                    )));
                }
                steps(*start, *end, *step)?
                    .into_iter()
                    .map(|w| FusionConfig::weighted(w, snap(1.0 - w)))
                    .collect()
            }
            Self::RankConstant { start, end, step } => {
                if *start <= 0.0 {
                    return Err(EvaluationError::InvalidGrid(format!(
                        "rank constants must be > 0, got {start}"
                    )));
                }
                steps(*start, *end, *step)?
                    .into_iter()
                    .map(FusionConfig::rank_fusion)
                    .collect()
            }
            Self::Explicit(configs) => {
                if configs.is_empty() {
                    return Err(EvaluationError::InvalidGrid(
                        "explicit grid is empty".to_string(),
                    ));
                }
                configs.clone()
            }
        };

        for config in &points {
            config.validate().map_err(EvaluationError::InvalidGrid)?;
        }
        Ok(points)
    }
}

/// Round to 1e-9, absorbing accumulated step error
fn snap(value: f64) -> f64 {
    (value * 1e9).round() / 1e9
}

fn steps(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !(start.is_finite() && end.is_finite() && step.is_finite()) {
        return Err(EvaluationError::InvalidGrid(
            "grid bounds must be finite".to_string(),
        ));
    }
    if step <= 0.0 {
        return Err(EvaluationError::InvalidGrid(format!(
            "step must be > 0, got {step}"
        )));
    }
    if start > end {
        return Err(EvaluationError::InvalidGrid(format!(
            "start ({start}) exceeds end ({end})"
        )));
    }

    // Checked as a float: tiny steps or huge ranges overflow the cast
    let intervals = ((end - start) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_GRID_POINTS as f64 {
        return Err(EvaluationError::InvalidGrid(format!(
            "grid from {start} to {end} by {step} exceeds the limit of {MAX_GRID_POINTS} points"
        )));
    }
    let count = intervals as usize + 1;

    Ok((0..count)
        .map(|i| snap(start + i as f64 * step).min(end))
        .collect())
}

/// Outcome for one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPointResult {
    pub config: FusionConfig,

    /// Mean NDCG over the queries that produced a value
    pub mean_ndcg: Option<f64>,

    pub evaluated: usize,

    /// Failed or timed-out calls
    pub skipped: usize,
}

/// Grid-search outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerReport {
    pub best_config: FusionConfig,

    /// `None` when the fallback was used
    pub best_mean_ndcg: Option<f64>,

    /// NDCG cutoff
    pub k: usize,

    pub grid: Vec<GridPointResult>,

    /// No grid point produced a score; `best_config` is the configured fallback
    pub used_fallback: bool,

    /// Labelled queries with a non-empty relevant set
    pub labeled_queries: usize,
}

struct PreparedQuery {
    query: String,
    relevant: GroundTruthSet,
}

/// Grid search over fusion parameters, maximising mean NDCG@k
#[derive(Debug, Clone)]
pub struct WeightOptimizer {
    config: OptimizerConfig,
    k: usize,
    normalizer: Option<AnswerNormalizer>,
}

impl WeightOptimizer {
    pub fn new(config: OptimizerConfig, metrics: &MetricsConfig) -> Result<Self> {
        config.validate().map_err(EvaluationError::InvalidConfig)?;
        Ok(Self {
            k: config.resolve_k(metrics),
            config,
            normalizer: None,
        })
    }

    /// Normalize relevant ids and predictions before scoring
    pub fn with_normalizer(mut self, normalizer: AnswerNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Evaluate every grid point against every labelled query.
    ///
    /// Calls run concurrently up to `max_concurrent`, each under
    /// `call_timeout_ms`. A failed call is left out of its grid point's
    /// mean. Ties keep the earliest grid point.
    pub async fn optimize<C>(
        &self,
        callback: Arc<C>,
        queries: &[LabeledQuery],
        grid: &ParameterGrid,
    ) -> Result<OptimizerReport>
    where
        C: RetrievalCallback + ?Sized + 'static,
    {
        let points = grid.points()?;
        let prepared = self.prepare(queries);

        info!(
            "Optimizing fusion over {} grid points x {} labelled queries (ndcg@{})",
            points.len(),
            prepared.len(),
            self.k
        );

        if prepared.is_empty() {
            warn!("No labelled query has relevant documents, using fallback configuration");
            let grid = points
                .into_iter()
                .map(|config| GridPointResult {
                    config,
                    mean_ndcg: None,
                    evaluated: 0,
                    skipped: 0,
                })
                .collect();
            return Ok(self.fallback_report(grid, 0));
        }

        let outcomes = self.run_calls(callback, &points, &prepared).await?;

        let mut grid_results = Vec::with_capacity(points.len());
        for (config, calls) in points.into_iter().zip(outcomes) {
            let mut sum = 0.0;
            let mut evaluated = 0;
            let mut skipped = 0;

            for (query, outcome) in prepared.iter().zip(calls) {
                match outcome.and_then(|predictions| self.score(&predictions, &query.relevant)) {
                    Ok(ndcg) => {
                        sum += ndcg;
                        evaluated += 1;
                    }
                    Err(e) => {
                        warn!("Skipping '{}' under {config}: {e}", query.query);
                        skipped += 1;
                    }
                }
            }

            let mean_ndcg = (evaluated > 0).then(|| sum / evaluated as f64);
            debug!(
                "{config}: mean ndcg@{} = {mean_ndcg:?} ({evaluated} evaluated, {skipped} skipped)",
                self.k
            );
            grid_results.push(GridPointResult {
                config,
                mean_ndcg,
                evaluated,
                skipped,
            });
        }

        let best = grid_results
            .iter()
            .fold(None, |best: Option<(FusionConfig, f64)>, point| {
                match point.mean_ndcg {
                    Some(mean) if best.is_none_or(|(_, current)| mean > current) => {
                        Some((point.config, mean))
                    }
                    _ => best,
                }
            });

        match best {
            Some((best_config, best_mean)) => {
                info!(
                    "Best fusion configuration: {best_config} (ndcg@{} = {best_mean:.4})",
                    self.k
                );
                Ok(OptimizerReport {
                    best_config,
                    best_mean_ndcg: Some(best_mean),
                    k: self.k,
                    grid: grid_results,
                    used_fallback: false,
                    labeled_queries: prepared.len(),
                })
            }
            None => {
                warn!("No grid point produced a score, using fallback configuration");
                Ok(self.fallback_report(grid_results, prepared.len()))
            }
        }
    }

    /// Queries whose relevant set is non-empty after normalization
    fn prepare(&self, queries: &[LabeledQuery]) -> Vec<PreparedQuery> {
        queries
            .iter()
            .filter_map(|labeled| {
                let relevant = self.normalize_relevant(&labeled.relevant);
                if relevant.is_empty() {
                    debug!("Skipping '{}': no relevant documents", labeled.query);
                    return None;
                }
                Some(PreparedQuery {
                    query: labeled.query.clone(),
                    relevant,
                })
            })
            .collect()
    }

    fn normalize_relevant(&self, relevant: &[String]) -> GroundTruthSet {
        match &self.normalizer {
            Some(normalizer) => Answer::many(relevant.iter().cloned())
                .map(|answer| normalizer.normalize_answers(&answer))
                .unwrap_or_default(),
            None => relevant
                .iter()
                .map(String::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    fn score(&self, predictions: &[String], relevant: &GroundTruthSet) -> Result<f64> {
        match &self.normalizer {
            Some(normalizer) => {
                NdcgAtK.calculate(&normalizer.normalize_predictions(predictions), relevant, self.k)
            }
            None => NdcgAtK.calculate(predictions, relevant, self.k),
        }
    }

    /// One outcome per grid point per query, in grid × query order
    async fn run_calls<C>(
        &self,
        callback: Arc<C>,
        points: &[FusionConfig],
        queries: &[PreparedQuery],
    ) -> Result<Vec<Vec<Result<Vec<String>>>>>
    where
        C: RetrievalCallback + ?Sized + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let timeout_ms = self.config.call_timeout_ms;
        let timeout = Duration::from_millis(timeout_ms);

        let mut tasks = Vec::with_capacity(points.len());
        for config in points {
            let mut point_tasks = Vec::with_capacity(queries.len());
            for prepared in queries {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| EvaluationError::Task(format!("Semaphore error: {e}")))?;

                let callback = Arc::clone(&callback);
                let query = prepared.query.clone();
                let config = *config;

                let task = tokio::spawn(async move {
                    let call = callback.retrieve(&query, &config);
                    let result = match tokio::time::timeout(timeout, call).await {
                        Ok(result) => result,
                        Err(_) => Err(EvaluationError::Timeout(timeout_ms)),
                    };

                    drop(permit);
                    result
                });

                point_tasks.push(task);
            }
            tasks.push(point_tasks);
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for point_tasks in tasks {
            let mut point_outcomes = Vec::with_capacity(point_tasks.len());
            for task in point_tasks {
                let outcome = match task.await {
                    Ok(result) => result,
                    Err(e) => Err(EvaluationError::Task(e.to_string())),
                };
                point_outcomes.push(outcome);
            }
            outcomes.push(point_outcomes);
        }

        Ok(outcomes)
    }

    fn fallback_report(
        &self,
        grid: Vec<GridPointResult>,
        labeled_queries: usize,
    ) -> OptimizerReport {
        OptimizerReport {
            best_config: self.config.fallback_config,
            best_mean_ndcg: None,
            k: self.k,
            grid,
            used_fallback: true,
            labeled_queries,
        }
    }
}
