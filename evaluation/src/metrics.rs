//! Ranking-quality metrics over binary relevance.
//!
//! Every metric takes predictions in rank order, the ground truth set and a
//! cutoff `k`. Repeated predictions count once, at their first position.

use crate::dataset::GroundTruthSet;
use crate::error::{EvaluationError, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

pub const RECALL: &str = "recall";
pub const PRECISION: &str = "precision";
pub const HIT: &str = "hit";
pub const MRR: &str = "mrr";
pub const NDCG: &str = "ndcg";

/// A ranking metric evaluated at a cutoff `k`
pub trait RankingMetric: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Fails on `k == 0` or an empty ground truth
    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64>;
}

fn check_inputs(ground_truth: &GroundTruthSet, k: usize) -> Result<()> {
    if k == 0 {
        return Err(EvaluationError::InvalidK(k));
    }
    if ground_truth.is_empty() {
        return Err(EvaluationError::EmptyGroundTruth);
    }
    Ok(())
}

/// Distinct predictions in rank order, cut at `k`
fn top_k(predictions: &[String], k: usize) -> Vec<&str> {
    let mut seen = HashSet::new();
    predictions
        .iter()
        .map(String::as_str)
        .filter(|p| seen.insert(*p))
        .take(k)
        .collect()
}

fn relevant_in_top_k(predictions: &[String], ground_truth: &GroundTruthSet, k: usize) -> usize {
    top_k(predictions, k)
        .into_iter()
        .filter(|p| ground_truth.contains(p))
        .count()
}

/// |top-k ∩ GT| / |GT|
#[derive(Debug, Clone, Copy, Default)]
pub struct RecallAtK;

impl RankingMetric for RecallAtK {
    fn name(&self) -> &str {
        RECALL
    }

    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64> {
        check_inputs(ground_truth, k)?;
        let found = relevant_in_top_k(predictions, ground_truth, k);
        Ok(found as f64 / ground_truth.len() as f64)
    }
}

/// |top-k ∩ GT| / min(k, |predictions|); 0 without predictions
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecisionAtK;

impl RankingMetric for PrecisionAtK {
    fn name(&self) -> &str {
        PRECISION
    }

    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64> {
        check_inputs(ground_truth, k)?;
        let top = top_k(predictions, k);
        if top.is_empty() {
            return Ok(0.0);
        }
        let found = top.iter().filter(|p| ground_truth.contains(p)).count();
        Ok(found as f64 / top.len() as f64)
    }
}

/// 1 if any relevant item is in the top k
#[derive(Debug, Clone, Copy, Default)]
pub struct HitAtK;

impl RankingMetric for HitAtK {
    fn name(&self) -> &str {
        HIT
    }

    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64> {
        check_inputs(ground_truth, k)?;
        let hit = relevant_in_top_k(predictions, ground_truth, k) > 0;
        Ok(if hit { 1.0 } else { 0.0 })
    }
}

/// Reciprocal rank of the first relevant item within the top k
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReciprocalRank;

impl RankingMetric for MeanReciprocalRank {
    fn name(&self) -> &str {
        MRR
    }

    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64> {
        check_inputs(ground_truth, k)?;
        Ok(top_k(predictions, k)
            .iter()
            .position(|p| ground_truth.contains(p))
            .map_or(0.0, |index| 1.0 / (index + 1) as f64))
    }
}

/// DCG / IDCG with binary relevance and a `log2(rank + 1)` discount
#[derive(Debug, Clone, Copy, Default)]
pub struct NdcgAtK;

fn discount(rank: usize) -> f64 {
    1.0 / ((rank + 1) as f64).log2()
}

impl RankingMetric for NdcgAtK {
    fn name(&self) -> &str {
        NDCG
    }

    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64> {
        check_inputs(ground_truth, k)?;

        let dcg: f64 = top_k(predictions, k)
            .iter()
            .enumerate()
            .filter(|(_, p)| ground_truth.contains(p))
            .map(|(index, _)| discount(index + 1))
            .sum();

        let idcg: f64 = (1..=ground_truth.len().min(k)).map(discount).sum();

        if idcg == 0.0 {
            return Ok(0.0);
        }
        Ok(dcg / idcg)
    }
}

/// A metric: one of the built-ins or a caller-supplied implementation
#[derive(Debug, Clone)]
pub enum Metric {
    Recall(RecallAtK),
    Precision(PrecisionAtK),
    Hit(HitAtK),
    Mrr(MeanReciprocalRank),
    Ndcg(NdcgAtK),
    Custom(Arc<dyn RankingMetric>),
}

impl Metric {
    /// All built-in metrics
    pub fn builtins() -> Vec<Metric> {
        vec![
            Metric::Recall(RecallAtK),
            Metric::Precision(PrecisionAtK),
            Metric::Hit(HitAtK),
            Metric::Mrr(MeanReciprocalRank),
            Metric::Ndcg(NdcgAtK),
        ]
    }

    pub fn custom(metric: impl RankingMetric + 'static) -> Self {
        Metric::Custom(Arc::new(metric))
    }

    fn inner(&self) -> &dyn RankingMetric {
        match self {
            Metric::Recall(m) => m,
            Metric::Precision(m) => m,
            Metric::Hit(m) => m,
            Metric::Mrr(m) => m,
            Metric::Ndcg(m) => m,
            Metric::Custom(m) => m.as_ref(),
        }
    }
}

impl RankingMetric for Metric {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn calculate(
        &self,
        predictions: &[String],
        ground_truth: &GroundTruthSet,
        k: usize,
    ) -> Result<f64> {
        self.inner().calculate(predictions, ground_truth, k)
    }
}

/// Metric lookup by name
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, Metric>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for metric in Metric::builtins() {
            registry.register(metric);
        }
        registry
    }
}

impl MetricRegistry {
    pub fn empty() -> Self {
        Self {
            metrics: BTreeMap::new(),
        }
    }

    /// Register a metric, replacing any with the same name
    pub fn register(&mut self, metric: Metric) -> Option<Metric> {
        self.metrics.insert(metric.name().to_string(), metric)
    }

    pub fn get(&self, name: &str) -> Result<&Metric> {
        self.metrics
            .get(name)
            .ok_or_else(|| EvaluationError::UnknownMetric(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.metrics.keys().map(String::as_str).collect()
    }
}
