use crate::config::MetricsConfig;
use crate::dataset::GroundTruthSet;
use crate::error::{EvaluationError, Result};
use crate::metrics::{Metric, MetricRegistry, RankingMetric};
use crate::report::{MetricSummary, MetricsReport, SummaryStats};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Evaluates a fixed set of metrics at a fixed set of cutoffs
#[derive(Debug, Clone)]
pub struct MetricsManager {
    metrics: Vec<Metric>,
    k_values: Vec<usize>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self {
            metrics: Metric::builtins(),
            k_values: MetricsConfig::default().k_values,
        }
    }
}

impl MetricsManager {
    /// Resolve configured metric names; unknown names fail
    pub fn new(config: &MetricsConfig, registry: &MetricRegistry) -> Result<Self> {
        config.validate().map_err(EvaluationError::InvalidConfig)?;

        let metrics = config
            .metrics
            .iter()
            .map(|name| registry.get(name).cloned())
            .collect::<Result<Vec<_>>>()?;

        let mut k_values = config.k_values.clone();
        k_values.sort_unstable();
        k_values.dedup();

        Ok(Self { metrics, k_values })
    }

    pub fn k_values(&self) -> &[usize] {
        &self.k_values
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(RankingMetric::name).collect()
    }

    /// Every metric at every `k`; a failing cell is logged and left out
    pub fn evaluate(&self, predictions: &[String], ground_truth: &GroundTruthSet) -> MetricsReport {
        let mut report = MetricsReport::new();

        for metric in &self.metrics {
            for &k in &self.k_values {
                match metric.calculate(predictions, ground_truth, k) {
                    Ok(value) => report.insert(metric.name(), k, value),
                    Err(e) => warn!("Skipping {}@{k}: {e}", metric.name()),
                }
            }
        }

        debug!("Evaluated {} metric cells", report.len());
        report
    }

    /// Per-cell mean over the reports that contain the cell
    pub fn average(reports: &[MetricsReport]) -> MetricsReport {
        let mut averaged = MetricsReport::new();
        for ((metric, k), values) in Self::collect_cells(reports) {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            averaged.insert(metric, k, mean);
        }
        averaged
    }

    /// Mean, min, max, standard deviation and count per cell
    pub fn summarize(reports: &[MetricsReport]) -> MetricSummary {
        let mut summary = MetricSummary::default();
        for ((metric, k), values) in Self::collect_cells(reports) {
            if let Some(stats) = SummaryStats::from_values(&values) {
                summary.insert(metric, k, stats);
            }
        }
        summary
    }

    /// Percentage change of `candidate` over `baseline` for cells present in
    /// both; cells with a zero baseline are omitted
    pub fn compare(baseline: &MetricsReport, candidate: &MetricsReport) -> MetricsReport {
        let mut comparison = MetricsReport::new();
        for (metric, k, base) in baseline.cells() {
            let Some(value) = candidate.get(metric, k) else {
                continue;
            };
            if base == 0.0 {
                continue;
            }
            comparison.insert(metric, k, (value - base) / base * 100.0);
        }
        comparison
    }

    fn collect_cells(reports: &[MetricsReport]) -> BTreeMap<(&str, usize), Vec<f64>> {
        let mut cells: BTreeMap<(&str, usize), Vec<f64>> = BTreeMap::new();
        for report in reports {
            for (metric, k, value) in report.cells() {
                cells.entry((metric, k)).or_default().push(value);
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MRR, NDCG, RECALL};
    use pretty_assertions::assert_eq;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn manager(metrics: &[&str], k_values: Vec<usize>) -> MetricsManager {
        let config = MetricsConfig {
            metrics: metrics.iter().map(|m| (*m).to_string()).collect(),
            k_values,
        };
        MetricsManager::new(&config, &MetricRegistry::default()).unwrap()
    }

    #[test]
    fn test_evaluate_grid() {
        let manager = manager(&[RECALL, MRR], vec![2, 1, 2]);
        assert_eq!(manager.k_values(), &[1, 2]);

        let gt: GroundTruthSet = ["A"].into_iter().collect();
        let report = manager.evaluate(&ids(&["B", "A", "C"]), &gt);

        assert_eq!(report.len(), 4);
        assert_eq!(report.get(RECALL, 1), Some(0.0));
        assert_eq!(report.get(RECALL, 2), Some(1.0));
        assert_eq!(report.get(MRR, 2), Some(0.5));
    }

    #[test_log::test]
    fn test_failing_cells_are_skipped() {
        let manager = MetricsManager::default();
        let report = manager.evaluate(&ids(&["A"]), &GroundTruthSet::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_unknown_metric() {
        let config = MetricsConfig {
            metrics: vec!["map".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            MetricsManager::new(&config, &MetricRegistry::default()),
            Err(EvaluationError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_average_ignores_missing_cells() {
        let mut first = MetricsReport::new();
        first.insert(RECALL, 1, 1.0);
        first.insert(NDCG, 5, 0.5);

        let mut second = MetricsReport::new();
        second.insert(RECALL, 1, 0.0);

        let averaged = MetricsManager::average(&[first, second]);
        assert_eq!(averaged.get(RECALL, 1), Some(0.5));
        // Only one report carries ndcg@5
        assert_eq!(averaged.get(NDCG, 5), Some(0.5));
        assert!(MetricsManager::average(&[]).is_empty());
    }

    #[test]
    fn test_summarize() {
        let reports: Vec<MetricsReport> = [0.2, 0.4, 0.9]
            .into_iter()
            .map(|value| {
                let mut report = MetricsReport::new();
                report.insert(MRR, 10, value);
                report
            })
            .collect();

        let summary = MetricsManager::summarize(&reports);
        let stats = summary.get(MRR, 10).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 0.9);
        assert!((stats.mean - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_compare() {
        let mut baseline = MetricsReport::new();
        baseline.insert(RECALL, 5, 0.5);
        baseline.insert(MRR, 5, 0.0);
        baseline.insert(NDCG, 5, 0.4);

        let mut candidate = MetricsReport::new();
        candidate.insert(RECALL, 5, 0.75);
        candidate.insert(MRR, 5, 0.3);

        let comparison = MetricsManager::compare(&baseline, &candidate);
        assert_eq!(comparison.get(RECALL, 5), Some(50.0));
        // Zero baseline omitted, missing candidate cell omitted
        assert_eq!(comparison.get(MRR, 5), None);
        assert_eq!(comparison.get(NDCG, 5), None);
        assert_eq!(comparison.len(), 1);
    }
}
