use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric values keyed by metric name, then by cutoff `k`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsReport {
    values: BTreeMap<String, BTreeMap<usize, f64>>,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: &str, k: usize, value: f64) {
        self.values
            .entry(metric.to_string())
            .or_default()
            .insert(k, value);
    }

    pub fn get(&self, metric: &str, k: usize) -> Option<f64> {
        self.values.get(metric).and_then(|by_k| by_k.get(&k)).copied()
    }

    /// Values of one metric by `k`
    pub fn metric(&self, metric: &str) -> Option<&BTreeMap<usize, f64>> {
        self.values.get(metric)
    }

    /// `(metric, k, value)` in metric then `k` order
    pub fn cells(&self) -> impl Iterator<Item = (&str, usize, f64)> {
        self.values.iter().flat_map(|(metric, by_k)| {
            by_k.iter()
                .map(move |(k, value)| (metric.as_str(), *k, *value))
        })
    }

    /// Number of `(metric, k)` cells
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distribution of one `(metric, k)` cell across reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub count: usize,
}

impl SummaryStats {
    /// `None` for an empty sample
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
            count,
        })
    }
}

/// Summary statistics keyed by metric name, then by cutoff `k`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSummary {
    values: BTreeMap<String, BTreeMap<usize, SummaryStats>>,
}

impl MetricSummary {
    pub(crate) fn insert(&mut self, metric: &str, k: usize, stats: SummaryStats) {
        self.values
            .entry(metric.to_string())
            .or_default()
            .insert(k, stats);
    }

    pub fn get(&self, metric: &str, k: usize) -> Option<&SummaryStats> {
        self.values.get(metric).and_then(|by_k| by_k.get(&k))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_cells() {
        let mut report = MetricsReport::new();
        report.insert("recall", 5, 0.5);
        report.insert("mrr", 1, 1.0);
        report.insert("recall", 1, 0.0);

        assert_eq!(report.len(), 3);
        assert_eq!(report.get("recall", 5), Some(0.5));
        assert_eq!(report.get("recall", 3), None);

        let cells: Vec<(&str, usize, f64)> = report.cells().collect();
        assert_eq!(
            cells,
            vec![("mrr", 1, 1.0), ("recall", 1, 0.0), ("recall", 5, 0.5)]
        );
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = MetricsReport::new();
        report.insert("ndcg", 10, 0.75);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"ndcg": {"10": 0.75}}));

        let back: MetricsReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_summary_stats() {
        let stats = SummaryStats::from_values(&[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(stats.mean, 0.5);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.count, 3);
        assert!((stats.std_dev - (1.0f64 / 6.0).sqrt()).abs() < 1e-12);

        assert!(SummaryStats::from_values(&[]).is_none());
    }
}
