use crate::metrics::{HIT, MRR, NDCG, PRECISION, RECALL};
use codesearch_retrieval::FusionConfig;
use serde::{Deserialize, Serialize};

/// Which metrics to compute, at which cutoffs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Metric names, resolved through a `MetricRegistry`
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    #[serde(default = "default_k_values")]
    pub k_values: Vec<usize>,
}

fn default_metrics() -> Vec<String> {
    [RECALL, PRECISION, HIT, MRR, NDCG]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_k_values() -> Vec<usize> {
    vec![1, 3, 5, 10]
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
            k_values: default_k_values(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.metrics.is_empty() {
            return Err("at least one metric is required".to_string());
        }
        if self.k_values.is_empty() {
            return Err("at least one k value is required".to_string());
        }
        if self.k_values.contains(&0) {
            return Err("k values must be >= 1".to_string());
        }
        Ok(())
    }

    /// Largest requested cutoff
    pub fn max_k(&self) -> Option<usize> {
        self.k_values.iter().copied().max()
    }
}

/// Grid-search settings for the weight optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// NDCG cutoff; the largest metrics `k` when unset
    #[serde(default)]
    pub ndcg_k: Option<usize>,

    /// Maximum retrieval calls in flight
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Returned when no grid point produced a score
    #[serde(default)]
    pub fallback_config: FusionConfig,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            ndcg_k: None,
            max_concurrent: default_max_concurrent(),
            call_timeout_ms: default_call_timeout_ms(),
            fallback_config: FusionConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ndcg_k == Some(0) {
            return Err("ndcg_k must be >= 1".to_string());
        }
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be > 0".to_string());
        }
        if self.call_timeout_ms == 0 {
            return Err("call_timeout_ms must be > 0".to_string());
        }
        self.fallback_config.validate()
    }

    /// Cutoff actually used for NDCG
    pub fn resolve_k(&self, metrics: &MetricsConfig) -> usize {
        self.ndcg_k.or_else(|| metrics.max_k()).unwrap_or(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_valid() {
        assert!(MetricsConfig::default().validate().is_ok());
        assert!(OptimizerConfig::default().validate().is_ok());
        assert_eq!(OptimizerConfig::default().fallback_config, FusionConfig::weighted(0.7, 0.3));
    }

    #[test]
    fn test_metrics_validation() {
        let config = MetricsConfig {
            k_values: vec![1, 0],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MetricsConfig {
            metrics: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_k() {
        let metrics = MetricsConfig {
            k_values: vec![3, 20, 5],
            ..Default::default()
        };
        assert_eq!(OptimizerConfig::default().resolve_k(&metrics), 20);

        let config = OptimizerConfig {
            ndcg_k: Some(5),
            ..Default::default()
        };
        assert_eq!(config.resolve_k(&metrics), 5);
    }

    #[test]
    fn test_optimizer_validation() {
        let config = OptimizerConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = OptimizerConfig {
            fallback_config: FusionConfig::rank_fusion(-1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_optimizer_config_serde_defaults() {
        let config: OptimizerConfig = serde_json::from_str(r#"{"max_concurrent": 8}"#).unwrap();
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.call_timeout_ms, 30_000);
        assert_eq!(config.ndcg_k, None);
    }
}
