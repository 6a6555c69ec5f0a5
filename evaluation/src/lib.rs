/*!
# Retrieval Evaluation

Ranking-quality measurement and fusion parameter tuning for hybrid retrieval.

## Features

- **Ranking metrics**: Recall@K, Precision@K, Hit@K, MRR and NDCG@K behind one
  [`RankingMetric`] trait, looked up by name in a [`MetricRegistry`]
- **Answer normalization**: file paths and qualified symbol names reconciled
  before comparison (`src/main/java/com/acme/Book.java` ≡ `com.acme.Book`)
- **Reports**: per-cell averages, summaries and percentage comparisons
- **Evaluation runs**: labelled questions scored per difficulty level
- **Weight optimization**: concurrent grid search over fusion parameters,
  maximising mean NDCG@K with a safe fallback

## Example

```rust
use codesearch_evaluation::{
    EvaluationError, LabeledQuery, MetricsConfig, OptimizerConfig, ParameterGrid,
    RetrievalCallback, WeightOptimizer,
};
use codesearch_retrieval::FusionConfig;
use std::sync::Arc;

struct Fixed;

#[async_trait::async_trait]
impl RetrievalCallback for Fixed {
    async fn retrieve(
        &self,
        _query: &str,
        fusion: &FusionConfig,
    ) -> Result<Vec<String>, EvaluationError> {
        Ok(if fusion.is_rank_fusion() {
            vec!["Book.java".to_string()]
        } else {
            vec!["Member.java".to_string(), "Book.java".to_string()]
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), EvaluationError> {
    let optimizer = WeightOptimizer::new(OptimizerConfig::default(), &MetricsConfig::default())?;
    let grid = ParameterGrid::Explicit(vec![
        FusionConfig::weighted(0.7, 0.3),
        FusionConfig::rank_fusion(60.0),
    ]);

    let report = optimizer
        .optimize(Arc::new(Fixed), &[LabeledQuery::new("book", ["Book.java"])], &grid)
        .await?;

    assert_eq!(report.best_config, FusionConfig::rank_fusion(60.0));
    Ok(())
}
```
*/

mod answer;
mod config;
mod dataset;
mod error;
mod manager;
mod metrics;
mod optimizer;
mod report;
mod runner;

pub use answer::{
    AnswerNormalizer, AnswerNormalizerConfig, DEFAULT_NAMESPACE_ROOTS, DEFAULT_SOURCE_ROOTS,
};
pub use config::{MetricsConfig, OptimizerConfig};
pub use dataset::{Answer, Difficulty, EvaluationQuestion, GroundTruthSet};
pub use error::{EvaluationError, Result};
pub use manager::MetricsManager;
pub use metrics::{
    HIT, HitAtK, MRR, MeanReciprocalRank, Metric, MetricRegistry, NDCG, NdcgAtK, PRECISION,
    PrecisionAtK, RECALL, RankingMetric, RecallAtK,
};
pub use optimizer::{
    GridPointResult, LabeledQuery, OptimizerReport, ParameterGrid, RetrievalCallback,
    WeightOptimizer,
};
pub use report::{MetricSummary, MetricsReport, SummaryStats};
pub use runner::{EvaluationRun, EvaluationRunner, QuestionResult};
