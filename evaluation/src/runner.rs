use crate::answer::AnswerNormalizer;
use crate::dataset::{Difficulty, EvaluationQuestion};
use crate::manager::MetricsManager;
use crate::optimizer::RetrievalCallback;
use crate::report::{MetricSummary, MetricsReport};
use codesearch_retrieval::FusionConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics for one evaluated question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub difficulty: Difficulty,
    pub report: MetricsReport,
}

/// Outcome of evaluating a question set under one fusion policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub fusion: FusionConfig,

    /// Mean over all evaluated questions
    pub overall: MetricsReport,

    pub by_difficulty: BTreeMap<Difficulty, MetricsReport>,

    pub summary: MetricSummary,

    pub questions: Vec<QuestionResult>,

    /// Questions left out: callback failure or no usable answer
    pub skipped: usize,
}

impl EvaluationRun {
    pub fn evaluated(&self) -> usize {
        self.questions.len()
    }

    /// Percentage change of this run over `baseline`
    pub fn compare(&self, baseline: &EvaluationRun) -> MetricsReport {
        MetricsManager::compare(&baseline.overall, &self.overall)
    }
}

/// Runs labelled questions through retrieval and scores the answers
#[derive(Debug, Clone, Default)]
pub struct EvaluationRunner {
    manager: MetricsManager,
    normalizer: AnswerNormalizer,
}

impl EvaluationRunner {
    pub fn new(manager: MetricsManager, normalizer: AnswerNormalizer) -> Self {
        Self {
            manager,
            normalizer,
        }
    }

    pub fn manager(&self) -> &MetricsManager {
        &self.manager
    }

    pub async fn run<C>(
        &self,
        callback: &C,
        questions: &[EvaluationQuestion],
        fusion: &FusionConfig,
    ) -> EvaluationRun
    where
        C: RetrievalCallback + ?Sized,
    {
        info!("Evaluating {} questions with {fusion}", questions.len());

        let mut results = Vec::with_capacity(questions.len());
        let mut skipped = 0;

        for question in questions {
            let ground_truth = self.normalizer.normalize_answers(&question.answer);
            if ground_truth.is_empty() {
                warn!("Skipping '{}': no usable answer", question.question);
                skipped += 1;
                continue;
            }

            let predictions = match callback.retrieve(&question.question, fusion).await {
                Ok(predictions) => self.normalizer.normalize_predictions(&predictions),
                Err(e) => {
                    warn!("Skipping '{}': {e}", question.question);
                    skipped += 1;
                    continue;
                }
            };

            results.push(QuestionResult {
                question: question.question.clone(),
                difficulty: question.difficulty,
                report: self.manager.evaluate(&predictions, &ground_truth),
            });
        }

        let reports: Vec<MetricsReport> = results.iter().map(|r| r.report.clone()).collect();

        let mut grouped: BTreeMap<Difficulty, Vec<MetricsReport>> = BTreeMap::new();
        for result in &results {
            grouped
                .entry(result.difficulty)
                .or_default()
                .push(result.report.clone());
        }
        let by_difficulty = grouped
            .into_iter()
            .map(|(difficulty, reports)| (difficulty, MetricsManager::average(&reports)))
            .collect();

        info!(
            "Evaluation finished: {} evaluated, {skipped} skipped",
            results.len()
        );

        EvaluationRun {
            fusion: *fusion,
            overall: MetricsManager::average(&reports),
            by_difficulty,
            summary: MetricsManager::summarize(&reports),
            questions: results,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Answer;
    use crate::error::{EvaluationError, Result};
    use crate::metrics::{HIT, MRR, RECALL};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Rankings that depend on the fusion policy
    struct Library;

    #[async_trait]
    impl RetrievalCallback for Library {
        async fn retrieve(&self, query: &str, fusion: &FusionConfig) -> Result<Vec<String>> {
            let paths: &[&str] = match (query, fusion.is_rank_fusion()) {
                ("offline", _) => {
                    return Err(EvaluationError::Callback("index offline".to_string()));
                }
                ("book", false) => &[
                    "src/main/java/com/acme/Member.java",
                    "src/main/java/com/acme/Book.java",
                ],
                ("book", true) => &["src/main/java/com/acme/Book.java"],
                ("loan", _) => &[
                    "src/main/java/com/acme/Loan.java",
                    "src/main/java/com/acme/Loan.java",
                ],
                _ => &[],
            };
            Ok(paths.iter().map(|p| (*p).to_string()).collect())
        }
    }

    fn questions() -> Vec<EvaluationQuestion> {
        vec![
            EvaluationQuestion::new(Difficulty::Easy, "loan", Answer::single("com.acme.Loan")),
            EvaluationQuestion::new(
                Difficulty::Hard,
                "book",
                Answer::many(["com.acme.Book", "com.acme.Catalog"]).unwrap(),
            ),
            EvaluationQuestion::new(Difficulty::Hard, "offline", Answer::single("com.acme.Book")),
            EvaluationQuestion::new(Difficulty::Medium, "empty", Answer::single("   ")),
        ]
    }

    #[test_log::test(tokio::test)]
    async fn test_run() {
        let runner = EvaluationRunner::default();
        let run = runner
            .run(&Library, &questions(), &FusionConfig::default())
            .await;

        assert_eq!(run.evaluated(), 2);
        assert_eq!(run.skipped, 2);

        let easy = &run.by_difficulty[&Difficulty::Easy];
        assert_eq!(easy.get(MRR, 1), Some(1.0));

        let hard = &run.by_difficulty[&Difficulty::Hard];
        assert_eq!(hard.get(MRR, 3), Some(0.5));
        assert_eq!(hard.get(RECALL, 3), Some(0.5));
        assert!(!run.by_difficulty.contains_key(&Difficulty::Medium));

        assert_eq!(run.overall.get(HIT, 1), Some(0.5));
        assert_eq!(run.overall.get(MRR, 10), Some(0.75));
        assert_eq!(run.summary.get(MRR, 10).map(|s| s.count), Some(2));
    }

    #[tokio::test]
    async fn test_compare_runs() {
        let runner = EvaluationRunner::default();
        let baseline = runner
            .run(&Library, &questions(), &FusionConfig::default())
            .await;
        let candidate = runner
            .run(&Library, &questions(), &FusionConfig::rank_fusion(60.0))
            .await;

        let comparison = candidate.compare(&baseline);
        // hit@1 goes from 0.5 to 1.0
        assert_eq!(comparison.get(HIT, 1), Some(100.0));
        // mrr@10 goes from 0.75 to 1.0
        let change = comparison.get(MRR, 10).unwrap();
        assert!((change - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_question_set() {
        let run = EvaluationRunner::default()
            .run(&Library, &[], &FusionConfig::default())
            .await;
        assert_eq!(run.evaluated(), 0);
        assert!(run.overall.is_empty());
        assert!(run.summary.is_empty());
    }
}
