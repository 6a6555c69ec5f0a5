use codesearch_evaluation::{
    AnswerNormalizer, Difficulty, EvaluationQuestion, EvaluationRunner, LabeledQuery, MRR,
    MetricsConfig, NDCG, OptimizerConfig, ParameterGrid, RECALL, WeightOptimizer,
};
use codesearch_lexical_index::{Document, LexicalScorer, PATH_KEY};
use codesearch_retrieval::{
    FusionConfig, HybridRetrieval, RecordedSemanticSearch, RetrievalConfig, SemanticHit,
};
use codesearch_utils_tokenizer::CodeTokenizer;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const ROOT: &str = "src/main/java/com/acme/library";

fn path(name: &str) -> String {
    format!("{ROOT}/{name}.java")
}

fn library() -> Vec<Document> {
    let tokenizer = CodeTokenizer::default();
    [
        (
            "Book",
            "public class Book { private String isbn; private String title; \
             public String getTitle() { return title; } }",
        ),
        (
            "Member",
            "public class Member { private String name; public void borrow(Book book) {} }",
        ),
        (
            "Loan",
            "public class Loan { private Book book; private Member member; \
             private LocalDate dueDate; }",
        ),
        (
            "Catalog",
            "public class Catalog { private List<Book> books; \
             public Book findByIsbn(String isbn) { return null; } }",
        ),
    ]
    .into_iter()
    .map(|(name, source)| {
        Document::from_text(path(name), source, &tokenizer).with_metadata(PATH_KEY, path(name))
    })
    .collect()
}

fn semantic() -> RecordedSemanticSearch {
    RecordedSemanticSearch::new()
        .with_hits(
            "due date",
            vec![
                SemanticHit::new(path("Loan"), 0.9),
                SemanticHit::new(path("Member"), 0.3),
            ],
        )
        .with_hits(
            "find book by isbn",
            vec![
                SemanticHit::new(path("Catalog"), 0.85),
                SemanticHit::new(path("Book"), 0.8),
            ],
        )
        .with_hits(
            "who borrows books",
            vec![
                SemanticHit::new(path("Member"), 0.7),
                SemanticHit::new(path("Loan"), 0.6),
            ],
        )
}

fn retrieval() -> anyhow::Result<Arc<HybridRetrieval<RecordedSemanticSearch>>> {
    let scorer = Arc::new(LexicalScorer::default());
    scorer.fit(library())?;
    Ok(Arc::new(HybridRetrieval::new(
        RetrievalConfig::default(),
        scorer,
        semantic(),
    )?))
}

#[test_log::test(tokio::test)]
async fn optimizer_searches_hybrid_retrieval() -> anyhow::Result<()> {
    let retrieval = retrieval()?;
    let queries = vec![
        LabeledQuery::new("due date", ["com.acme.library.Loan"]),
        LabeledQuery::new("find book by isbn", ["com.acme.library.Catalog"]),
        LabeledQuery::new("who borrows books", ["com.acme.library.Member"]),
        LabeledQuery::new("unlabelled", Vec::<String>::new()),
    ];

    let optimizer = WeightOptimizer::new(OptimizerConfig::default(), &MetricsConfig::default())?
        .with_normalizer(AnswerNormalizer::default());
    let report = optimizer
        .optimize(retrieval, &queries, &ParameterGrid::weights())
        .await?;

    assert!(!report.used_fallback);
    assert_eq!(report.labeled_queries, 3);
    assert_eq!(report.grid.len(), 11);
    assert!(report.grid.iter().all(|p| p.evaluated == 3 && p.skipped == 0));

    let best = report.best_mean_ndcg.unwrap_or_default();
    assert!((0.0..=1.0).contains(&best));
    for point in &report.grid {
        assert!(point.mean_ndcg.unwrap_or_default() <= best);
    }

    // Earliest grid point reaching the best mean
    let first_best = report
        .grid
        .iter()
        .find(|p| p.mean_ndcg == Some(best))
        .map(|p| p.config);
    assert_eq!(first_best, Some(report.best_config));

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["best_config"]["policy"], "weighted");
    Ok(())
}

#[tokio::test]
async fn optimizer_is_reproducible() -> anyhow::Result<()> {
    let queries = vec![
        LabeledQuery::new("due date", ["com.acme.library.Loan"]),
        LabeledQuery::new("find book by isbn", ["com.acme.library.Catalog"]),
    ];
    let grid = ParameterGrid::RankConstant {
        start: 10.0,
        end: 100.0,
        step: 30.0,
    };
    let optimizer = WeightOptimizer::new(OptimizerConfig::default(), &MetricsConfig::default())?
        .with_normalizer(AnswerNormalizer::default());

    let first = optimizer.optimize(retrieval()?, &queries, &grid).await?;
    let second = optimizer.optimize(retrieval()?, &queries, &grid).await?;

    assert_eq!(first, second);
    assert_eq!(first.grid.len(), 4);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn evaluation_run_over_questions() -> anyhow::Result<()> {
    let questions: Vec<EvaluationQuestion> = serde_json::from_str(
        r#"[
            {"difficulty": "easy", "question": "due date", "answer": "com.acme.library.Loan"},
            {"difficulty": "medium", "question": "find book by isbn",
             "answer": ["src/main/java/com/acme/library/Catalog.java", "com.acme.library.Book"]},
            {"difficulty": "hard", "question": "who borrows books", "answer": "com.acme.library.Member"},
            {"difficulty": "hard", "question": "x", "answer": "com.acme.library.Book"}
        ]"#,
    )?;

    let retrieval = retrieval()?;
    let runner = EvaluationRunner::default();

    let weighted = runner
        .run(retrieval.as_ref(), &questions, &FusionConfig::default())
        .await;
    // "x" is below the minimum query length
    assert_eq!(weighted.skipped, 1);
    assert_eq!(weighted.evaluated(), 3);

    // Only the loan class mentions a due date
    let easy = &weighted.by_difficulty[&Difficulty::Easy];
    assert_eq!(easy.get(MRR, 1), Some(1.0));

    for (_, _, value) in weighted.overall.cells() {
        assert!((0.0..=1.0).contains(&value));
    }
    let medium = &weighted.by_difficulty[&Difficulty::Medium];
    assert!(medium.get(RECALL, 10).is_some_and(|recall| recall > 0.0));

    let rrf = runner
        .run(retrieval.as_ref(), &questions, &FusionConfig::rank_fusion(60.0))
        .await;
    let comparison = rrf.compare(&weighted);
    for (metric, k, _) in comparison.cells() {
        assert!(weighted.overall.get(metric, k).is_some_and(|v| v > 0.0));
    }
    assert!(rrf.overall.get(NDCG, 10).is_some());
    Ok(())
}
