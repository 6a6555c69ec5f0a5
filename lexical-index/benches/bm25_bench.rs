use codesearch_lexical_index::{Document, LexicalScorer, NormalizationStrategy, ScoreNormalizer};
use codesearch_utils_tokenizer::CodeTokenizer;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn create_documents(count: usize, tokenizer: &CodeTokenizer) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let text = format!(
                "public class Service{i} {{ fn handle_request_{i}(user_id: u64) -> Response {{ \
                 let cache = CacheLayer::new(); cache.lookup(user_id) }} }}"
            );
            Document::from_text(format!("src/service_{i}.rs"), &text, tokenizer)
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let tokenizer = CodeTokenizer::default();
    let mut group = c.benchmark_group("bm25_fit");

    for doc_count in [100, 1000, 5000] {
        let documents = create_documents(doc_count, &tokenizer);
        group.throughput(Throughput::Elements(doc_count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(doc_count), &documents, |b, docs| {
            let scorer = LexicalScorer::default();
            b.iter(|| {
                let stats = scorer.fit(black_box(docs.clone())).unwrap();
                black_box(stats);
            });
        });
    }

    group.finish();
}

fn bench_top_k(c: &mut Criterion) {
    let tokenizer = CodeTokenizer::default();
    let mut group = c.benchmark_group("bm25_top_k");

    for doc_count in [100, 1000, 5000] {
        let scorer = LexicalScorer::default();
        scorer.fit(create_documents(doc_count, &tokenizer)).unwrap();
        let query = tokenizer.tokenize("handle request cache lookup");

        group.throughput(Throughput::Elements(doc_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(doc_count), &query, |b, q| {
            b.iter(|| {
                let top = scorer.get_top_k(black_box(q), 50).unwrap();
                black_box(top);
            });
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let scores: Vec<f64> = (0..1000).map(|i| f64::from(i) * 0.03).collect();
    let mut group = c.benchmark_group("normalize");

    for (name, strategy) in [
        ("quality_banded", NormalizationStrategy::QualityBanded),
        ("sigmoid", NormalizationStrategy::sigmoid()),
        ("percentile", NormalizationStrategy::percentile()),
        ("log_scale", NormalizationStrategy::LogScale),
    ] {
        let normalizer = ScoreNormalizer::new(strategy).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(normalizer.normalize(black_box(&scores))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_top_k, bench_normalize);
criterion_main!(benches);
