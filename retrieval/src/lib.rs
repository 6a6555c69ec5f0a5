/*!
# Hybrid Retrieval

Combines BM25 lexical ranking with an external semantic ranking:
- **Lexical search** via the BM25 scorer over a pinned statistics snapshot
- **Semantic search** through the [`SemanticSearch`] seam
- **Fusion** by weighted sum over normalized scores or Reciprocal Rank Fusion

## Features

- **Multi-stage pipeline**: Lexical → Semantic → Fusion
- **Two fusion policies**: weighted sum, RRF; one active per call
- **Deterministic output**: ties broken by document id
- **LRU caching**: keyed by query, fusion policy and statistics generation
- **Performance metrics**: per-stage timings in [`SearchStats`]

## Architecture

```text
Query
  ├─> CodeTokenizer → BM25 top-K (score > 0)
  ├─> SemanticSearch top-K
  └─> Fusion (Weighted / RRF)
        └─> Final ranked candidates (+ document metadata)
```

## Example

```rust
use codesearch_lexical_index::{Document, LexicalScorer};
use codesearch_retrieval::{
    HybridRetrieval, RecordedSemanticSearch, RetrievalConfig, SemanticHit,
};
use codesearch_utils_tokenizer::CodeTokenizer;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tokenizer = CodeTokenizer::default();
    let scorer = Arc::new(LexicalScorer::default());
    scorer.fit(vec![
        Document::from_text("Book.java", "class Book", &tokenizer),
        Document::from_text("Member.java", "class Member", &tokenizer),
    ])?;

    let semantic = RecordedSemanticSearch::new()
        .with_hits("book", vec![SemanticHit::new("Book.java", 0.9)]);

    let retrieval = HybridRetrieval::new(RetrievalConfig::default(), scorer, semantic)?;
    let results = retrieval.search("book").await?;

    assert_eq!(results.candidates[0].document_id, "Book.java");
    Ok(())
}
```

## Fusion Policies

- **Weighted** (default 0.7 semantic / 0.3 lexical): score-aware, needs normalized lexical scores
- **ReciprocalRank**: rank-only, robust to incomparable score scales
*/

mod config;
mod error;
mod fusion;
mod result;
mod retrieval;
mod semantic;

pub use config::{DEFAULT_RANK_CONSTANT, FusionConfig, RetrievalConfig};
pub use error::{Result, RetrievalError};
pub use fusion::FusionEngine;
pub use result::{
    ComponentScores, LexicalHit, RankedResults, ScoredCandidate, SearchSource, SearchStats,
    SemanticHit,
};
pub use retrieval::{CacheStats, HybridRetrieval};
pub use semantic::{RecordedSemanticSearch, SemanticSearch};
