/*!
# Lexical Index

BM25 lexical scoring tuned for source code.

## Features

- **BM25 scoring** with floored IDF so ubiquitous terms never go negative
- **Snapshot statistics**: `fit` builds a complete new statistics object and
  swaps it in; queries in flight keep the snapshot they started with
- **Collection registry**: one scorer per collection name, rebuilt in place
- **Score normalization**: quality bands, sigmoid, percentile clip, log scale

## Example

```rust
use codesearch_lexical_index::{Document, LexicalScorer, NormalizationStrategy, normalize};
use codesearch_utils_tokenizer::CodeTokenizer;

# fn main() -> Result<(), codesearch_lexical_index::LexicalError> {
let tokenizer = CodeTokenizer::default();
let scorer = LexicalScorer::default();
scorer.fit(vec![
    Document::from_text("Book.java", "class Book", &tokenizer),
    Document::from_text("Member.java", "class Member", &tokenizer),
])?;

let query = tokenizer.tokenize("book");
let top = scorer.get_top_k(&query, 2)?;
assert_eq!(top[0].0, 0);

let raw: Vec<f64> = top.iter().map(|(_, score)| *score).collect();
let normalized = normalize(NormalizationStrategy::QualityBanded, &raw)?;
assert!(normalized.iter().all(|s| (0.0..=1.0).contains(s)));
# Ok(())
# }
```
*/

mod config;
mod document;
mod error;
mod normalize;
mod registry;
mod scorer;
mod stats;

pub use config::Bm25Params;
pub use document::{Document, PATH_KEY};
pub use error::{LexicalError, Result};
pub use normalize::{NormalizationStrategy, QualityBand, ScoreNormalizer, normalize};
pub use registry::CollectionRegistry;
pub use scorer::LexicalScorer;
pub use stats::CollectionStats;
