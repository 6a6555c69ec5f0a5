use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Which retrieval paths found a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// Only the lexical (BM25) path
    Lexical,
    /// Only the semantic path
    Semantic,
    /// Both paths
    Hybrid,
}

/// A lexical hit: raw BM25 score for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalHit {
    pub document_id: String,
    pub score: f64,
}

/// A semantic hit as returned by the external nearest-neighbour engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    pub document_id: String,
    pub score: f64,
}

impl LexicalHit {
    pub fn new(document_id: impl Into<String>, score: f64) -> Self {
        Self {
            document_id: document_id.into(),
            score,
        }
    }

    /// Ranking order: score descending, then document id ascending
    pub(crate) fn ranking_cmp(&self, other: &Self) -> Ordering {
        ranking_cmp(
            (self.score, self.document_id.as_str()),
            (other.score, other.document_id.as_str()),
        )
    }
}

impl SemanticHit {
    pub fn new(document_id: impl Into<String>, score: f64) -> Self {
        Self {
            document_id: document_id.into(),
            score,
        }
    }

    /// Ranking order: score descending, then document id ascending
    pub(crate) fn ranking_cmp(&self, other: &Self) -> Ordering {
        ranking_cmp(
            (self.score, self.document_id.as_str()),
            (other.score, other.document_id.as_str()),
        )
    }
}

fn ranking_cmp(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Per-path scores behind a combined score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Raw BM25 score (0.0 when the lexical path missed)
    pub raw_lexical: f64,

    /// Raw semantic similarity (0.0 when the semantic path missed)
    pub raw_semantic: f64,

    /// Lexical score after normalization, in [0, 1]
    pub normalized_lexical: f64,
}

/// A fused, ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub document_id: String,

    /// Fusion output; the ranking key
    pub combined_score: f64,

    pub component_scores: ComponentScores,

    pub source: SearchSource,

    /// Rank in the result list (0 = best)
    pub rank: usize,

    /// Metadata echoed from the indexed document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Ranked results for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResults {
    /// Query that produced these results
    pub query: String,

    pub candidates: Vec<ScoredCandidate>,

    /// Number of distinct candidates before truncation
    pub total_candidates: usize,

    pub stats: SearchStats,
}

/// Search performance statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Total search time in milliseconds
    pub total_time_ms: u64,

    /// Lexical scoring time in milliseconds
    pub lexical_time_ms: u64,

    /// Semantic search time in milliseconds
    pub semantic_time_ms: u64,

    /// Fusion time in milliseconds
    pub fusion_time_ms: u64,

    /// Number of lexical hits
    pub lexical_count: usize,

    /// Number of semantic hits
    pub semantic_count: usize,

    /// Statistics generation the lexical path ran against
    pub generation: u64,

    /// Cache hit
    pub cache_hit: bool,
}

impl RankedResults {
    pub fn new(query: String) -> Self {
        Self {
            query,
            candidates: Vec::new(),
            total_candidates: 0,
            stats: SearchStats::default(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<ScoredCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_total_candidates(mut self, count: usize) -> Self {
        self.total_candidates = count;
        self
    }

    pub fn with_stats(mut self, stats: SearchStats) -> Self {
        self.stats = stats;
        self
    }

    /// Get top N candidates
    pub fn top(&self, n: usize) -> &[ScoredCandidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }

    /// Candidate document ids in rank order
    pub fn document_ids(&self) -> Vec<String> {
        self.candidates
            .iter()
            .map(|c| c.document_id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(id: &str, score: f64, rank: usize) -> ScoredCandidate {
        ScoredCandidate {
            document_id: id.to_string(),
            combined_score: score,
            component_scores: ComponentScores::default(),
            source: SearchSource::Hybrid,
            rank,
            metadata: None,
        }
    }

    #[test]
    fn test_ranked_results_collection() {
        let mut results = RankedResults::new("test query".to_string());
        assert!(results.is_empty());

        results = results.with_candidates(vec![candidate("a", 0.9, 0), candidate("b", 0.5, 1)]);
        assert_eq!(results.len(), 2);
        assert_eq!(results.document_ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_top_clamps() {
        let results = RankedResults::new("q".to_string()).with_candidates(vec![
            candidate("a", 0.9, 0),
            candidate("b", 0.8, 1),
            candidate("c", 0.7, 2),
        ]);

        assert_eq!(results.top(2).len(), 2);
        assert_eq!(results.top(5).len(), 3);
        assert_eq!(results.top(2)[0].rank, 0);
    }

    #[test]
    fn test_candidate_serialization_skips_missing_metadata() {
        let json = serde_json::to_value(candidate("a", 1.0, 0)).unwrap();
        assert!(json.get("metadata").is_none());
        assert_eq!(json["source"], "hybrid");
    }
}
