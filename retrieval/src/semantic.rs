use crate::error::Result;
use crate::result::SemanticHit;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Seam to the external nearest-neighbour engine.
///
/// Implementations return hits ordered best first; the pipeline treats the
/// order as the semantic ranking.
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SemanticHit>>;
}

#[async_trait]
impl<T: SemanticSearch + ?Sized> SemanticSearch for Arc<T> {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SemanticHit>> {
        (**self).search(query, limit).await
    }
}

/// Replays previously captured semantic hits per query.
///
/// Unknown queries yield no hits. Useful for offline evaluation runs where
/// the vector engine output was recorded once.
#[derive(Debug, Clone, Default)]
pub struct RecordedSemanticSearch {
    recorded: HashMap<String, Vec<SemanticHit>>,
}

impl RecordedSemanticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, query: impl Into<String>, hits: Vec<SemanticHit>) -> Self {
        self.record(query, hits);
        self
    }

    pub fn record(&mut self, query: impl Into<String>, mut hits: Vec<SemanticHit>) {
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        self.recorded.insert(query.into(), hits);
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

#[async_trait]
impl SemanticSearch for RecordedSemanticSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SemanticHit>> {
        Ok(self
            .recorded
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_recorded_hits_sorted_and_limited() {
        let search = RecordedSemanticSearch::new().with_hits(
            "loan",
            vec![
                SemanticHit::new("b", 0.4),
                SemanticHit::new("a", 0.9),
                SemanticHit::new("c", 0.4),
            ],
        );

        let hits = search.search("loan", 2).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty() {
        let search = RecordedSemanticSearch::new();
        assert!(search.is_empty());
        assert!(search.search("anything", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let search = Arc::new(
            RecordedSemanticSearch::new().with_hits("q", vec![SemanticHit::new("x", 1.0)]),
        );
        let hits = SemanticSearch::search(&search, "q", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
