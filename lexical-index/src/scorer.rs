use crate::config::Bm25Params;
use crate::document::Document;
use crate::error::{LexicalError, Result};
use crate::stats::CollectionStats;
use log::{debug, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// BM25 scorer over a swappable statistics snapshot.
///
/// [`LexicalScorer::fit`] builds a complete [`CollectionStats`] before taking
/// the write lock, so readers observe either the previous statistics or the
/// new ones. Callers holding a snapshot keep it across rebuilds.
#[derive(Debug)]
pub struct LexicalScorer {
    params: Bm25Params,
    current: RwLock<Option<Arc<CollectionStats>>>,
    generation: AtomicU64,
}

impl LexicalScorer {
    pub fn new(params: Bm25Params) -> Result<Self> {
        params.validate().map_err(LexicalError::InvalidParams)?;
        Ok(Self {
            params,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        })
    }

    pub fn params(&self) -> &Bm25Params {
        &self.params
    }

    /// Build statistics for `documents` and make them current
    pub fn fit<I>(&self, documents: I) -> Result<Arc<CollectionStats>>
    where
        I: IntoIterator<Item = Document>,
    {
        let documents: Vec<Document> = documents.into_iter().collect();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        debug!(
            "Building BM25 statistics (generation {generation}, {} documents)",
            documents.len()
        );
        let stats = Arc::new(CollectionStats::build(documents, self.params, generation)?);

        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            // A slower concurrent fit must not overwrite a newer one
            let is_newer = current
                .as_ref()
                .is_none_or(|existing| existing.generation() < generation);
            if is_newer {
                *current = Some(Arc::clone(&stats));
            }
        }

        info!(
            "Fitted collection: {} documents, avg length {:.2}, generation {generation}",
            stats.len(),
            stats.avg_doc_len()
        );
        Ok(stats)
    }

    /// Fit raw term lists, using each list's position as its document id
    pub fn fit_terms(&self, term_lists: Vec<Vec<String>>) -> Result<Arc<CollectionStats>> {
        self.fit(
            term_lists
                .into_iter()
                .enumerate()
                .map(|(index, terms)| Document::new(index.to_string(), terms)),
        )
    }

    /// Current statistics; errors if `fit` has never succeeded
    pub fn snapshot(&self) -> Result<Arc<CollectionStats>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(LexicalError::NotFitted)
    }

    pub fn is_fitted(&self) -> bool {
        self.snapshot().is_ok()
    }

    pub fn score(&self, query_terms: &[String], document_index: usize) -> Result<f64> {
        self.snapshot()?.score(query_terms, document_index)
    }

    /// One score per document, in collection order
    pub fn score_all(&self, query_terms: &[String]) -> Result<Vec<f64>> {
        Ok(self.snapshot()?.score_all(query_terms))
    }

    pub fn get_top_k(&self, query_terms: &[String], k: usize) -> Result<Vec<(usize, f64)>> {
        Ok(self.snapshot()?.get_top_k(query_terms, k))
    }
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self {
            params: Bm25Params::default(),
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }
}
