use crate::config::Bm25Params;
use crate::document::Document;
use crate::error::{LexicalError, Result};
use std::collections::HashMap;

/// Immutable BM25 statistics for one fitted collection.
///
/// Built in full by [`CollectionStats::build`] and never mutated afterwards;
/// a rebuild produces a new value.
#[derive(Debug)]
pub struct CollectionStats {
    generation: u64,
    params: Bm25Params,
    documents: Vec<Document>,
    id_index: HashMap<String, usize>,
    term_counts: Vec<HashMap<String, u32>>,
    doc_freq: HashMap<String, usize>,
    idf: HashMap<String, f64>,
    avg_doc_len: f64,
}

impl CollectionStats {
    /// Compute statistics for `documents`
    pub fn build(documents: Vec<Document>, params: Bm25Params, generation: u64) -> Result<Self> {
        params.validate().map_err(LexicalError::InvalidParams)?;

        let mut id_index = HashMap::with_capacity(documents.len());
        let mut term_counts = Vec::with_capacity(documents.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0usize;

        for (index, doc) in documents.iter().enumerate() {
            if id_index.insert(doc.id.clone(), index).is_some() {
                return Err(LexicalError::DuplicateDocument(doc.id.clone()));
            }

            let mut counts: HashMap<String, u32> = HashMap::new();
            for term in &doc.terms {
                *counts.entry(term.clone()).or_insert(0) += 1;
            }
            for term in counts.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }

            total_len += doc.len();
            term_counts.push(counts);
        }

        let n = documents.len() as f64;
        let avg_doc_len = if documents.is_empty() {
            0.0
        } else {
            total_len as f64 / n
        };

        let idf = doc_freq
            .iter()
            .map(|(term, &df)| {
                let df = df as f64;
                let raw = ((n - df + 0.5) / (df + 0.5)).ln();
                (term.clone(), raw.max(params.idf_floor))
            })
            .collect();

        Ok(Self {
            generation,
            params,
            documents,
            id_index,
            term_counts,
            doc_freq,
            idf,
            avg_doc_len,
        })
    }

    /// Rebuild counter of the scorer that produced these statistics
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> &Bm25Params {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    /// Number of documents containing `term`
    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    /// Floored IDF of `term`, `None` when the term never occurs
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn document(&self, index: usize) -> Result<&Document> {
        self.documents.get(index).ok_or(LexicalError::UnknownDocument {
            index,
            len: self.documents.len(),
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    /// BM25 score of `query_terms` against the document at `index`
    pub fn score(&self, query_terms: &[String], index: usize) -> Result<f64> {
        let doc = self.document(index)?;
        Ok(self.score_unchecked(query_terms, index, doc.len()))
    }

    /// Scores for every document in collection order
    pub fn score_all(&self, query_terms: &[String]) -> Vec<f64> {
        self.documents
            .iter()
            .enumerate()
            .map(|(index, doc)| self.score_unchecked(query_terms, index, doc.len()))
            .collect()
    }

    /// Top `k` documents by descending score. Equal scores keep collection order.
    pub fn get_top_k(&self, query_terms: &[String], k: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.score_all(query_terms).into_iter().enumerate().collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    fn score_unchecked(&self, query_terms: &[String], index: usize, doc_len: usize) -> f64 {
        let counts = &self.term_counts[index];
        let Bm25Params { k1, b, .. } = self.params;

        let length_ratio = if self.avg_doc_len > 0.0 {
            doc_len as f64 / self.avg_doc_len
        } else {
            0.0
        };
        let norm = k1 * (1.0 - b + b * length_ratio);

        let mut score = 0.0;
        for term in query_terms {
            let Some(idf) = self.idf.get(term) else {
                continue;
            };
            let Some(&tf) = counts.get(term) else {
                continue;
            };
            let tf = f64::from(tf);
            score += idf * (tf * (k1 + 1.0)) / (tf + norm);
        }
        score
    }
}
