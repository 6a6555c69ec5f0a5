use crate::config::{FusionConfig, RetrievalConfig};
use crate::error::{Result, RetrievalError};
use crate::fusion::FusionEngine;
use crate::result::{LexicalHit, RankedResults, SearchStats, SemanticHit};
use crate::semantic::SemanticSearch;
use codesearch_lexical_index::{CollectionStats, Document, LexicalScorer};
use codesearch_utils_tokenizer::CodeTokenizer;
use log::{debug, info};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Query text, fusion identity, statistics generation
type CacheKey = (String, (u8, u64, u64), u64);

/// Hybrid retrieval engine combining BM25 and semantic search
pub struct HybridRetrieval<S> {
    config: RetrievalConfig,
    tokenizer: CodeTokenizer,
    scorer: Arc<LexicalScorer>,
    semantic: S,
    fusion_engine: FusionEngine,
    cache: Option<Mutex<LruCache<CacheKey, RankedResults>>>,
}

impl<S: SemanticSearch> HybridRetrieval<S> {
    /// Create a retrieval engine over an existing scorer and semantic provider
    pub fn new(config: RetrievalConfig, scorer: Arc<LexicalScorer>, semantic: S) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;

        info!("Initializing hybrid retrieval engine ({})", config.fusion);

        let cache = if config.enable_cache {
            let size = NonZeroUsize::new(config.cache_size)
                .ok_or_else(|| RetrievalError::Cache("Invalid cache size".to_string()))?;
            Some(Mutex::new(LruCache::new(size)))
        } else {
            None
        };

        Ok(Self {
            tokenizer: CodeTokenizer::new(config.tokenizer.clone()),
            fusion_engine: FusionEngine::new(&config)?,
            config,
            scorer,
            semantic,
            cache,
        })
    }

    /// Search under the configured fusion policy
    pub async fn search(&self, query: &str) -> Result<RankedResults> {
        let fusion = self.config.fusion;
        self.search_with(query, &fusion).await
    }

    /// Search under an explicit fusion policy
    pub async fn search_with(&self, query: &str, fusion: &FusionConfig) -> Result<RankedResults> {
        let start = Instant::now();

        let length = query.trim().chars().count();
        if length < self.config.min_query_length {
            return Err(RetrievalError::QueryTooShort {
                min: self.config.min_query_length,
                actual: length,
            });
        }
        fusion.validate().map_err(RetrievalError::InvalidConfig)?;

        // Pin one snapshot for the whole query
        let snapshot = self.scorer.snapshot()?;
        let key: CacheKey = (query.to_string(), fusion.cache_key(), snapshot.generation());

        debug!("Hybrid search for: '{query}' with {fusion}");

        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                debug!("Cache hit for query: '{query}'");
                let mut result = cached.clone();
                result.stats.cache_hit = true;
                result.stats.total_time_ms = start.elapsed().as_millis() as u64;
                return Ok(result);
            }
        }

        let mut stats = SearchStats {
            generation: snapshot.generation(),
            ..Default::default()
        };

        // Stage 1: lexical
        let lexical_start = Instant::now();
        let lexical_hits = self.lexical_hits(&snapshot, query)?;
        stats.lexical_time_ms = lexical_start.elapsed().as_millis() as u64;
        stats.lexical_count = lexical_hits.len();
        debug!("Lexical search found {} results", lexical_hits.len());

        // Stage 2: semantic
        let semantic_start = Instant::now();
        let mut semantic_hits = self
            .semantic
            .search(query, self.config.candidate_pool_size)
            .await?;
        // Providers may return more than asked for, in any order
        semantic_hits.sort_by(SemanticHit::ranking_cmp);
        semantic_hits.truncate(self.config.candidate_pool_size);
        stats.semantic_time_ms = semantic_start.elapsed().as_millis() as u64;
        stats.semantic_count = semantic_hits.len();
        debug!("Semantic search found {} results", semantic_hits.len());

        // Stage 3: fusion
        let fusion_start = Instant::now();
        let distinct: HashSet<&str> = lexical_hits
            .iter()
            .map(|h| h.document_id.as_str())
            .chain(semantic_hits.iter().map(|h| h.document_id.as_str()))
            .collect();
        let total_candidates = distinct.len();
        let mut candidates = self
            .fusion_engine
            .fuse_with(fusion, &lexical_hits, &semantic_hits)?;
        stats.fusion_time_ms = fusion_start.elapsed().as_millis() as u64;

        for candidate in &mut candidates {
            candidate.metadata = snapshot
                .index_of(&candidate.document_id)
                .and_then(|index| snapshot.document(index).ok())
                .filter(|doc| !doc.metadata.is_empty())
                .map(|doc| doc.metadata.clone());
        }

        stats.total_time_ms = start.elapsed().as_millis() as u64;

        let results = RankedResults::new(query.to_string())
            .with_candidates(candidates)
            .with_total_candidates(total_candidates)
            .with_stats(stats);

        if let Some(cache) = &self.cache {
            cache.lock().await.put(key, results.clone());
        }

        info!(
            "Search completed in {}ms, returned {} results",
            results.stats.total_time_ms,
            results.len()
        );

        Ok(results)
    }

    /// Top lexical candidates; documents sharing no query term are dropped
    fn lexical_hits(&self, snapshot: &CollectionStats, query: &str) -> Result<Vec<LexicalHit>> {
        let terms = self.tokenizer.tokenize(query);
        snapshot
            .get_top_k(&terms, self.config.candidate_pool_size)
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .map(|(index, score)| -> Result<LexicalHit> {
                let document = snapshot.document(index)?;
                Ok(LexicalHit::new(document.id.clone(), score))
            })
            .collect()
    }

    /// Refit lexical statistics; cached results for the old generation are dropped
    pub async fn rebuild<I>(&self, documents: I) -> Result<Arc<CollectionStats>>
    where
        I: IntoIterator<Item = Document>,
    {
        let stats = self.scorer.fit(documents)?;
        info!(
            "Retrieval index rebuilt: generation {}, {} documents",
            stats.generation(),
            stats.len()
        );

        if let Some(cache) = &self.cache {
            cache.lock().await.clear();
            debug!("Cache cleared after index rebuild");
        }

        Ok(stats)
    }

    /// Clear search cache
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().await.clear();
            info!("Search cache cleared");
        }
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => {
                let cache = cache.lock().await;
                CacheStats {
                    size: cache.len(),
                    capacity: cache.cap().get(),
                }
            }
            None => CacheStats::default(),
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Arc<LexicalScorer> {
        &self.scorer
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}
