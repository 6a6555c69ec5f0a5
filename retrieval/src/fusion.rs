use crate::config::{FusionConfig, RetrievalConfig};
use crate::error::{Result, RetrievalError};
use crate::result::{ComponentScores, LexicalHit, ScoredCandidate, SearchSource, SemanticHit};
use codesearch_lexical_index::{NormalizationStrategy, ScoreNormalizer};
use log::debug;
use std::collections::HashMap;

/// Fusion engine for combining lexical and semantic rankings.
///
/// Each hit list is ranked by its own score, descending, with ties broken by
/// document id; a document repeated within one list keeps its best position. Output is sorted by
/// combined score descending, then document id ascending.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    fusion: FusionConfig,
    normalizer: ScoreNormalizer,
    limit: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    components: ComponentScores,
    lexical_rank: Option<usize>,
    semantic_rank: Option<usize>,
}

impl FusionEngine {
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;
        Ok(Self {
            fusion: config.fusion,
            normalizer: Self::normalizer(config.normalization)?,
            limit: config.final_result_count,
        })
    }

    /// Engine with an explicit policy and no result limit
    pub fn with_policy(fusion: FusionConfig, normalization: NormalizationStrategy) -> Result<Self> {
        fusion.validate().map_err(RetrievalError::InvalidConfig)?;
        Ok(Self {
            fusion,
            normalizer: Self::normalizer(normalization)?,
            limit: usize::MAX,
        })
    }

    fn normalizer(strategy: NormalizationStrategy) -> Result<ScoreNormalizer> {
        ScoreNormalizer::new(strategy).map_err(|e| RetrievalError::InvalidConfig(e.to_string()))
    }

    pub fn fusion(&self) -> &FusionConfig {
        &self.fusion
    }

    /// Fuse under the engine's configured policy
    pub fn fuse(&self, lexical: &[LexicalHit], semantic: &[SemanticHit]) -> Vec<ScoredCandidate> {
        self.fuse_validated(&self.fusion, lexical, semantic)
    }

    /// Fuse under an explicit policy
    pub fn fuse_with(
        &self,
        fusion: &FusionConfig,
        lexical: &[LexicalHit],
        semantic: &[SemanticHit],
    ) -> Result<Vec<ScoredCandidate>> {
        fusion.validate().map_err(RetrievalError::InvalidConfig)?;
        Ok(self.fuse_validated(fusion, lexical, semantic))
    }

    fn fuse_validated(
        &self,
        fusion: &FusionConfig,
        lexical: &[LexicalHit],
        semantic: &[SemanticHit],
    ) -> Vec<ScoredCandidate> {
        debug!(
            "Fusing {} lexical + {} semantic hits with {fusion}",
            lexical.len(),
            semantic.len()
        );

        let mut candidates = self.collect(lexical, semantic);

        let mut fused: Vec<ScoredCandidate> = candidates
            .drain()
            .map(|(document_id, acc)| {
                let combined_score = Self::combine(fusion, &acc);
                let source = match (acc.lexical_rank, acc.semantic_rank) {
                    (Some(_), Some(_)) => SearchSource::Hybrid,
                    (Some(_), None) => SearchSource::Lexical,
                    _ => SearchSource::Semantic,
                };
                ScoredCandidate {
                    document_id,
                    combined_score,
                    component_scores: acc.components,
                    source,
                    rank: 0,
                    metadata: None,
                }
            })
            .collect();

        fused.sort_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        fused.truncate(self.limit);

        for (rank, candidate) in fused.iter_mut().enumerate() {
            candidate.rank = rank;
        }

        debug!("Fusion produced {} candidates", fused.len());
        fused
    }

    /// Merge both lists into per-document accumulators with 1-based ranks
    fn collect(
        &self,
        lexical: &[LexicalHit],
        semantic: &[SemanticHit],
    ) -> HashMap<String, Accumulator> {
        let mut candidates: HashMap<String, Accumulator> = HashMap::new();

        let mut lexical: Vec<&LexicalHit> = lexical.iter().collect();
        lexical.sort_by(|a, b| a.ranking_cmp(b));
        let mut semantic: Vec<&SemanticHit> = semantic.iter().collect();
        semantic.sort_by(|a, b| a.ranking_cmp(b));

        let mut lexical_rank = 0;
        let mut lexical_firsts: Vec<&LexicalHit> = Vec::with_capacity(lexical.len());
        for hit in lexical {
            let acc = candidates.entry(hit.document_id.clone()).or_default();
            if acc.lexical_rank.is_some() {
                continue;
            }
            lexical_rank += 1;
            acc.lexical_rank = Some(lexical_rank);
            acc.components.raw_lexical = hit.score;
            lexical_firsts.push(hit);
        }

        let raw: Vec<f64> = lexical_firsts.iter().map(|hit| hit.score).collect();
        let normalized = self.normalizer.normalize(&raw);
        for (hit, value) in lexical_firsts.iter().zip(normalized) {
            if let Some(acc) = candidates.get_mut(&hit.document_id) {
                acc.components.normalized_lexical = value;
            }
        }

        let mut semantic_rank = 0;
        for hit in semantic {
            let acc = candidates.entry(hit.document_id.clone()).or_default();
            if acc.semantic_rank.is_some() {
                continue;
            }
            semantic_rank += 1;
            acc.semantic_rank = Some(semantic_rank);
            acc.components.raw_semantic = hit.score;
        }

        candidates
    }

    fn combine(fusion: &FusionConfig, acc: &Accumulator) -> f64 {
        match *fusion {
            FusionConfig::Weighted {
                vector_weight,
                lexical_weight,
            } => {
                vector_weight * acc.components.raw_semantic
                    + lexical_weight * acc.components.normalized_lexical
            }
            FusionConfig::ReciprocalRank { rank_constant } => {
                let contribution =
                    |rank: Option<usize>| rank.map_or(0.0, |r| 1.0 / (rank_constant + r as f64));
                contribution(acc.semantic_rank) + contribution(acc.lexical_rank)
            }
        }
    }
}
