use codesearch_lexical_index::NormalizationStrategy;
use codesearch_utils_tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default RRF constant (higher = less emphasis on top results)
pub const DEFAULT_RANK_CONSTANT: f64 = 60.0;

/// Policy for combining semantic and lexical scores. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FusionConfig {
    /// `vector_weight * semantic + lexical_weight * normalized_lexical`
    Weighted {
        vector_weight: f64,
        lexical_weight: f64,
    },
    /// `Σ 1 / (rank_constant + rank)` over the semantic and lexical rankings
    ReciprocalRank { rank_constant: f64 },
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::Weighted {
            vector_weight: 0.7,
            lexical_weight: 0.3,
        }
    }
}

impl FusionConfig {
    pub fn weighted(vector_weight: f64, lexical_weight: f64) -> Self {
        Self::Weighted {
            vector_weight,
            lexical_weight,
        }
    }

    pub fn rank_fusion(rank_constant: f64) -> Self {
        Self::ReciprocalRank { rank_constant }
    }

    pub fn is_rank_fusion(&self) -> bool {
        matches!(self, Self::ReciprocalRank { .. })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Weighted {
                vector_weight,
                lexical_weight,
            } => {
                if !vector_weight.is_finite() || vector_weight < 0.0 {
                    return Err(format!("vector_weight must be >= 0, got {vector_weight}"));
                }
                if !lexical_weight.is_finite() || lexical_weight < 0.0 {
                    return Err(format!("lexical_weight must be >= 0, got {lexical_weight}"));
                }
                Ok(())
            }
            Self::ReciprocalRank { rank_constant } => {
                if !rank_constant.is_finite() || rank_constant <= 0.0 {
                    return Err(format!("rank_constant must be > 0, got {rank_constant}"));
                }
                Ok(())
            }
        }
    }

    /// Bit-exact identity, usable as a hash key
    pub(crate) fn cache_key(&self) -> (u8, u64, u64) {
        match *self {
            Self::Weighted {
                vector_weight,
                lexical_weight,
            } => (0, vector_weight.to_bits(), lexical_weight.to_bits()),
            Self::ReciprocalRank { rank_constant } => (1, rank_constant.to_bits(), 0),
        }
    }
}

impl fmt::Display for FusionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weighted {
                vector_weight,
                lexical_weight,
            } => write!(f, "weighted(vector={vector_weight:.3}, lexical={lexical_weight:.3})"),
            Self::ReciprocalRank { rank_constant } => write!(f, "rrf(k={rank_constant})"),
        }
    }
}

/// Configuration for hybrid retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Fusion policy for combining results
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Normalization applied to raw lexical scores before weighted fusion
    #[serde(default)]
    pub normalization: NormalizationStrategy,

    /// Tokenizer used for queries
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Number of candidates to retrieve from each path before fusion
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,

    /// Final number of results to return after fusion
    #[serde(default = "default_final_result_count")]
    pub final_result_count: usize,

    /// Minimum query length in characters
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,

    /// Enable caching of search results
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Cache size (number of queries to cache)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_candidate_pool_size() -> usize {
    50
}

fn default_final_result_count() -> usize {
    10
}

fn default_min_query_length() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_cache_size() -> usize {
    100
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            normalization: NormalizationStrategy::default(),
            tokenizer: TokenizerConfig::default(),
            candidate_pool_size: default_candidate_pool_size(),
            final_result_count: default_final_result_count(),
            min_query_length: default_min_query_length(),
            enable_cache: true,
            cache_size: default_cache_size(),
        }
    }
}

impl RetrievalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.fusion.validate()?;
        self.normalization.validate()?;

        if self.candidate_pool_size == 0 {
            return Err("candidate_pool_size must be > 0".to_string());
        }

        if self.final_result_count == 0 {
            return Err("final_result_count must be > 0".to_string());
        }

        if self.final_result_count > self.candidate_pool_size {
            return Err(format!(
                "final_result_count ({}) cannot exceed candidate_pool_size ({})",
                self.final_result_count, self.candidate_pool_size
            ));
        }

        if self.enable_cache && self.cache_size == 0 {
            return Err("cache_size must be > 0 when caching is enabled".to_string());
        }

        Ok(())
    }

    /// Favour exact identifier matches
    pub fn lexical_heavy() -> Self {
        Self {
            fusion: FusionConfig::weighted(0.3, 0.7),
            ..Default::default()
        }
    }

    /// Favour conceptual similarity
    pub fn semantic_heavy() -> Self {
        Self {
            fusion: FusionConfig::weighted(0.8, 0.2),
            ..Default::default()
        }
    }

    /// Rank-based fusion, robust to incomparable score scales
    pub fn rank_fusion() -> Self {
        Self {
            fusion: FusionConfig::rank_fusion(DEFAULT_RANK_CONSTANT),
            candidate_pool_size: 100,
            ..Default::default()
        }
    }
}
