use serde::{Deserialize, Serialize};

/// Tunable BM25 constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation
    #[serde(default = "default_k1")]
    pub k1: f64,

    /// Document-length normalization strength (0.0 - 1.0)
    #[serde(default = "default_b")]
    pub b: f64,

    /// Lower bound applied to every IDF value so that terms present in most
    /// documents keep a small positive weight
    #[serde(default = "default_idf_floor")]
    pub idf_floor: f64,
}

fn default_k1() -> f64 {
    1.5
}

fn default_b() -> f64 {
    0.75
}

fn default_idf_floor() -> f64 {
    0.01
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
            idf_floor: default_idf_floor(),
        }
    }
}

impl Bm25Params {
    /// Validate parameters
    pub fn validate(&self) -> Result<(), String> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(format!("k1 must be finite and >= 0, got {}", self.k1));
        }

        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(format!("b must be in [0.0, 1.0], got {}", self.b));
        }

        if !self.idf_floor.is_finite() || self.idf_floor <= 0.0 {
            return Err(format!(
                "idf_floor must be finite and > 0, got {}",
                self.idf_floor
            ));
        }

        Ok(())
    }

    /// Parameters for short, identifier-heavy documents (symbol names, signatures):
    /// weaker length normalization, earlier saturation.
    pub fn short_documents() -> Self {
        Self {
            k1: 1.2,
            b: 0.3,
            ..Default::default()
        }
    }
}
