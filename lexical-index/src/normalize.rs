//! Mapping raw BM25 scores into [0, 1].
//!
//! Every strategy keeps outputs in `[0, 1]` and preserves input order
//! (`a <= b` implies `f(a) <= f(b)`). Negative and non-finite scores are
//! treated as `0.0`. An all-zero vector is returned unchanged.

use crate::error::{LexicalError, Result};
use serde::{Deserialize, Serialize};

/// Normalization strategy for one scoring pass
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum NormalizationStrategy {
    /// Absolute quality bands; a weak candidate set stays weak
    #[default]
    QualityBanded,
    /// Logistic curve centred on `midpoint`
    Sigmoid { midpoint: f64, steepness: f64 },
    /// Clip to the `lower`/`upper` percentiles of the pass, then min-max scale
    Percentile { lower: f64, upper: f64 },
    /// `ln(1 + s) / ln(1 + max)`
    LogScale,
}

impl NormalizationStrategy {
    pub fn sigmoid() -> Self {
        Self::Sigmoid {
            midpoint: 5.0,
            steepness: 0.5,
        }
    }

    pub fn percentile() -> Self {
        Self::Percentile {
            lower: 5.0,
            upper: 95.0,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            Self::QualityBanded | Self::LogScale => Ok(()),
            Self::Sigmoid {
                midpoint,
                steepness,
            } => {
                if !midpoint.is_finite() {
                    return Err(format!("sigmoid midpoint must be finite, got {midpoint}"));
                }
                if !steepness.is_finite() || steepness <= 0.0 {
                    return Err(format!("sigmoid steepness must be > 0, got {steepness}"));
                }
                Ok(())
            }
            Self::Percentile { lower, upper } => {
                if !(0.0..=100.0).contains(&lower) || !(0.0..=100.0).contains(&upper) {
                    return Err(format!(
                        "percentiles must be in [0, 100], got {lower} and {upper}"
                    ));
                }
                if lower >= upper {
                    return Err(format!(
                        "lower percentile ({lower}) must be below upper ({upper})"
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Discrete quality band of a raw BM25 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    Negligible,
    Poor,
    Fair,
    Good,
    Excellent,
}

/// `(band, raw lower bound, output range)`, ascending
const BANDS: [(QualityBand, f64, (f64, f64)); 5] = [
    (QualityBand::Negligible, 0.0, (0.0, 0.1)),
    (QualityBand::Poor, 1.0, (0.1, 0.4)),
    (QualityBand::Fair, 5.0, (0.4, 0.7)),
    (QualityBand::Good, 10.0, (0.7, 0.9)),
    (QualityBand::Excellent, 15.0, (0.9, 1.0)),
];

/// Raw distance over which the open-ended excellent band approaches 1.0
const EXCELLENT_SCALE: f64 = 15.0;

impl QualityBand {
    pub fn classify(raw: f64) -> Self {
        let raw = sanitize(raw);
        BANDS
            .iter()
            .rev()
            .find(|(_, lower, _)| raw >= *lower)
            .map_or(QualityBand::Negligible, |(band, _, _)| *band)
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityBand::Negligible => "negligible",
            QualityBand::Poor => "poor",
            QualityBand::Fair => "fair",
            QualityBand::Good => "good",
            QualityBand::Excellent => "excellent",
        }
    }
}

/// A validated strategy, applied without further checks
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreNormalizer {
    strategy: NormalizationStrategy,
}

impl ScoreNormalizer {
    pub fn new(strategy: NormalizationStrategy) -> Result<Self> {
        strategy.validate().map_err(LexicalError::InvalidStrategy)?;
        Ok(Self { strategy })
    }

    pub fn strategy(&self) -> NormalizationStrategy {
        self.strategy
    }

    pub fn normalize(&self, scores: &[f64]) -> Vec<f64> {
        apply(self.strategy, scores)
    }
}

/// Normalize one pass of raw scores; an invalid strategy is rejected
pub fn normalize(strategy: NormalizationStrategy, scores: &[f64]) -> Result<Vec<f64>> {
    Ok(ScoreNormalizer::new(strategy)?.normalize(scores))
}

fn apply(strategy: NormalizationStrategy, scores: &[f64]) -> Vec<f64> {
    if scores.iter().all(|&s| s == 0.0) {
        return scores.to_vec();
    }

    let sanitized: Vec<f64> = scores.iter().copied().map(sanitize).collect();

    match strategy {
        NormalizationStrategy::QualityBanded => sanitized.into_iter().map(quality_banded).collect(),
        NormalizationStrategy::Sigmoid {
            midpoint,
            steepness,
        } => sanitized
            .into_iter()
            .map(|s| 1.0 / (1.0 + (-steepness * (s - midpoint)).exp()))
            .collect(),
        NormalizationStrategy::Percentile { lower, upper } => {
            percentile_clip(&sanitized, lower, upper)
        }
        NormalizationStrategy::LogScale => {
            let max = sanitized.iter().copied().fold(0.0, f64::max);
            if max <= 0.0 {
                return vec![0.0; sanitized.len()];
            }
            let denom = max.ln_1p();
            sanitized.into_iter().map(|s| s.ln_1p() / denom).collect()
        }
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

fn quality_banded(raw: f64) -> f64 {
    let band = QualityBand::classify(raw);
    let position = BANDS
        .iter()
        .position(|(b, _, _)| *b == band)
        .unwrap_or(0);
    let (_, lower, (out_min, out_max)) = BANDS[position];

    let fraction = match BANDS.get(position + 1) {
        Some((_, upper, _)) => (raw - lower) / (upper - lower),
        None => 1.0 - (-(raw - lower) / EXCELLENT_SCALE).exp(),
    };

    (out_min + fraction * (out_max - out_min)).clamp(0.0, 1.0)
}

fn percentile_clip(scores: &[f64], lower: f64, upper: f64) -> Vec<f64> {
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let lo = percentile(&sorted, lower);
    let hi = percentile(&sorted, upper);

    scores
        .iter()
        .map(|&s| {
            if hi > lo {
                (s.clamp(lo, hi) - lo) / (hi - lo)
            } else if s >= hi {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Linear-interpolated percentile of an ascending slice
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let last = n - 1;
            let rank = (pct / 100.0 * last as f64).clamp(0.0, last as f64);
            let below = (rank.floor() as usize).min(last);
            let above = (rank.ceil() as usize).min(last);
            let weight = rank - below as f64;
            sorted[below] + (sorted[above] - sorted[below]) * weight
        }
    }
}
