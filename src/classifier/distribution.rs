use serde::Serialize;

use super::ClassifierError;

/// Allowed deviation of a distribution's sum from 1.
pub const SUM_TOLERANCE: f32 = 1e-3;

/// Non-negative class probabilities summing to 1, aligned to the label set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityDistribution {
    probs: Vec<f32>,
}

impl ProbabilityDistribution {
    /// Accept a raw model output of `expected` scores.
    ///
    /// Proper distributions pass through untouched; anything else (logits,
    /// unnormalised scores) goes through a softmax.
    pub fn from_scores(scores: Vec<f32>, expected: usize) -> Result<Self, ClassifierError> {
        if scores.len() != expected {
            return Err(ClassifierError::OutputShape {
                expected,
                found: scores.len(),
            });
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ClassifierError::Inference("model produced a non-finite score".into()));
        }
        if is_distribution(&scores) {
            return Ok(Self { probs: scores });
        }
        Ok(Self { probs: softmax(&scores) })
    }

    /// Normalise strictly positive weights. Used by the synthetic backing.
    pub(crate) fn from_weights(weights: Vec<f32>) -> Self {
        let total: f32 = weights.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            let n = weights.len().max(1);
            return Self { probs: vec![1.0 / n as f32; n] };
        }
        Self {
            probs: weights.into_iter().map(|w| w / total).collect(),
        }
    }

    /// Index and probability of the most likely class. Ties go to the lowest index.
    pub fn argmax(&self) -> (usize, f32) {
        self.probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best })
    }

    pub fn values(&self) -> &[f32] {
        &self.probs
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn sum(&self) -> f32 {
        self.probs.iter().sum()
    }
}

fn is_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|s| *s >= 0.0) && (sum - 1.0).abs() <= SUM_TOLERANCE
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
