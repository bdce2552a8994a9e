use crate::error::ScoringError;

use super::types::{CentroidSet, ScoreOutcome};
use super::vector::cosine_similarity;

/// `max cos(item, liked) - dislike_weight * max cos(item, disliked)`.
///
/// The disliked term is 0 when `disliked` is empty. A zero-norm item scores
/// 0 against every centroid. Failures are typed; callers decide how to demote.
pub fn score(
    item: &[f32],
    liked: &CentroidSet,
    disliked: &CentroidSet,
    dislike_weight: f64,
) -> Result<f64, ScoringError> {
    let Some(expected) = liked.dimension() else {
        return Err(ScoringError::NoLikedCentroids);
    };
    if item.len() != expected {
        return Err(ScoringError::DimensionMismatch {
            expected,
            found: item.len(),
        });
    }
    if let Some(found) = disliked.dimension()
        && found != expected
    {
        return Err(ScoringError::DimensionMismatch { expected, found });
    }
    if item.iter().any(|x| !x.is_finite()) {
        return Err(ScoringError::NonFinite);
    }

    let liked_score = max_similarity(item, liked).unwrap_or(0.0);
    let disliked_score = max_similarity(item, disliked).unwrap_or(0.0);
    let total = liked_score - dislike_weight * disliked_score;
    if total.is_finite() {
        Ok(total)
    } else {
        Err(ScoringError::NonFinite)
    }
}

fn max_similarity(item: &[f32], centroids: &CentroidSet) -> Option<f64> {
    centroids
        .iter()
        .map(|c| cosine_similarity(item, c))
        .reduce(f64::max)
}

/// Scores items against one fixed profile.
#[derive(Debug, Clone)]
pub struct ScoringEngine<'a> {
    liked: &'a CentroidSet,
    disliked: &'a CentroidSet,
    dislike_weight: f64,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(liked: &'a CentroidSet, disliked: &'a CentroidSet, dislike_weight: f64) -> Self {
        Self {
            liked,
            disliked,
            dislike_weight,
        }
    }

    pub fn score(&self, item: &[f32]) -> Result<f64, ScoringError> {
        score(item, self.liked, self.disliked, self.dislike_weight)
    }

    /// Same as [`Self::score`], folded into a per-item outcome.
    pub fn outcome(&self, item: &[f32]) -> ScoreOutcome {
        match self.score(item) {
            Ok(value) => ScoreOutcome::Scored(value),
            Err(err) => ScoreOutcome::Degraded(err),
        }
    }
}
