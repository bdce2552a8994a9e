use tracing::{debug, info, warn};

use crate::error::InputError;

use super::resolve::EmbeddingResolver;
use super::scoring::ScoringEngine;
use super::types::{
    CandidateItem, CentroidSet, Embedding, EmbeddingOrigin, EmbeddingSource, RankedResult,
    ScoreOutcome, ScoredItem,
};
use super::vector::{decode_embedding, zero_vector};

const REQUIRED: &str = "likedClusters and posts are required.";

enum Slot {
    Ready(Embedding, EmbeddingOrigin),
    Pending,
}

/// Scores a candidate pool against a taste profile and returns the top N.
#[derive(Clone)]
pub struct RankingPipeline {
    resolver: EmbeddingResolver,
}

impl RankingPipeline {
    pub fn new(resolver: EmbeddingResolver) -> Self {
        Self { resolver }
    }

    /// Rank `items` by preference score, best first.
    ///
    /// Preconditions are checked before any embedding or scoring work. Every
    /// item is scored; items that fail scoring sort after all others in input
    /// order. Ties keep input order. At most `top_n` items are returned.
    pub async fn rank(
        &self,
        liked: &CentroidSet,
        disliked: &CentroidSet,
        items: &[CandidateItem],
        top_n: usize,
        dislike_weight: f64,
    ) -> Result<RankedResult, InputError> {
        let dims = validate(liked, disliked, items, top_n, dislike_weight)?;

        let slots: Vec<Slot> = items
            .iter()
            .enumerate()
            .map(|(index, item)| supplied_embedding(index, item))
            .collect();

        let pending: Vec<&str> = items
            .iter()
            .zip(slots.iter())
            .filter(|(_, slot)| matches!(slot, Slot::Pending))
            .map(|(item, _)| item.description.as_str())
            .collect();
        debug!(
            pool = items.len(),
            to_embed = pending.len(),
            "Resolving candidate embeddings"
        );
        let mut computed = self.resolver.embed_all(&pending).await.into_iter();

        let engine = ScoringEngine::new(liked, disliked, dislike_weight);
        let mut zero_fallbacks = 0;
        let mut degraded = 0;
        let mut scored: Vec<ScoredItem> = Vec::with_capacity(items.len());

        for (index, (item, slot)) in items.iter().zip(slots).enumerate() {
            let (vector, origin) = match slot {
                Slot::Ready(vector, origin) => (vector, origin),
                Slot::Pending => match computed.next() {
                    Some(Ok(vector)) => (vector, EmbeddingOrigin::Computed),
                    Some(Err(err)) => {
                        warn!(
                            provider = self.resolver.provider_name(),
                            item_index = index,
                            item_id = %item.id,
                            reason = %err,
                            "Embedding failed, scoring against zero vector"
                        );
                        zero_fallbacks += 1;
                        (zero_vector(dims), EmbeddingOrigin::ZeroFallback)
                    }
                    None => {
                        zero_fallbacks += 1;
                        (zero_vector(dims), EmbeddingOrigin::ZeroFallback)
                    }
                },
            };

            let outcome = engine.outcome(&vector);
            if let ScoreOutcome::Degraded(err) = &outcome {
                warn!(
                    item_index = index,
                    item_id = %item.id,
                    origin = %origin,
                    reason = %err,
                    "Scoring failed, item demoted"
                );
                degraded += 1;
            }

            scored.push(ScoredItem {
                id: item.id.clone(),
                description: item.description.clone(),
                outcome,
                origin,
                input_index: index,
            });
        }

        // Stable: equal scores keep input order
        scored.sort_by(|a, b| a.outcome.rank_order(&b.outcome));
        let pool_size = scored.len();
        scored.truncate(top_n);

        info!(
            pool = pool_size,
            returned = scored.len(),
            degraded,
            zero_fallbacks,
            "Ranked candidates"
        );

        Ok(RankedResult {
            items: scored,
            pool_size,
            degraded,
            zero_fallbacks,
        })
    }
}

/// Returns the shared centroid dimension.
fn validate(
    liked: &CentroidSet,
    disliked: &CentroidSet,
    items: &[CandidateItem],
    top_n: usize,
    dislike_weight: f64,
) -> Result<usize, InputError> {
    if items.is_empty() {
        return Err(InputError::MissingRequired(REQUIRED.into()));
    }
    let Some(dims) = liked.dimension() else {
        return Err(InputError::MissingRequired(REQUIRED.into()));
    };
    liked.validate("likedClusters")?;
    disliked.validate("dislikedClusters")?;
    if let Some(found) = disliked.dimension()
        && found != dims
    {
        return Err(InputError::CentroidDimension {
            set: "dislikedClusters",
            index: 0,
            expected: dims,
            found,
        });
    }
    if top_n == 0 {
        return Err(InputError::InvalidParameter {
            name: "topN",
            reason: "must be at least 1".into(),
        });
    }
    if !dislike_weight.is_finite() || dislike_weight < 0.0 {
        return Err(InputError::InvalidParameter {
            name: "dislikeWeight",
            reason: format!("must be a finite non-negative number, got {dislike_weight}"),
        });
    }
    Ok(dims)
}

fn supplied_embedding(index: usize, item: &CandidateItem) -> Slot {
    match &item.embedding {
        Some(EmbeddingSource::Vector(vector)) => {
            Slot::Ready(vector.clone(), EmbeddingOrigin::Supplied)
        }
        Some(EmbeddingSource::Encoded(encoded)) => match decode_embedding(encoded) {
            Ok(vector) => Slot::Ready(vector, EmbeddingOrigin::Decoded),
            Err(err) => {
                debug!(item_index = index, reason = %err, "Encoded embedding rejected, recomputing");
                Slot::Pending
            }
        },
        Some(EmbeddingSource::Unrecognized(_)) => {
            debug!(item_index = index, "Embedding is not a numeric array, recomputing");
            Slot::Pending
        }
        None => Slot::Pending,
    }
}
