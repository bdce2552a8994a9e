use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{InputError, ScoringError};

/// A fixed-length embedding. Every vector compared or clustered together
/// must share the same length.
pub type Embedding = Vec<f32>;

/// Caller-supplied opaque identifier (string, number, or any JSON value).
pub type ItemId = serde_json::Value;

// CentroidSet: representative vectors for one polarity (liked or disliked)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CentroidSet(Vec<Embedding>);

impl CentroidSet {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a set from caller-supplied vectors, enforcing a rectangular shape.
    pub fn from_vectors(set: &'static str, vectors: Vec<Embedding>) -> Result<Self, InputError> {
        let centroids = Self(vectors);
        centroids.validate(set)?;
        Ok(centroids)
    }

    /// Vectors produced by the clustering engine are rectangular by construction.
    pub(crate) fn from_fitted(vectors: Vec<Embedding>) -> Self {
        Self(vectors)
    }

    /// Every centroid non-empty, finite, and of the same dimension.
    pub fn validate(&self, set: &'static str) -> Result<(), InputError> {
        let Some(expected) = self.dimension() else {
            return Ok(());
        };
        for (index, centroid) in self.0.iter().enumerate() {
            if centroid.is_empty() {
                return Err(InputError::EmptyCentroid { set, index });
            }
            if centroid.len() != expected {
                return Err(InputError::CentroidDimension {
                    set,
                    index,
                    expected,
                    found: centroid.len(),
                });
            }
            if centroid.iter().any(|x| !x.is_finite()) {
                return Err(InputError::NonFiniteCentroid { set, index });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dimension of the first centroid; `None` for an empty set.
    pub fn dimension(&self) -> Option<usize> {
        self.0.first().map(Vec::len)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Embedding> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Embedding] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Embedding> {
        self.0
    }
}

// TasteProfile: both centroid sets for one user, computed once per request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    #[serde(rename = "likedClusters")]
    pub liked: CentroidSet,
    #[serde(rename = "dislikedClusters")]
    pub disliked: CentroidSet,
}

// EmbeddingSource: how a candidate carries its embedding, if at all
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingSource {
    /// A numeric array, used as-is.
    Vector(Embedding),
    /// A textual encoding of a numeric array, decoded strictly.
    Encoded(String),
    /// Anything else; treated like an undecodable encoding.
    Unrecognized(serde_json::Value),
}

// CandidateItem: one entry of the pool to rank
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCandidate")]
pub struct CandidateItem {
    pub id: ItemId,
    pub description: String,
    pub embedding: Option<EmbeddingSource>,
}

#[derive(Deserialize)]
struct RawCandidate {
    #[serde(default, rename = "_id")]
    object_id: Option<serde_json::Value>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<serde_json::Value>,
    #[serde(default)]
    embedding: Option<EmbeddingSource>,
}

impl From<RawCandidate> for CandidateItem {
    fn from(raw: RawCandidate) -> Self {
        let description = match raw.description {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        Self {
            id: raw.object_id.or(raw.id).unwrap_or(serde_json::Value::Null),
            description,
            embedding: raw.embedding,
        }
    }
}

impl CandidateItem {
    pub fn new(id: impl Into<ItemId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(EmbeddingSource::Vector(embedding));
        self
    }

    pub fn with_encoded_embedding(mut self, encoded: impl Into<String>) -> Self {
        self.embedding = Some(EmbeddingSource::Encoded(encoded.into()));
        self
    }
}

// EmbeddingOrigin: where the vector that was scored came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EmbeddingOrigin {
    Supplied,
    Decoded,
    Computed,
    ZeroFallback,
}

// ScoreOutcome: typed per-item scoring result
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(f64),
    Degraded(ScoringError),
}

impl ScoreOutcome {
    /// Reported score of a degraded item: below every attainable real score.
    pub const SENTINEL: f64 = f64::MIN;

    pub fn final_score(&self) -> f64 {
        match self {
            Self::Scored(score) => *score,
            Self::Degraded(_) => Self::SENTINEL,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Descending by score; every degraded outcome after every scored one.
    /// Degraded outcomes compare equal so a stable sort keeps their input order.
    pub(crate) fn rank_order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Scored(a), Self::Scored(b)) => b.total_cmp(a),
            (Self::Scored(_), Self::Degraded(_)) => Ordering::Less,
            (Self::Degraded(_), Self::Scored(_)) => Ordering::Greater,
            (Self::Degraded(_), Self::Degraded(_)) => Ordering::Equal,
        }
    }
}

// ScoredItem: a candidate after embedding resolution and scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub id: ItemId,
    pub description: String,
    pub outcome: ScoreOutcome,
    pub origin: EmbeddingOrigin,
    /// Position in the request's candidate list
    pub input_index: usize,
}

impl ScoredItem {
    pub fn final_score(&self) -> f64 {
        self.outcome.final_score()
    }

    pub fn to_ranked(&self) -> RankedItem {
        RankedItem {
            id: self.id.clone(),
            description: self.description.clone(),
            final_score: self.final_score(),
        }
    }
}

// RankedItem: wire shape of one recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: ItemId,
    pub description: String,
    pub final_score: f64,
}

// RankedResult: ordered, truncated output plus pool accounting
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub items: Vec<ScoredItem>,
    /// Candidates scored before truncation; always equals the input count.
    pub pool_size: usize,
    /// Candidates demoted by a scoring failure (whole pool, not just `items`).
    pub degraded: usize,
    /// Candidates scored against a zero vector after an embedding failure.
    pub zero_fallbacks: usize,
}

impl RankedResult {
    pub fn ranked_items(&self) -> Vec<RankedItem> {
        self.items.iter().map(ScoredItem::to_ranked).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
