//! Request and response schemas for the cluster and rank contracts.
//!
//! Both the stdio commands and the HTTP gateway go through [`respond`], so the
//! two surfaces share one schema and one error discipline.

use serde::{Deserialize, Deserializer};
use strum::Display;

use crate::core::taste::{CandidateItem, CentroidSet, Embedding, TasteEngine};
use crate::error::{InputError, OutputError, PalateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Contract {
    Cluster,
    Rank,
}

/// `{ likedDescriptions, dislikedDescriptions, numClusters? }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClusterRequest {
    #[serde(
        default,
        rename = "likedDescriptions",
        alias = "liked",
        deserialize_with = "null_as_default"
    )]
    pub liked: Vec<String>,
    #[serde(
        default,
        rename = "dislikedDescriptions",
        alias = "disliked",
        deserialize_with = "null_as_default"
    )]
    pub disliked: Vec<String>,
    #[serde(default, rename = "numClusters")]
    pub num_clusters: Option<usize>,
}

/// `{ likedClusters, dislikedClusters, posts, topN?, dislikeWeight? }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RankRequest {
    #[serde(default, rename = "likedClusters", deserialize_with = "null_as_default")]
    pub liked: Vec<Embedding>,
    #[serde(
        default,
        rename = "dislikedClusters",
        deserialize_with = "null_as_default"
    )]
    pub disliked: Vec<Embedding>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<CandidateItem>,
    #[serde(default, rename = "topN")]
    pub top_n: Option<usize>,
    #[serde(default, rename = "dislikeWeight")]
    pub dislike_weight: Option<f64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse one request body. Blank input and malformed JSON are input errors.
pub fn parse_request<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, InputError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(InputError::Empty);
    }
    serde_json::from_slice(body).map_err(|e| InputError::Json(e.to_string()))
}

/// Run one request against `engine` and serialize the success payload.
pub async fn respond(
    engine: &dyn TasteEngine,
    contract: Contract,
    body: &[u8],
) -> Result<Vec<u8>, PalateError> {
    match contract {
        Contract::Cluster => {
            let request: ClusterRequest = parse_request(body)?;
            let profile = engine
                .build_profile(&request.liked, &request.disliked, request.num_clusters)
                .await?;
            Ok(serde_json::to_vec(&profile).map_err(OutputError::from)?)
        }
        Contract::Rank => {
            let request: RankRequest = parse_request(body)?;
            let liked = CentroidSet::from_vectors("likedClusters", request.liked)?;
            let disliked = CentroidSet::from_vectors("dislikedClusters", request.disliked)?;
            let ranked = engine
                .rank(
                    &liked,
                    &disliked,
                    &request.posts,
                    request.top_n,
                    request.dislike_weight,
                )
                .await?;
            Ok(serde_json::to_vec(&ranked.ranked_items()).map_err(OutputError::from)?)
        }
    }
}
