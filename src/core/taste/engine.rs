use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{Config, RankingConfig};
use crate::embeddings::{EmbeddingProvider, create_embedding_provider};
use crate::error::{ConfigError, InputError, PalateError};

use super::cluster::ClusterEngine;
use super::pipeline::RankingPipeline;
use super::resolve::EmbeddingResolver;
use super::types::{CandidateItem, CentroidSet, RankedResult, TasteProfile};

/// Clustering and ranking behind one shared embedding provider.
pub trait TasteEngine: Send + Sync {
    /// Summarize liked and disliked descriptions into centroid sets.
    fn build_profile<'a>(
        &'a self,
        liked: &'a [String],
        disliked: &'a [String],
        num_clusters: Option<usize>,
    ) -> Pin<Box<dyn Future<Output = Result<TasteProfile, PalateError>> + Send + 'a>>;

    /// Rank candidates against a profile. `None` knobs use configured defaults.
    fn rank<'a>(
        &'a self,
        liked: &'a CentroidSet,
        disliked: &'a CentroidSet,
        items: &'a [CandidateItem],
        top_n: Option<usize>,
        dislike_weight: Option<f64>,
    ) -> Pin<Box<dyn Future<Output = Result<RankedResult, PalateError>> + Send + 'a>>;

    fn provider_name(&self) -> &str;

    fn dimensions(&self) -> usize;
}

pub struct DefaultTasteEngine {
    pub ranking: RankingConfig,
    provider: Arc<dyn EmbeddingProvider>,
    clusterer: ClusterEngine,
    ranker: RankingPipeline,
}

impl DefaultTasteEngine {
    /// The provider is constructed once by the caller and shared by both stages.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &Config) -> Self {
        let resolver = EmbeddingResolver::from_config(Arc::clone(&provider), &config.embedding);
        Self {
            ranking: config.ranking.clone(),
            provider,
            clusterer: ClusterEngine::new(resolver.clone(), config.clustering.clone()),
            ranker: RankingPipeline::new(resolver),
        }
    }
}

impl TasteEngine for DefaultTasteEngine {
    fn build_profile<'a>(
        &'a self,
        liked: &'a [String],
        disliked: &'a [String],
        num_clusters: Option<usize>,
    ) -> Pin<Box<dyn Future<Output = Result<TasteProfile, PalateError>> + Send + 'a>> {
        Box::pin(async move {
            if num_clusters == Some(0) {
                return Err(InputError::InvalidParameter {
                    name: "numClusters",
                    reason: "must be at least 1".into(),
                }
                .into());
            }
            Ok(self
                .clusterer
                .build_profile(liked, disliked, num_clusters)
                .await?)
        })
    }

    fn rank<'a>(
        &'a self,
        liked: &'a CentroidSet,
        disliked: &'a CentroidSet,
        items: &'a [CandidateItem],
        top_n: Option<usize>,
        dislike_weight: Option<f64>,
    ) -> Pin<Box<dyn Future<Output = Result<RankedResult, PalateError>> + Send + 'a>> {
        Box::pin(async move {
            let top_n = top_n.unwrap_or(self.ranking.top_n);
            let dislike_weight = dislike_weight.unwrap_or(self.ranking.dislike_weight);
            Ok(self
                .ranker
                .rank(liked, disliked, items, top_n, dislike_weight)
                .await?)
        })
    }

    fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }
}

/// Creates a taste engine, and its single embedding provider, from configuration.
pub fn create_taste_engine(config: &Config) -> Result<Arc<dyn TasteEngine>, ConfigError> {
    let provider: Arc<dyn EmbeddingProvider> =
        Arc::from(create_embedding_provider(&config.embedding)?);
    Ok(Arc::new(DefaultTasteEngine::new(provider, config)))
}
