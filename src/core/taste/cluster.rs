use tracing::{debug, info, warn};

use crate::config::ClusteringConfig;
use crate::error::ClusteringError;

use super::kmeans::KMeans;
use super::resolve::EmbeddingResolver;
use super::types::{CentroidSet, Embedding, TasteProfile};
use super::vector::zero_vector;

/// Summarizes a user's liked and disliked descriptions into centroid sets.
#[derive(Clone)]
pub struct ClusterEngine {
    resolver: EmbeddingResolver,
    config: ClusteringConfig,
}

impl ClusterEngine {
    pub fn new(resolver: EmbeddingResolver, config: ClusteringConfig) -> Self {
        Self { resolver, config }
    }

    /// Default cluster count for `n` descriptions: `min(max_clusters, n)`.
    pub fn default_cluster_count(&self, n: usize) -> usize {
        self.config.max_clusters.min(n)
    }

    /// Embed `descriptions` and partition them into `k` centroids.
    ///
    /// An empty input yields an empty set without touching the provider. `k`
    /// defaults to [`Self::default_cluster_count`]. A description the provider
    /// cannot encode is replaced by a zero vector of the provider's dimension.
    pub async fn cluster(
        &self,
        descriptions: &[String],
        k: Option<usize>,
    ) -> Result<CentroidSet, ClusteringError> {
        if descriptions.is_empty() {
            return Ok(CentroidSet::empty());
        }

        let n = descriptions.len();
        let k = k.unwrap_or_else(|| self.default_cluster_count(n));
        if k == 0 || k > n {
            return Err(ClusteringError::InvalidClusterCount { k, samples: n });
        }

        let texts: Vec<&str> = descriptions.iter().map(String::as_str).collect();
        let vectors = self.embed_or_zero(&texts).await;

        let kmeans = KMeans::from_config(k, &self.config);
        let fit = tokio::task::spawn_blocking(move || kmeans.fit(&vectors))
            .await
            .map_err(|e| ClusteringError::Task(e.to_string()))??;
        debug!(
            samples = n,
            clusters = k,
            iterations = fit.iterations,
            inertia = fit.inertia,
            "Clustered descriptions"
        );
        Ok(CentroidSet::from_fitted(fit.centroids))
    }

    /// Both polarities, each clustered independently with the same policy.
    pub async fn build_profile(
        &self,
        liked: &[String],
        disliked: &[String],
        k: Option<usize>,
    ) -> Result<TasteProfile, ClusteringError> {
        let liked = self.cluster(liked, k.map(|k| k.min(liked.len()))).await?;
        let disliked = self
            .cluster(disliked, k.map(|k| k.min(disliked.len())))
            .await?;
        info!(
            provider = self.resolver.provider_name(),
            liked_clusters = liked.len(),
            disliked_clusters = disliked.len(),
            "Built taste profile"
        );
        Ok(TasteProfile { liked, disliked })
    }

    async fn embed_or_zero(&self, texts: &[&str]) -> Vec<Embedding> {
        let dims = self.resolver.dimensions();
        self.resolver
            .embed_all(texts)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.unwrap_or_else(|err| {
                    warn!(
                        provider = self.resolver.provider_name(),
                        item_index = index,
                        reason = %err,
                        "Embedding failed, substituting zero vector"
                    );
                    zero_vector(dims)
                })
            })
            .collect()
    }
}
