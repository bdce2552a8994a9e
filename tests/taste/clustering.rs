use std::sync::Arc;
use std::time::Duration;

use palate::config::ClusteringConfig;
use palate::core::taste::{ClusterEngine, EmbeddingResolver};
use palate::error::ClusteringError;

use crate::fake_providers::{LookupProvider, StalledProvider};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn two_groups() -> LookupProvider {
    LookupProvider::new(
        2,
        &[
            ("wool scarf", vec![1.0, 0.0]),
            ("cashmere hat", vec![0.9, 0.1]),
            ("knit gloves", vec![1.0, 0.1]),
            ("surfboard", vec![0.0, 1.0]),
            ("wetsuit", vec![0.1, 0.9]),
        ],
    )
}

#[tokio::test]
async fn centroids_land_on_group_means() {
    let provider = Arc::new(two_groups());
    let engine = ClusterEngine::new(
        EmbeddingResolver::new(provider.clone()),
        ClusteringConfig::default(),
    );
    let liked = strings(&["wool scarf", "surfboard", "cashmere hat", "wetsuit", "knit gloves"]);

    let set = engine.cluster(&liked, Some(2)).await.unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(provider.calls(), 1);

    let mut centroids = set.into_inner();
    centroids.sort_by(|a, b| b[0].total_cmp(&a[0]));
    let winter = &centroids[0];
    let summer = &centroids[1];
    assert!((winter[0] - (2.9 / 3.0)).abs() < 1e-5);
    assert!((winter[1] - (0.2 / 3.0)).abs() < 1e-5);
    assert!((summer[0] - 0.05).abs() < 1e-5);
    assert!((summer[1] - 0.95).abs() < 1e-5);
}

#[tokio::test]
async fn unencodable_description_becomes_zero_vector() {
    let provider = Arc::new(two_groups());
    let engine = ClusterEngine::new(
        EmbeddingResolver::new(provider.clone()),
        ClusteringConfig::default(),
    );
    let liked = strings(&["wool scarf", "a description nobody knows", "surfboard"]);

    let set = engine.cluster(&liked, None).await.unwrap();
    assert_eq!(set.len(), 3);
    assert!(
        set.iter().any(|c| c.iter().all(|x| *x == 0.0)),
        "expected one all-zero centroid, got {set:?}"
    );
    // batch call, then one call per description
    assert_eq!(provider.calls(), 4);
}

#[tokio::test]
async fn provider_timeout_is_survivable() {
    let resolver = EmbeddingResolver::new(Arc::new(StalledProvider { dims: 4 }))
        .with_timeout(Duration::from_millis(50));
    let engine = ClusterEngine::new(resolver, ClusteringConfig::default());

    let set = engine
        .cluster(&strings(&["a", "b"]), None)
        .await
        .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.dimension(), Some(4));
}

#[tokio::test]
async fn seed_is_configurable_and_respected() {
    let provider = Arc::new(two_groups());
    let liked = strings(&["wool scarf", "surfboard", "cashmere hat", "wetsuit", "knit gloves"]);
    let config = ClusteringConfig {
        seed: 7,
        ..ClusteringConfig::default()
    };
    let a = ClusterEngine::new(EmbeddingResolver::new(provider.clone()), config.clone())
        .cluster(&liked, Some(2))
        .await
        .unwrap();
    let b = ClusterEngine::new(EmbeddingResolver::new(provider), config)
        .cluster(&liked, Some(2))
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn too_many_clusters_is_a_clustering_error() {
    let engine = ClusterEngine::new(
        EmbeddingResolver::new(Arc::new(two_groups())),
        ClusteringConfig::default(),
    );
    let err = engine
        .cluster(&strings(&["wool scarf", "surfboard"]), Some(5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClusteringError::InvalidClusterCount { k: 5, samples: 2 }
    ));
}
