use std::sync::Arc;

use palate::config::ClusteringConfig;
use palate::core::taste::{
    CandidateItem, CentroidSet, ClusterEngine, EmbeddingResolver, RankingPipeline, score,
};
use palate::embeddings::DeterministicEmbedding;
use serde_json::json;

use crate::fake_providers::BrokenProvider;

fn cluster_engine() -> ClusterEngine {
    ClusterEngine::new(
        EmbeddingResolver::new(Arc::new(DeterministicEmbedding::new(24))),
        ClusteringConfig::default(),
    )
}

fn descriptions(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("item number {i}")).collect()
}

fn centroids(vectors: Vec<Vec<f32>>) -> CentroidSet {
    CentroidSet::from_vectors("likedClusters", vectors).unwrap()
}

#[tokio::test]
async fn empty_descriptions_give_empty_set() {
    let set = cluster_engine().cluster(&[], None).await.unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn default_cluster_count_is_min_three_n() {
    let engine = cluster_engine();
    for n in 1..=7 {
        let set = engine.cluster(&descriptions(n), None).await.unwrap();
        assert_eq!(set.len(), n.min(3), "n = {n}");
    }
}

#[tokio::test]
async fn clustering_repeats_exactly() {
    let engine = cluster_engine();
    let input = descriptions(9);
    let a = engine.cluster(&input, None).await.unwrap();
    let b = engine.cluster(&input, None).await.unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        for (p, q) in x.iter().zip(y.iter()) {
            assert!((p - q).abs() < 1e-6);
        }
    }
}

#[test]
fn item_equal_to_liked_centroid_scores_one() {
    let v = vec![0.2, -0.4, 0.9];
    let liked = centroids(vec![v.clone(), vec![1.0, 0.0, 0.0]]);
    let s = score(&v, &liked, &CentroidSet::empty(), 1.0).unwrap();
    assert!((s - 1.0).abs() < 1e-6);
}

#[test]
fn zero_weight_ignores_disliked_contents() {
    let liked = centroids(vec![vec![1.0, 0.5]]);
    let item = [0.3, 0.9];
    let base = score(&item, &liked, &CentroidSet::empty(), 0.0).unwrap();
    for disliked in [
        vec![vec![0.3, 0.9]],
        vec![vec![-1.0, 0.0], vec![0.0, -1.0]],
    ] {
        let disliked = CentroidSet::from_vectors("dislikedClusters", disliked).unwrap();
        let s = score(&item, &liked, &disliked, 0.0).unwrap();
        assert!((s - base).abs() < 1e-12);
    }
}

#[test]
fn zero_norm_item_is_zero_not_nan() {
    let liked = centroids(vec![vec![1.0, 0.0]]);
    let disliked = CentroidSet::from_vectors("dislikedClusters", vec![vec![0.0, 1.0]]).unwrap();
    let s = score(&[0.0, 0.0], &liked, &disliked, 2.0).unwrap();
    assert!(!s.is_nan());
    assert_eq!(s, 0.0);
}

#[tokio::test]
async fn ties_break_by_input_order() {
    let pipeline = RankingPipeline::new(EmbeddingResolver::new(Arc::new(BrokenProvider {
        dims: 2,
    })));
    let liked = centroids(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    let items = vec![
        CandidateItem::new("A", "a").with_embedding(vec![1.0, 0.0]),
        CandidateItem::new("B", "b").with_embedding(vec![0.0, 1.0]),
        CandidateItem::new("C", "c").with_embedding(vec![-1.0, 0.0]),
    ];
    for _ in 0..3 {
        let ranked = pipeline
            .rank(&liked, &CentroidSet::empty(), &items, 3, 1.0)
            .await
            .unwrap()
            .ranked_items();
        let ids: Vec<_> = ranked.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![json!("A"), json!("B"), json!("C")]);
        assert!((ranked[0].final_score - 1.0).abs() < 1e-9);
        assert!((ranked[1].final_score - 1.0).abs() < 1e-9);
        assert!((ranked[2].final_score + 1.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn unembeddable_item_is_never_dropped() {
    let pipeline = RankingPipeline::new(EmbeddingResolver::new(Arc::new(BrokenProvider {
        dims: 2,
    })));
    let liked = centroids(vec![vec![1.0, 0.0]]);
    let mut items: Vec<CandidateItem> = (0..4)
        .map(|i| CandidateItem::new(i, format!("ok {i}")).with_embedding(vec![1.0, 0.1]))
        .collect();
    items.insert(2, CandidateItem::new("lost", "no embedding, no provider"));

    let result = pipeline
        .rank(&liked, &CentroidSet::empty(), &items, 30, 1.0)
        .await
        .unwrap();
    assert_eq!(result.len(), 5);
    assert_eq!(result.pool_size, 5);
    assert_eq!(result.zero_fallbacks, 1);
    assert_eq!(result.items.last().unwrap().id, json!("lost"));
}

#[tokio::test]
async fn truncation_keeps_the_global_best() {
    let pipeline = RankingPipeline::new(EmbeddingResolver::new(Arc::new(BrokenProvider {
        dims: 2,
    })));
    let liked = centroids(vec![vec![1.0, 0.0]]);
    // Scores rise with index, so the best items are at the end of the input
    let items: Vec<CandidateItem> = (0..50)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 / 49.0;
            CandidateItem::new(i, format!("p{i}")).with_embedding(vec![x, 1.0 - x])
        })
        .collect();

    let result = pipeline
        .rank(&liked, &CentroidSet::empty(), &items, 30, 1.0)
        .await
        .unwrap();
    assert_eq!(result.len(), 30);
    let ids: Vec<i64> = result
        .items
        .iter()
        .map(|i| i.id.as_i64().unwrap())
        .collect();
    let expected: Vec<i64> = (20..50).rev().collect();
    assert_eq!(ids, expected);
}
