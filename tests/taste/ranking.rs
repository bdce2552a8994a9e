use std::sync::Arc;

use palate::Config;
use palate::core::taste::{DefaultTasteEngine, TasteEngine};
use palate::transport::{Contract, respond, stdio};
use serde_json::{Value, json};

use crate::fake_providers::LookupProvider;

fn engine_with(provider: Arc<LookupProvider>) -> DefaultTasteEngine {
    DefaultTasteEngine::new(provider, &Config::default())
}

fn catalog() -> Arc<LookupProvider> {
    Arc::new(LookupProvider::new(
        3,
        &[
            ("rain jacket", vec![1.0, 0.0, 0.0]),
            ("umbrella", vec![0.9, 0.1, 0.0]),
            ("sunglasses", vec![0.0, 1.0, 0.0]),
            ("sandals", vec![0.0, 0.9, 0.1]),
            ("novel", vec![0.0, 0.0, 1.0]),
        ],
    ))
}

async fn call(engine: &dyn TasteEngine, contract: Contract, body: &Value) -> Value {
    let bytes = respond(engine, contract, &serde_json::to_vec(body).unwrap())
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn ids(ranked: &Value) -> Vec<Value> {
    ranked
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].clone())
        .collect()
}

#[tokio::test]
async fn profile_feeds_ranking() {
    let engine = engine_with(catalog());
    let profile = call(
        &engine,
        Contract::Cluster,
        &json!({
            "likedDescriptions": ["rain jacket", "umbrella"],
            "dislikedDescriptions": ["sunglasses"]
        }),
    )
    .await;

    let mut request = profile.clone();
    request["posts"] = json!([
        {"_id": "p-sandals", "description": "sandals"},
        {"_id": "p-novel", "description": "novel"},
        {"_id": "p-umbrella", "description": "umbrella"}
    ]);
    let ranked = call(&engine, Contract::Rank, &request).await;
    assert_eq!(
        ids(&ranked),
        vec![json!("p-umbrella"), json!("p-novel"), json!("p-sandals")]
    );
    // sandals is close to the disliked centroid
    assert!(ranked[2]["final_score"].as_f64().unwrap() < 0.0);
}

#[tokio::test]
async fn supplied_embeddings_skip_the_provider() {
    let provider = catalog();
    let engine = engine_with(provider.clone());
    let ranked = call(
        &engine,
        Contract::Rank,
        &json!({
            "likedClusters": [[1.0, 0.0, 0.0]],
            "dislikedClusters": [],
            "posts": [
                {"id": 1, "description": "whatever", "embedding": [0.0, 1.0, 0.0]},
                {"id": 2, "description": "whatever", "embedding": "[1.0, 0.0, 0.0]"}
            ]
        }),
    )
    .await;
    assert_eq!(ids(&ranked), vec![json!(2), json!(1)]);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn hostile_encoded_embedding_falls_back_to_provider() {
    let provider = catalog();
    let engine = engine_with(provider.clone());
    let ranked = call(
        &engine,
        Contract::Rank,
        &json!({
            "likedClusters": [[1.0, 0.0, 0.0]],
            "posts": [
                {"id": "x", "description": "rain jacket", "embedding": "__import__('os').system('id')"},
                {"id": "y", "description": "novel", "embedding": {"values": [1, 2, 3]}}
            ]
        }),
    )
    .await;
    assert_eq!(ids(&ranked), vec![json!("x"), json!("y")]);
    assert!((ranked[0]["final_score"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn request_knobs_override_defaults() {
    let engine = engine_with(catalog());
    let posts = json!([
        {"id": "a", "description": "rain jacket"},
        {"id": "b", "description": "umbrella"},
        {"id": "c", "description": "novel"}
    ]);
    let ranked = call(
        &engine,
        Contract::Rank,
        &json!({
            "likedClusters": [[1.0, 0.0, 0.0]],
            "dislikedClusters": [[1.0, 0.0, 0.0]],
            "posts": posts,
            "topN": 1,
            "dislikeWeight": 0.0
        }),
    )
    .await;
    assert_eq!(ids(&ranked), vec![json!("a")]);
    assert!((ranked[0]["final_score"].as_f64().unwrap() - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn ranking_payload_echoes_identifiers_verbatim() {
    let engine = engine_with(catalog());
    let ranked = call(
        &engine,
        Contract::Rank,
        &json!({
            "likedClusters": [[0.0, 0.0, 1.0]],
            "posts": [
                {"_id": {"$oid": "65f0"}, "description": "novel"},
                {"description": null}
            ]
        }),
    )
    .await;
    assert_eq!(ranked[0]["id"], json!({"$oid": "65f0"}));
    assert_eq!(ranked[1]["id"], Value::Null);
    assert_eq!(ranked[1]["description"], "");
}

#[tokio::test]
async fn stdio_round_trip_reports_failures_as_envelopes() {
    let engine = engine_with(catalog());

    let mut out = Vec::new();
    let ok = stdio::run(
        &engine,
        Contract::Rank,
        &br#"{"likedClusters": [], "posts": []}"#[..],
        &mut out,
    )
    .await
    .unwrap();
    assert!(!ok);
    let envelope: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        envelope,
        json!({"error": "Missing required data: likedClusters and posts are required."})
    );

    let mut out = Vec::new();
    let ok = stdio::run(
        &engine,
        Contract::Cluster,
        &br#"{"liked": ["novel"], "disliked": []}"#[..],
        &mut out,
    )
    .await
    .unwrap();
    assert!(ok);
    let profile: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(profile["likedClusters"], json!([[0.0, 0.0, 1.0]]));
}
