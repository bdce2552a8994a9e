// Taste profiles: cluster liked/disliked descriptions into centroids, then
// rank candidate items by similarity to them.

pub mod cluster;
pub mod engine;
pub mod kmeans;
pub mod pipeline;
pub mod resolve;
pub mod scoring;
pub mod types;
pub mod vector;

pub use cluster::ClusterEngine;
pub use engine::{DefaultTasteEngine, TasteEngine, create_taste_engine};
pub use pipeline::RankingPipeline;
pub use resolve::EmbeddingResolver;
pub use scoring::{ScoringEngine, score};
pub use types::*;
pub use vector::{cosine_similarity, decode_embedding};
