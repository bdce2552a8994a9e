pub mod schema;

pub use schema::{
    ClusteringConfig, Config, EmbeddingConfig, GatewayConfig, LogFormat, ObservabilityConfig,
    RankingConfig,
};
