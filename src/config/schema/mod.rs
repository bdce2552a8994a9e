mod core;
mod embedding;
mod gateway;
mod observability;
mod taste;

pub use core::Config;
pub use embedding::EmbeddingConfig;
pub use gateway::GatewayConfig;
pub use observability::{LogFormat, ObservabilityConfig};
pub use taste::{ClusteringConfig, RankingConfig};
