use super::super::{
    ClusteringConfig, EmbeddingConfig, GatewayConfig, ObservabilityConfig, RankingConfig,
};
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - resolved at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// `~/.palate`, or `./.palate` when no home directory can be found.
    pub fn default_dir() -> PathBuf {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        home.join(".palate")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.ranking.top_n == 0 {
            return fail("ranking.top_n must be >= 1");
        }
        if !self.ranking.dislike_weight.is_finite() || self.ranking.dislike_weight < 0.0 {
            return fail("ranking.dislike_weight must be a finite, non-negative number");
        }
        if self.clustering.max_clusters == 0 {
            return fail("clustering.max_clusters must be >= 1");
        }
        if self.clustering.n_init == 0 {
            return fail("clustering.n_init must be >= 1");
        }
        if self.clustering.max_iterations == 0 {
            return fail("clustering.max_iterations must be >= 1");
        }
        if !self.clustering.tolerance.is_finite() || self.clustering.tolerance < 0.0 {
            return fail("clustering.tolerance must be a finite, non-negative number");
        }
        if self.embedding.batch_size == 0 {
            return fail("embedding.batch_size must be >= 1");
        }
        if self.embedding.concurrency == 0 {
            return fail("embedding.concurrency must be >= 1");
        }
        if self.embedding.timeout_secs == 0 {
            return fail("embedding.timeout_secs must be >= 1");
        }
        if self.embedding.dimensions == 0 && self.embedding.provider != "none" {
            return fail("embedding.dimensions must be >= 1");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: Self::default_dir().join("config.toml"),
            embedding: EmbeddingConfig::default(),
            clustering: ClusteringConfig::default(),
            ranking: RankingConfig::default(),
            gateway: GatewayConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
