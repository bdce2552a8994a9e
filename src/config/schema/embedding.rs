use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "fastembed" | "openai" | "custom:URL" | "deterministic" | "none"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name (e.g. "all-MiniLM-L6-v2", "text-embedding-3-small")
    #[serde(default = "default_model")]
    pub model: String,
    /// Vector dimension reported by the provider
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// API key for remote providers
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound for a single provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Texts per batched provider call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// In-flight per-text calls when a batch has to be retried one by one
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Seed for the deterministic provider
    #[serde(default)]
    pub seed: u64,
}

fn default_provider() -> String {
    "fastembed".into()
}
fn default_model() -> String {
    "all-MiniLM-L6-v2".into()
}
fn default_dimensions() -> usize {
    384
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_batch_size() -> usize {
    32
}
fn default_concurrency() -> usize {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            seed: 0,
        }
    }
}
