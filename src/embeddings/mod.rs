//! Embedding providers: text in, fixed-dimension vectors out.
//!
//! The core never looks inside a provider. It only relies on
//! [`EmbeddingProvider::dimensions`] being stable for the lifetime of the
//! instance and on identical input producing identical vectors.

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::ConfigError;

#[cfg(feature = "fastembed")]
mod local;
mod openai;

#[cfg(feature = "fastembed")]
pub use local::FastEmbedEmbedding;
pub use openai::OpenAiEmbedding;

/// Trait for embedding providers: convert text to vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts into vectors
    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut results = self.embed(&[text]).await?;
        results
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding result"))
    }
}

// ── Deterministic provider (offline, hash based) ─────────────

/// Hash-derived vectors with components in `[-1, 1]`.
///
/// Carries no semantics: equal strings map to equal vectors, different strings
/// to unrelated ones. Used for offline runs and tests.
pub struct DeterministicEmbedding {
    dims: usize,
    seed: u64,
}

impl DeterministicEmbedding {
    pub fn new(dims: usize) -> Self {
        Self { dims, seed: 0 }
    }

    pub fn with_seed(dims: usize, seed: u64) -> Self {
        Self { dims, seed }
    }

    fn fnv1a64(seed: u64, bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ seed;
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }

    fn splitmix64(mut x: u64) -> u64 {
        x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = x;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    #[allow(clippy::cast_precision_loss)]
    fn u64_to_unit_f32(x: u64) -> f32 {
        const U24_MAX: f32 = ((1u32 << 24) - 1) as f32;
        let top_u24: u32 = (x >> 40) as u32;
        (top_u24 as f32 / U24_MAX) * 2.0 - 1.0
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let base = Self::fnv1a64(self.seed, text.as_bytes());
        (0..self.dims)
            .map(|i| Self::u64_to_unit_f32(Self::splitmix64(base ^ (i as u64))))
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbedding {
    fn name(&self) -> &str {
        "deterministic"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

// ── Noop provider (no embedding backend) ─────────────────────

pub struct NoopEmbedding;

#[async_trait]
impl EmbeddingProvider for NoopEmbedding {
    fn name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }
}

// ── Factory ──────────────────────────────────────────────────

/// Build the provider named by `config.provider`.
///
/// Construction is cheap for every provider; model loading (fastembed) is
/// deferred to the first embed call and happens once per instance.
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>, ConfigError> {
    let api_key = config.api_key.as_deref().unwrap_or("");
    match config.provider.as_str() {
        "none" => Ok(Box::new(NoopEmbedding)),
        "deterministic" => Ok(Box::new(DeterministicEmbedding::with_seed(
            config.dimensions,
            config.seed,
        ))),
        "openai" => Ok(Box::new(OpenAiEmbedding::new(
            "https://api.openai.com",
            api_key,
            &config.model,
            config.dimensions,
        ))),
        name if name.starts_with("custom:") => {
            let base_url = name.strip_prefix("custom:").unwrap_or("");
            let policy = openai::CustomBaseUrlPolicy {
                allow_http: cfg!(test),
            };
            let valid = openai::validate_custom_base_url(base_url, policy)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
            Ok(Box::new(OpenAiEmbedding::new(
                &valid,
                api_key,
                &config.model,
                config.dimensions,
            )))
        }
        #[cfg(feature = "fastembed")]
        "fastembed" => Ok(Box::new(FastEmbedEmbedding::new(
            &config.model,
            config.dimensions,
        )?)),
        #[cfg(not(feature = "fastembed"))]
        "fastembed" => Err(ConfigError::Validation(
            "embedding provider 'fastembed' requires building with `--features fastembed`".into(),
        )),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}
