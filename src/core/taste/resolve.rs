use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::EmbeddingError;

use super::types::Embedding;

/// Turns descriptions into validated vectors through one shared provider.
///
/// Texts are sent in batches of `batch_size`. When a batch call fails or
/// returns the wrong number of vectors, its texts are retried one by one (at
/// most `concurrency` in flight) so a single bad description only costs its
/// own vector. Every provider call is bounded by `timeout`; a timeout counts as
/// an embedding failure. Output order always matches input order.
#[derive(Clone)]
pub struct EmbeddingResolver {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    batch_size: usize,
    concurrency: usize,
}

impl EmbeddingResolver {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::from_config(provider, &EmbeddingConfig::default())
    }

    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            batch_size: config.batch_size.max(1),
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// D as reported by the provider.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// One result per input text, in input order.
    pub async fn embed_all(&self, texts: &[&str]) -> Vec<Result<Embedding, EmbeddingError>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let batch = self.call(chunk).await;
            match batch {
                Ok(vectors) if vectors.len() == chunk.len() => {
                    results.extend(vectors.into_iter().map(|v| self.check(v)));
                }
                Ok(vectors) if chunk.len() == 1 => {
                    results.push(Err(self.count_mismatch(1, vectors.len())));
                }
                Err(err) if chunk.len() == 1 => results.push(Err(err)),
                outcome => {
                    let reason = match outcome {
                        Ok(vectors) => self.count_mismatch(chunk.len(), vectors.len()).to_string(),
                        Err(err) => err.to_string(),
                    };
                    debug!(
                        provider = self.provider.name(),
                        batch = chunk.len(),
                        %reason,
                        "Batch embedding failed, retrying per text"
                    );
                    let pending: Vec<_> = chunk.iter().map(|text| self.embed_single(text)).collect();
                    let singles: Vec<_> = stream::iter(pending)
                        .buffered(self.concurrency)
                        .collect()
                        .await;
                    results.extend(singles);
                }
            }
        }
        results
    }

    async fn embed_single(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.call(&[text]).await?;
        if vectors.len() != 1 {
            return Err(self.count_mismatch(1, vectors.len()));
        }
        let vector = vectors.pop().unwrap_or_default();
        self.check(vector)
    }

    async fn call(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match tokio::time::timeout(self.timeout, self.provider.embed(texts)).await {
            Ok(Ok(vectors)) => Ok(vectors),
            Ok(Err(err)) => Err(EmbeddingError::Provider {
                provider: self.provider.name().to_string(),
                message: format!("{err:#}"),
            }),
            Err(_) => Err(EmbeddingError::Timeout {
                provider: self.provider.name().to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    fn check(&self, vector: Vec<f32>) -> Result<Embedding, EmbeddingError> {
        let expected = self.provider.dimensions();
        if vector.is_empty() || (expected > 0 && vector.len() != expected) {
            return Err(EmbeddingError::Dimension {
                provider: self.provider.name().to_string(),
                expected,
                got: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::NonFinite {
                provider: self.provider.name().to_string(),
            });
        }
        Ok(vector)
    }

    fn count_mismatch(&self, expected: usize, got: usize) -> EmbeddingError {
        EmbeddingError::CountMismatch {
            provider: self.provider.name().to_string(),
            expected,
            got,
        }
    }
}
