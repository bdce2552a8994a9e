use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use palate::EmbeddingProvider;

/// Maps known descriptions to fixed vectors; anything else fails.
pub struct LookupProvider {
    dims: usize,
    table: HashMap<String, Vec<f32>>,
    pub calls: AtomicUsize,
}

impl LookupProvider {
    pub fn new(dims: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            dims,
            table: entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for LookupProvider {
    fn name(&self) -> &str {
        "lookup"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| {
                self.table
                    .get(*t)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("unknown description: {t}"))
            })
            .collect()
    }
}

/// Always fails.
pub struct BrokenProvider {
    pub dims: usize,
}

#[async_trait]
impl EmbeddingProvider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model unavailable")
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledProvider {
    pub dims: usize,
}

#[async_trait]
impl EmbeddingProvider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![vec![1.0; self.dims]; texts.len()])
    }
}
