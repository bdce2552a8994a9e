//! Local ONNX embeddings through `fastembed`.
//!
//! The model is loaded lazily on the first embed call. Concurrent first calls
//! race on a `OnceCell`, so exactly one load happens per provider instance.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;

use super::EmbeddingProvider;
use crate::error::ConfigError;

pub struct FastEmbedEmbedding {
    model: EmbeddingModel,
    model_name: String,
    dims: usize,
    handle: OnceCell<Arc<Mutex<TextEmbedding>>>,
}

fn parse_model(name: &str) -> Option<EmbeddingModel> {
    match name.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" | "allminilml6v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Some(EmbeddingModel::AllMiniLML6V2)
        }
        "all-minilm-l12-v2" | "allminilml12v2" => Some(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" | "bgesmallenv15" => Some(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" | "bgebaseenv15" => Some(EmbeddingModel::BGEBaseENV15),
        _ => None,
    }
}

fn model_dimensions(model: &EmbeddingModel) -> Result<usize, ConfigError> {
    TextEmbedding::get_model_info(model)
        .map(|info| info.dim)
        .map_err(|e| ConfigError::Validation(format!("unknown fastembed model info: {e}")))
}

impl FastEmbedEmbedding {
    /// `dims` must match the model's output dimension; D always comes from
    /// the model itself.
    pub fn new(model_name: &str, dims: usize) -> Result<Self, ConfigError> {
        let model = parse_model(model_name).ok_or_else(|| {
            ConfigError::Validation(format!("unsupported fastembed model '{model_name}'"))
        })?;
        let model_dims = model_dimensions(&model)?;
        if dims != model_dims {
            return Err(ConfigError::Validation(format!(
                "embedding.dimensions is {dims} but fastembed model '{model_name}' produces {model_dims}"
            )));
        }
        Ok(Self {
            model,
            model_name: model_name.to_string(),
            dims: model_dims,
            handle: OnceCell::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model_name
    }

    async fn loaded(&self) -> anyhow::Result<Arc<Mutex<TextEmbedding>>> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let model = self.model.clone();
                tracing::info!(model = %self.model_name, "loading fastembed model");
                let loaded = tokio::task::spawn_blocking(move || {
                    TextEmbedding::try_new(
                        InitOptions::new(model).with_show_download_progress(false),
                    )
                })
                .await
                .map_err(|e| anyhow::anyhow!("fastembed init task failed: {e}"))?
                .map_err(|e| anyhow::anyhow!("failed to initialise fastembed model: {e}"))?;
                Ok::<_, anyhow::Error>(Arc::new(Mutex::new(loaded)))
            })
            .await?;
        Ok(Arc::clone(handle))
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedEmbedding {
    fn name(&self) -> &str {
        "fastembed"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let handle = self.loaded().await?;
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();

        tokio::task::spawn_blocking(move || {
            let mut model = handle
                .lock()
                .map_err(|e| anyhow::anyhow!("fastembed model lock poisoned: {e}"))?;
            model
                .embed(owned, None)
                .map_err(|e| anyhow::anyhow!("fastembed embedding failed: {e}"))
        })
        .await
        .map_err(|e| anyhow::anyhow!("fastembed embed task failed: {e}"))?
    }
}
