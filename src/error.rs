use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `palate`.
///
/// Request-fatal classes (input, clustering, output, config) abort a request
/// and surface as an [`ErrorEnvelope`]. Per-item classes (embedding, scoring)
/// are recovered inside the pipelines and only ever reach the log.
#[derive(Debug, Error)]
pub enum PalateError {
    // ── Request payload ─────────────────────────────────────────────────
    #[error("input: {0}")]
    Input(#[from] InputError),

    // ── Embedding provider ──────────────────────────────────────────────
    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    // ── Clustering ──────────────────────────────────────────────────────
    #[error("clustering: {0}")]
    Clustering(#[from] ClusteringError),

    // ── Scoring ─────────────────────────────────────────────────────────
    #[error("scoring: {0}")]
    Scoring(#[from] ScoringError),

    // ── Response serialization ──────────────────────────────────────────
    #[error("output: {0}")]
    Output(#[from] OutputError),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Input errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no input data received")]
    Empty,

    #[error("invalid JSON input: {0}")]
    Json(String),

    #[error("missing required data: {0}")]
    MissingRequired(String),

    #[error("{set} cluster {index} is empty")]
    EmptyCentroid { set: &'static str, index: usize },

    #[error("{set} cluster {index} has dimension {found}, expected {expected}")]
    CentroidDimension {
        set: &'static str,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{set} cluster {index} contains a non-finite value")]
    NonFiniteCentroid { set: &'static str, index: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

// ─── Embedding errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("provider {provider} request failed: {message}")]
    Provider { provider: String, message: String },

    #[error("provider {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("provider {provider} returned {got} vectors for {expected} inputs")]
    CountMismatch {
        provider: String,
        expected: usize,
        got: usize,
    },

    #[error("provider {provider} returned dimension {got}, expected {expected}")]
    Dimension {
        provider: String,
        expected: usize,
        got: usize,
    },

    #[error("provider {provider} returned a non-finite component")]
    NonFinite { provider: String },

    #[error("encoded embedding rejected: {0}")]
    Decode(String),
}

// ─── Clustering errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClusteringError {
    #[error("invalid cluster count {k} for {samples} samples")]
    InvalidClusterCount { k: usize, samples: usize },

    #[error("cannot cluster an empty batch")]
    EmptyBatch,

    #[error("embedding dimension is zero")]
    ZeroDimension,

    #[error("sample {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("sample {index} contains a non-finite value")]
    NonFinite { index: usize },

    #[error("clustering task failed: {0}")]
    Task(String),
}

// ─── Scoring errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("item embedding has dimension {found}, centroids have {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("item embedding contains a non-finite value")]
    NonFinite,

    #[error("no liked centroids to score against")]
    NoLikedCentroids,
}

// ─── Output errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown embedding provider: {0}")]
    UnknownProvider(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Error envelope ──────────────────────────────────────────────────────────

/// Uniform failure payload shared by the stdio commands and the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

impl PalateError {
    /// Short caller-facing summary plus the full error chain as details.
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Input(InputError::Empty) => ErrorEnvelope::new("No input data received", None),
            Self::Input(InputError::Json(detail)) => {
                ErrorEnvelope::new("Invalid JSON input", Some(detail.clone()))
            }
            Self::Input(InputError::MissingRequired(what)) => {
                ErrorEnvelope::new(format!("Missing required data: {what}"), None)
            }
            Self::Input(err) => ErrorEnvelope::new("Error processing input", Some(err.to_string())),
            Self::Embedding(err) => {
                ErrorEnvelope::new("Error computing embeddings", Some(err.to_string()))
            }
            Self::Clustering(err) => {
                ErrorEnvelope::new("Error computing clusters", Some(err.to_string()))
            }
            Self::Scoring(err) => {
                ErrorEnvelope::new("Error computing recommendations", Some(err.to_string()))
            }
            Self::Output(err) => ErrorEnvelope::new("Error preparing output", Some(err.to_string())),
            Self::Config(err) => {
                ErrorEnvelope::new("Error loading configuration", Some(err.to_string()))
            }
            Self::Other(err) => ErrorEnvelope::new("Internal error", Some(format!("{err:#}"))),
        }
    }

    /// Whether this error aborts the whole request (as opposed to a single item).
    pub fn is_request_fatal(&self) -> bool {
        !matches!(self, Self::Embedding(_) | Self::Scoring(_))
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, PalateError>;
