#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod core;
pub mod embeddings;
pub mod error;
pub mod observability;
pub mod transport;

pub use config::Config;
pub use crate::core::taste::{
    CandidateItem, CentroidSet, ClusterEngine, RankingPipeline, ScoringEngine, TasteEngine,
    TasteProfile, create_taste_engine,
};
pub use embeddings::EmbeddingProvider;
pub use error::{PalateError, Result};
