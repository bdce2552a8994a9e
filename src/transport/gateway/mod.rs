//! Axum HTTP gateway exposing the cluster and rank contracts.
//!
//! - `POST /calculate_preferences` (alias `/cluster`)
//! - `POST /recommend` (alias `/rank`)
//! - `GET /health`
//!
//! Request bodies are size-limited and requests time out, both from
//! `[gateway]` config.

mod handlers;
mod server;

pub use server::{build_router, run_gateway, run_gateway_with_listener};

use crate::core::taste::TasteEngine;
use std::sync::Arc;

#[cfg(test)]
use handlers::{handle_cluster, handle_health, handle_rank};
#[cfg(test)]
use server::resolve_bind_addr;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn TasteEngine>,
}
