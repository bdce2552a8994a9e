use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use super::AppState;
use crate::error::{ClusteringError, PalateError};
use crate::transport::payload::{Contract, respond};

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "provider": state.engine.provider_name(),
        "dimensions": state.engine.dimensions(),
    });
    Json(body)
}

/// POST /calculate_preferences: cluster liked/disliked descriptions
pub(super) async fn handle_cluster(State(state): State<AppState>, body: Bytes) -> Response {
    run_contract(&state, Contract::Cluster, &body).await
}

/// POST /recommend: rank posts against a profile
pub(super) async fn handle_rank(State(state): State<AppState>, body: Bytes) -> Response {
    run_contract(&state, Contract::Rank, &body).await
}

async fn run_contract(state: &AppState, contract: Contract, body: &[u8]) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %request_id, %contract);

    async {
        tracing::debug!(bytes = body.len(), "Request received");
        match respond(state.engine.as_ref(), contract, body).await {
            Ok(payload) => {
                (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], payload)
                    .into_response()
            }
            Err(err) => {
                let status = status_for(&err);
                tracing::warn!(status = status.as_u16(), error = %err, "Request failed");
                (status, Json(err.envelope())).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

pub(super) fn status_for(err: &PalateError) -> StatusCode {
    match err {
        PalateError::Input(_) => StatusCode::BAD_REQUEST,
        PalateError::Clustering(ClusteringError::Task(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        PalateError::Clustering(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
