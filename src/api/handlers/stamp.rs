//! Stamp endpoint handler

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};

use crate::api::dto::{StampRequest, StampResponse};
use crate::api::handlers::helpers::parse_json;
use crate::api::state::AppState;
use crate::error::ServerError;

/// POST /api/stamp - Submit a Merkle root to the pool servers
pub async fn stamp(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StampResponse>, ServerError> {
    let request: StampRequest = parse_json(&body).map_err(|e| e.sanitize(state.environment))?;

    let result = state
        .proxy
        .stamp(&request.merkle_root_hex)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Stamp failed");
            e.sanitize(state.environment)
        })?;

    Ok(Json(StampResponse {
        ots_file: result.ots_proof,
        server: result.server,
        servers: result.servers,
    }))
}
