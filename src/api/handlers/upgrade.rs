//! Upgrade endpoint handler

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use crate::api::dto::{ProofStatus, UpgradeResponse};
use crate::api::handlers::helpers::{decode_byte_array, parse_json};
use crate::api::state::AppState;
use crate::error::{ServerError, ServerResult};
use crate::proxy::MAX_PROOF_BYTES;

/// POST /api/upgrade - Query calendars for a richer proof
///
/// When the proof carries a Bitcoin attestation, confirmations are counted
/// against the cached tip height. An unavailable tip leaves the status at
/// `anchored`, never `pending`.
pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UpgradeResponse>, ServerError> {
    handle(&state, &body).await.map(Json).map_err(|e| {
        tracing::warn!(error = %e, "Upgrade failed");
        e.sanitize(state.environment)
    })
}

async fn handle(state: &AppState, body: &[u8]) -> ServerResult<UpgradeResponse> {
    let request: Value = parse_json(body)?;
    let ots_file = decode_byte_array("otsFile", request.get("otsFile"), MAX_PROOF_BYTES)?;

    let result = state.proxy.upgrade(&ots_file).await?;

    let mut response = UpgradeResponse {
        ots_file: result.ots_proof,
        upgraded: result.upgraded,
        status: ProofStatus::Pending,
        block_height: result.block_height,
        confirmations: None,
        tip_height: None,
        calendar_server: result.calendar_server,
    };

    if let Some(height) = result.block_height {
        let info = state.tracker.confirmations(height).await;
        response.confirmations = info.confirmations;
        response.tip_height = info.tip_height;
        response.status = match info.confirmations {
            Some(n) if n >= state.min_confirmations => ProofStatus::Confirmed,
            _ => ProofStatus::Anchored,
        };
    }

    tracing::debug!(
        status = ?response.status,
        block_height = ?response.block_height,
        confirmations = ?response.confirmations,
        "Upgrade handled"
    );

    Ok(response)
}
