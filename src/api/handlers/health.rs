//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /api/health - Liveness, served from the health cache
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    if let Some(cached) = state.health_cache.get() {
        return Json(cached);
    }

    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    };
    state.health_cache.refresh(response.clone());

    Json(response)
}
