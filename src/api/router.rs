//! Router setup and configuration

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};

use crate::api::handlers;
use crate::api::state::AppState;

/// Request body limit; a 1 MiB proof as a JSON number array fits well within it
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/stamp", post(handlers::stamp))
        .route("/upgrade", post(handlers::upgrade))
        .route("/health", get(handlers::health_check));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
