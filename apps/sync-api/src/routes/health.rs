//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /health — service version plus a database ping. Unauthenticated
/// so load balancers can probe it.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if !state.db.health_check().await {
        return Err(ApiError::Internal("database unreachable".to_string()));
    }

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    })))
}
