//! Sync endpoints: snapshot transfer, incremental reconcile, change feed.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use stockbook_sync::{
    changes_since, parse_sync_timestamp, IncrementalUploadRequest, SnapshotUploadRequest, SyncData,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Rejects oversized batches before any database work.
fn check_batch_limit(state: &AppState, data: &SyncData) -> Result<(), ApiError> {
    let total: usize = data.values().map(Vec::len).sum();
    if total > state.config.sync_batch_limit {
        return Err(ApiError::BadRequest(format!(
            "batch of {total} records exceeds limit of {}",
            state.config.sync_batch_limit
        )));
    }
    Ok(())
}

/// POST /sync/upload — replace the account's data with the uploaded
/// snapshot.
pub async fn upload_snapshot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SnapshotUploadRequest>,
) -> Result<Json<Value>, ApiError> {
    check_batch_limit(&state, &request.data)?;

    let result = state.snapshot.upload(&auth.user_id, &request.data).await?;

    Ok(Json(json!({
        "success": true,
        "inserted": result.inserted,
        "failed": result.failed,
        "timestamp": Utc::now(),
    })))
}

/// GET /sync/download/{user_id} — full export with nested documents.
pub async fn download_snapshot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if auth.user_id != user_id {
        return Err(ApiError::Forbidden);
    }

    let data = state.snapshot.download(&user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": data,
        "timestamp": Utc::now(),
    })))
}

/// POST /sync/incremental-upload — reconcile changed records against
/// the server copy.
pub async fn incremental_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<IncrementalUploadRequest>,
) -> Result<Json<Value>, ApiError> {
    check_batch_limit(&state, &request.data)?;

    let outcome = state
        .reconciler
        .reconcile(&auth.user_id, &request.data, request.last_sync_timestamp)
        .await?;

    Ok(Json(json!({
        "success": true,
        "results": outcome,
        "timestamp": Utc::now(),
    })))
}

/// GET /sync/changes/{user_id}/{timestamp} — rows changed after the
/// cursor. The timestamp segment accepts RFC 3339 or unix milliseconds.
pub async fn changes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((user_id, timestamp)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    if auth.user_id != user_id {
        return Err(ApiError::Forbidden);
    }

    let since = parse_sync_timestamp(&timestamp)?;
    let data = changes_since(state.db.pool(), &user_id, since).await?;

    Ok(Json(json!({
        "success": true,
        "data": data,
        "timestamp": Utc::now(),
    })))
}
