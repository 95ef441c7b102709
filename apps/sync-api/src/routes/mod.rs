//! # Route Map
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /sync/upload                      full snapshot, wipe+replace    │
//! │  GET  /sync/download/{user_id}          full snapshot, nested exports  │
//! │  POST /sync/incremental-upload          reconcile changed records      │
//! │  GET  /sync/changes/{user_id}/{ts}      rows changed after cursor      │
//! │  GET  /contacts/{id}/statement          ledger with running balance    │
//! │  GET  /reports/daybook?date=            sales for one day              │
//! │  GET  /health                           liveness + db ping             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All routes except `/health` require a bearer token; the `{user_id}`
//! paths additionally require the token to belong to that account.

pub mod health;
pub mod reports;
pub mod sync;

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/sync/upload", post(sync::upload_snapshot))
        .route("/sync/download/{user_id}", get(sync::download_snapshot))
        .route("/sync/incremental-upload", post(sync::incremental_upload))
        .route("/sync/changes/{user_id}/{timestamp}", get(sync::changes))
        .route(
            "/contacts/{contact_id}/statement",
            get(reports::contact_statement),
        )
        .route("/reports/daybook", get(reports::daybook))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}
