//! Shared application state.

use std::sync::Arc;

use stockbook_db::Database;
use stockbook_sync::{Reconciler, Snapshot};

use crate::auth::JwtValidator;
use crate::config::ApiConfig;

/// Everything a handler needs. Cheap to clone; axum clones it per
/// request.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reconciler: Reconciler,
    pub snapshot: Snapshot,
    pub jwt: JwtValidator,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let pool = db.pool().clone();
        AppState {
            reconciler: Reconciler::new(pool.clone()),
            snapshot: Snapshot::new(pool),
            jwt: JwtValidator::new(config.jwt_secret.clone()),
            db,
            config: Arc::new(config),
        }
    }
}
