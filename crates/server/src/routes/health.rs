// crates/server/src/routes/health.rs
//! Liveness plus a quick look at the progress store.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be read.
    pub status: String,
    pub app_name: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Logged sessions, absent when the database is unreadable.
    pub progress_entries: Option<i64>,
    pub backups: usize,
}

/// GET /api/health
///
/// Always 200 so the UI can render the failure itself.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let progress_entries = match state.db.database_info().await {
        Ok(info) => Some(info.sessions_count),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the database");
            None
        }
    };

    Json(HealthResponse {
        status: if progress_entries.is_some() { "ok" } else { "degraded" }.to_string(),
        app_name: peekaboo_core::APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        progress_entries,
        backups: state.db.backups().scan().len(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
