//! Factory reset of the progress data.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    /// Safety backup taken before the tables were cleared.
    pub backup: Option<String>,
}

/// POST /api/reset - Back up the database, then delete all progress.
///
/// Settings and existing backups are left alone.
pub async fn reset_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<ResetResponse>> {
    let settings = state.settings.load();
    let safety = state.db.reset_all_data(settings.max_backups).await?;
    metrics::record_backup("reset", &safety);

    let backup = safety.path().map(|p| p.display().to_string());
    if backup.is_none() {
        tracing::warn!("Reset completed without a safety backup");
    }
    Ok(Json(ResetResponse {
        success: true,
        backup,
    }))
}

/// Create the system routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/reset", post(reset_all))
}
