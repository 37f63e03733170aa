//! Settings API routes.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use peekaboo_core::{merge, Settings};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// GET /api/settings - Current settings, defaults filled in.
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings.load())
}

/// PUT /api/settings - Update settings (partial).
///
/// Keys in the body replace the current values; omitted keys are kept.
/// Retention is re-applied afterwards so a lowered `max_backups` takes
/// effect immediately.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Json<Settings>> {
    let current = match serde_json::to_value(state.settings.load()) {
        Ok(Value::Object(map)) => map,
        _ => Settings::default_table(),
    };
    let merged = merge(&current, &body);
    let settings: Settings = serde_json::from_value(Value::Object(merged))
        .map_err(|e| ApiError::BadRequest(format!("Invalid settings: {e}")))?;
    settings.validate()?;

    state.settings.save(&settings)?;
    tracing::info!(path = %state.settings.path().display(), "Settings saved");

    let report = state.db.cleanup_old_backups(settings.max_backups);
    metrics::record_cleanup(&report);

    Ok(Json(settings))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}
