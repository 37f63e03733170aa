// crates/server/src/routes/progress.rs
//! Progress logging endpoints: save, manual log, delete, history and chart.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use peekaboo_core::{
    compute_aggregates, ChartSeries, NewProgress, ProgressEntry, ProgressFilter, ProgressSummary,
};
use serde::{Deserialize, Serialize};

use super::ProgressQuery;
use crate::error::{ApiJson, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Body of the primary save: every rating is required.
#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    pub week: i64,
    pub day: i64,
    pub fluidity: i64,
    pub endurance: i64,
    pub power: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub duration: i64,
}

/// Body of a manual log. Missing ratings default to 0.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManualProgressRequest {
    pub week: Option<i64>,
    pub day: Option<i64>,
    pub fluidity: i64,
    pub endurance: i64,
    pub power: i64,
    pub notes: String,
    pub duration: i64,
    /// Explicit timestamp; defaults to now.
    pub date: Option<String>,
}

impl From<ManualProgressRequest> for NewProgress {
    fn from(req: ManualProgressRequest) -> Self {
        NewProgress {
            week: req.week.unwrap_or(0),
            day: req.day.unwrap_or(0),
            fluidity: req.fluidity,
            endurance: req.endurance,
            power: req.power,
            notes: req.notes,
            duration: req.duration,
            date: req.date.filter(|d| !d.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct WriteResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub entries: Vec<ProgressEntry>,
    pub summary: ProgressSummary,
    pub filter: ProgressFilter,
}

/// POST /api/progress - Save a session as the only entry for its slot.
///
/// When `auto_backup` is on, a backup follows the save. Its outcome is
/// logged and counted but never fails the request.
pub async fn save_progress(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SaveProgressRequest>,
) -> ApiResult<Json<WriteResponse>> {
    let entry = NewProgress::new(req.week, req.day, req.fluidity, req.endurance, req.power)
        .with_notes(req.notes)
        .with_duration(req.duration);
    let id = state.db.insert_or_replace_progress(&entry).await?;
    metrics::record_progress_write("save");

    let settings = state.settings.load();
    if settings.auto_backup {
        let outcome = state.db.create_backup(settings.max_backups).await;
        metrics::record_backup("auto", &outcome);
    }

    Ok(Json(WriteResponse { success: true, id }))
}

/// POST /api/progress/manual - Log a session, keeping earlier entries.
pub async fn add_manual_progress(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ManualProgressRequest>,
) -> ApiResult<Json<WriteResponse>> {
    let id = state.db.append_progress(&req.into()).await?;
    metrics::record_progress_write("manual");
    Ok(Json(WriteResponse { success: true, id }))
}

/// DELETE /api/progress/{id} - Delete one entry. Unknown ids succeed.
pub async fn delete_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.db.delete_progress(id).await?;
    if deleted {
        metrics::record_progress_write("delete");
    }
    Ok(Json(DeleteResponse {
        success: true,
        deleted,
    }))
}

/// GET /api/progress - History matching `week`, `date_from` and `date_to`,
/// most recent first, with summary statistics over the same rows.
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Json<ProgressResponse>> {
    let filter = query.to_filter();
    let entries = state.db.query_progress(&filter).await?;
    let summary = compute_aggregates(&entries);
    Ok(Json(ProgressResponse {
        entries,
        summary,
        filter,
    }))
}

/// GET /api/progress/chart - Rating series in curriculum order.
pub async fn progress_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Json<ChartSeries>> {
    let filter = ProgressFilter {
        week: query.week(),
        ..Default::default()
    };
    let entries = state.db.query_progress_for_export(&filter).await?;
    Ok(Json(ChartSeries::from_entries(&entries)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/progress", get(list_progress).post(save_progress))
        .route("/progress/manual", post(add_manual_progress))
        .route("/progress/chart", get(progress_chart))
        .route("/progress/{id}", delete(delete_progress))
}
