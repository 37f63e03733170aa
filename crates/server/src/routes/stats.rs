// crates/server/src/routes/stats.rs
//! Dashboard statistics, app metadata and reminder status.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{Duration, Local};
use peekaboo_core::{round2, DATE_FORMAT};
use peekaboo_db::DashboardStats;
use serde::Serialize;

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DatabaseMetadata {
    pub sessions_count: i64,
    pub last_session: Option<String>,
    pub size_bytes: u64,
    pub size_mb: f64,
}

#[derive(Debug, Serialize)]
pub struct BackupMetadata {
    pub count: usize,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct SettingsMetadata {
    pub file_exists: bool,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub app_name: String,
    pub version: String,
    pub database: DatabaseMetadata,
    pub backups: BackupMetadata,
    pub settings: SettingsMetadata,
}

#[derive(Debug, Serialize)]
pub struct ReminderStatus {
    pub enabled: bool,
    pub training_time: String,
    pub timezone: String,
    /// One hour from now, local time.
    pub next_check: String,
}

/// GET /api/stats - Totals, averages and the most recent sessions.
pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db.dashboard_stats().await?))
}

/// GET /api/metadata - Where data lives and how much of it there is.
pub async fn metadata(State(state): State<Arc<AppState>>) -> ApiResult<Json<MetadataResponse>> {
    let info = state.db.database_info().await?;
    let size_bytes = state.db.file_size();
    metrics::record_database_size(size_bytes);

    let backups = state.db.backups();
    Ok(Json(MetadataResponse {
        app_name: peekaboo_core::APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseMetadata {
            sessions_count: info.sessions_count,
            last_session: info.last_session,
            size_bytes,
            size_mb: round2(size_bytes as f64 / (1024.0 * 1024.0)),
        },
        backups: BackupMetadata {
            count: backups.scan().len(),
            location: backups.dir().display().to_string(),
        },
        settings: SettingsMetadata {
            file_exists: state.settings.exists(),
            location: state.settings.path().display().to_string(),
        },
    }))
}

/// GET /api/reminders - Reminder configuration, computed on demand.
pub async fn reminders(State(state): State<Arc<AppState>>) -> Json<ReminderStatus> {
    let settings = state.settings.load();
    let next_check = (Local::now().naive_local() + Duration::hours(1))
        .format(DATE_FORMAT)
        .to_string();
    Json(ReminderStatus {
        enabled: settings.reminder_enabled,
        training_time: settings.training_time,
        timezone: settings.timezone,
        next_check,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(stats))
        .route("/metadata", get(metadata))
        .route("/reminders", get(reminders))
}
