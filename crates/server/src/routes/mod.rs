//! API route handlers for the peekaboo server.

pub mod backups;
pub mod curriculum;
pub mod export;
pub mod health;
pub mod metrics;
pub mod progress;
pub mod settings;
pub mod stats;
pub mod system;

use std::sync::Arc;

use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - GET  /api/dashboard - Weeks and slots with completion flags
/// - GET  /api/week/{week}/day/{day} - One session with its latest rating
/// - POST /api/progress - Save a session (replaces the slot's entry)
/// - POST /api/progress/manual - Log a session (appends)
/// - GET  /api/progress - Filtered history with summary statistics
/// - GET  /api/progress/chart - Rating series for charts
/// - DELETE /api/progress/{id} - Delete one entry
/// - GET  /api/stats - Dashboard statistics
/// - GET  /api/metadata - Database, backup and settings metadata
/// - GET  /api/reminders - Reminder status
/// - GET/PUT /api/settings - Read or update settings
/// - GET  /api/export/progress.csv - Progress as CSV
/// - GET  /api/export/calendar.csv - Training schedule as calendar CSV
/// - GET  /api/export/program.txt - Full program as text
/// - GET  /api/backups - Newest backups
/// - POST /api/backups - Take a backup now
/// - POST /api/backups/upload - Restore from an uploaded database
/// - GET  /api/backups/{name} - Download a backup
/// - POST /api/backups/{name}/restore - Restore a backup
/// - POST /api/reset - Back up, then delete all progress
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", curriculum::router())
        .nest("/api", progress::router())
        .nest("/api", stats::router())
        .nest("/api", settings::router())
        .nest("/api", export::router())
        .nest("/api", backups::router())
        .nest("/api", system::router())
        .with_state(state)
}

/// Query parameters shared by the progress listing and CSV export.
///
/// Blank values and a week of 0 mean "no filter", and a week that isn't a
/// number is ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProgressQuery {
    pub week: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ProgressQuery {
    pub fn week(&self) -> Option<i64> {
        non_blank(&self.week)
            .and_then(|w| w.parse::<i64>().ok())
            .filter(|w| *w != 0)
    }

    pub fn to_filter(&self) -> peekaboo_core::ProgressFilter {
        peekaboo_core::ProgressFilter {
            week: self.week(),
            date_from: non_blank(&self.date_from),
            date_to: non_blank(&self.date_to),
        }
    }
}
