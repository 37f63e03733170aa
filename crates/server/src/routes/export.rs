//! Export endpoints: progress CSV, calendar CSV and the printable program.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;
use peekaboo_core::csv::push_row;
use peekaboo_core::program::{calendar_csv, program_text};
use peekaboo_core::ProgressEntry;

use super::ProgressQuery;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const PROGRESS_HEADER: [&str; 8] = [
    "Week",
    "Day",
    "Fluidity",
    "Endurance",
    "Power",
    "Date",
    "Notes",
    "Duration (min)",
];

fn attachment(content_type: &'static str, filename: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Build the progress CSV with RFC 4180 escaping.
fn build_progress_csv(entries: &[ProgressEntry]) -> String {
    let mut csv = String::new();
    push_row(&mut csv, &PROGRESS_HEADER);

    for e in entries {
        push_row(
            &mut csv,
            &[
                e.week.to_string(),
                e.day.to_string(),
                e.fluidity.to_string(),
                e.endurance.to_string(),
                e.power.to_string(),
                e.date.clone(),
                e.notes.clone(),
                e.duration.to_string(),
            ],
        );
    }

    csv
}

/// GET /api/export/progress.csv - Filtered progress in curriculum order.
///
/// Accepts the same filters as `GET /api/progress`. Returns 404 when nothing
/// matches.
pub async fn export_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Response> {
    let entries = state
        .db
        .query_progress_for_export(&query.to_filter())
        .await?;
    if entries.is_empty() {
        return Err(ApiError::NotFound(
            "No progress data found to export.".to_string(),
        ));
    }

    let filename = format!(
        "peekaboo_progress_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    Ok(attachment(
        "text/csv; charset=utf-8",
        filename,
        build_progress_csv(&entries),
    ))
}

/// GET /api/export/calendar.csv - The plan as calendar events starting today.
pub async fn export_calendar(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let settings = state.settings.load();
    let today = Local::now().date_naive();
    let csv = calendar_csv(state.curriculum, &settings.training_time, today)?;

    let filename = format!("peekaboo_schedule_{}.csv", today.format("%Y%m%d"));
    Ok(attachment("text/csv; charset=utf-8", filename, csv))
}

/// GET /api/export/program.txt - The whole plan as plain text.
pub async fn export_program(State(state): State<Arc<AppState>>) -> Response {
    let filename = format!(
        "peekaboo_complete_program_{}.txt",
        Local::now().format("%Y%m%d")
    );
    attachment(
        "text/plain; charset=utf-8",
        filename,
        program_text(state.curriculum),
    )
}

/// Create the export routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/export/progress.csv", get(export_progress))
        .route("/export/calendar.csv", get(export_calendar))
        .route("/export/program.txt", get(export_program))
}
