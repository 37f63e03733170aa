// crates/server/src/routes/curriculum.rs
//! Training plan endpoints: the week grid and single-session view.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use peekaboo_core::{Settings, TrainingSession, WEEKS};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardDay {
    pub day: i64,
    pub focus: String,
    pub duration: String,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardWeek {
    pub week: i64,
    pub days: Vec<DashboardDay>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub weeks: Vec<DashboardWeek>,
    pub completed_count: usize,
    pub total_slots: usize,
}

/// The stored rating shown when revisiting a session.
#[derive(Debug, Serialize)]
pub struct ExistingProgress {
    pub fluidity: i64,
    pub endurance: i64,
    pub power: i64,
    pub notes: String,
    pub duration: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub week: i64,
    pub day: i64,
    pub session: TrainingSession,
    pub progress: Option<ExistingProgress>,
    pub settings: Settings,
}

/// GET /api/dashboard - Every week of the plan with per-slot completion.
///
/// A slot counts as completed once any progress row exists for it.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardResponse>> {
    let completed = state.db.completed_slots().await?;

    let weeks: Vec<DashboardWeek> = WEEKS
        .map(|week| DashboardWeek {
            week,
            days: state
                .curriculum
                .week(week)
                .map(|slot| DashboardDay {
                    day: slot.day,
                    focus: slot.session.focus.clone(),
                    duration: slot.session.duration.clone(),
                    completed: completed.contains(&(slot.week, slot.day)),
                })
                .collect(),
        })
        .collect();

    let completed_count = state
        .curriculum
        .slots()
        .filter(|slot| completed.contains(&(slot.week, slot.day)))
        .count();

    Ok(Json(DashboardResponse {
        weeks,
        completed_count,
        total_slots: state.curriculum.len(),
    }))
}

/// GET /api/week/{week}/day/{day} - One curriculum slot.
///
/// Includes the latest logged rating for the slot and the current settings.
pub async fn session_view(
    State(state): State<Arc<AppState>>,
    Path((week, day)): Path<(i64, i64)>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .curriculum
        .slot(week, day)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let progress = state
        .db
        .latest_progress_for_slot(week, day)
        .await?
        .map(|entry| ExistingProgress {
            fluidity: entry.fluidity,
            endurance: entry.endurance,
            power: entry.power,
            notes: entry.notes,
            duration: entry.duration,
        });

    Ok(Json(SessionResponse {
        week,
        day,
        session: session.clone(),
        progress,
        settings: state.settings.load(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/week/{week}/day/{day}", get(session_view))
}
