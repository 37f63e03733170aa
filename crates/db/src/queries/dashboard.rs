// crates/db/src/queries/dashboard.rs
// Aggregates for the dashboard and the metadata page.

use peekaboo_core::{round2, ProgressEntry, RatingAverages};
use serde::Serialize;

use super::progress::{ProgressRow, PROGRESS_COLUMNS};
use crate::{Database, DbResult};

/// Numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_sessions: i64,
    /// Entries logged in the highest week that has any.
    pub current_week_progress: i64,
    /// Minutes.
    pub total_training_minutes: i64,
    /// Five most recent entries by date.
    pub recent_sessions: Vec<ProgressEntry>,
    pub averages: RatingAverages,
}

/// Row count and newest date of the progress table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub sessions_count: i64,
    pub last_session: Option<String>,
}

const RECENT_LIMIT: i64 = 5;

impl Database {
    /// Compute dashboard numbers in one connection.
    pub async fn dashboard_stats(&self) -> DbResult<DashboardStats> {
        let mut conn = self.connect().await?;

        let (total_sessions, current_week_progress, total_minutes): (i64, i64, Option<i64>) =
            sqlx::query_as(
                r#"
                SELECT
                  (SELECT COUNT(*) FROM progress),
                  (SELECT COUNT(*) FROM progress WHERE week = (SELECT MAX(week) FROM progress)),
                  (SELECT SUM(duration) FROM progress)
                "#,
            )
            .fetch_one(&mut *conn)
            .await?;

        let (fluidity, endurance, power): (Option<f64>, Option<f64>, Option<f64>) =
            sqlx::query_as("SELECT AVG(fluidity), AVG(endurance), AVG(power) FROM progress")
                .fetch_one(&mut *conn)
                .await?;

        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress ORDER BY date DESC, id DESC LIMIT ?1"
        );
        let recent: Vec<ProgressRow> = sqlx::query_as(&sql)
            .bind(RECENT_LIMIT)
            .fetch_all(&mut *conn)
            .await?;

        conn.close().await?;

        Ok(DashboardStats {
            total_sessions,
            current_week_progress,
            total_training_minutes: total_minutes.unwrap_or(0),
            recent_sessions: recent.into_iter().map(|r| r.0).collect(),
            averages: RatingAverages {
                fluidity: round2(fluidity.unwrap_or(0.0)),
                endurance: round2(endurance.unwrap_or(0.0)),
                power: round2(power.unwrap_or(0.0)),
            },
        })
    }

    pub async fn database_info(&self) -> DbResult<DatabaseInfo> {
        let mut conn = self.connect().await?;
        let (sessions_count, last_session): (i64, Option<String>) =
            sqlx::query_as("SELECT COUNT(*), MAX(date) FROM progress")
                .fetch_one(&mut *conn)
                .await?;
        conn.close().await?;
        Ok(DatabaseInfo {
            sessions_count,
            last_session,
        })
    }
}
