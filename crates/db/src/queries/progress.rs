// crates/db/src/queries/progress.rs
// Writes and filtered reads of the progress table.

use std::collections::BTreeSet;

use peekaboo_core::{NewProgress, ProgressEntry, ProgressFilter};
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Connection, QueryBuilder, Row};
use tracing::debug;

use crate::{Database, DbError, DbResult};

/// Columns of a progress row, with NULLs from older files read as empty.
pub(crate) const PROGRESS_COLUMNS: &str = "id, \
    COALESCE(week, 0) AS week, \
    COALESCE(day, 0) AS day, \
    COALESCE(fluidity, 0) AS fluidity, \
    COALESCE(endurance, 0) AS endurance, \
    COALESCE(power, 0) AS power, \
    COALESCE(date, '') AS date, \
    COALESCE(notes, '') AS notes, \
    COALESCE(duration, 0) AS duration";

pub(crate) struct ProgressRow(pub(crate) ProgressEntry);

impl<'r> sqlx::FromRow<'r, SqliteRow> for ProgressRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(ProgressEntry {
            id: row.try_get("id")?,
            week: row.try_get("week")?,
            day: row.try_get("day")?,
            fluidity: row.try_get("fluidity")?,
            endurance: row.try_get("endurance")?,
            power: row.try_get("power")?,
            date: row.try_get("date")?,
            notes: row.try_get("notes")?,
            duration: row.try_get("duration")?,
        }))
    }
}

/// Row order of a progress listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressOrder {
    /// Most recent first, for the history table.
    NewestFirst,
    /// Curriculum order, for exports and charts.
    Curriculum,
}

impl ProgressOrder {
    fn sql(self) -> &'static str {
        match self {
            ProgressOrder::NewestFirst => " ORDER BY date DESC, week DESC, day DESC",
            ProgressOrder::Curriculum => " ORDER BY week, day",
        }
    }
}

fn filtered_query(filter: &ProgressFilter, order: ProgressOrder) -> QueryBuilder<'_, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(PROGRESS_COLUMNS);
    qb.push(" FROM progress WHERE 1=1");

    if let Some(week) = filter.week {
        qb.push(" AND week = ");
        qb.push_bind(week);
    }
    if let Some(from) = &filter.date_from {
        qb.push(" AND date >= ");
        qb.push_bind(from.as_str());
    }
    if let Some(to) = &filter.date_to {
        qb.push(" AND date <= ");
        qb.push_bind(to.as_str());
    }

    qb.push(order.sql());
    qb
}

async fn insert_row(
    conn: &mut SqliteConnection,
    entry: &NewProgress,
    date: &str,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO progress (week, day, fluidity, endurance, power, date, notes, duration)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(entry.week)
    .bind(entry.day)
    .bind(entry.fluidity)
    .bind(entry.endurance)
    .bind(entry.power)
    .bind(date)
    .bind(&entry.notes)
    .bind(entry.duration)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Delete every progress row and completion marker.
pub(crate) async fn clear_tables(conn: &mut SqliteConnection) -> DbResult<()> {
    let mut tx = conn.begin().await?;
    sqlx::query("DELETE FROM progress").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM sessions").execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

impl Database {
    /// Record a workout as the only entry for its (week, day).
    ///
    /// Existing rows for the slot are deleted and a new row inserted, so the
    /// slot's id changes on every save. The slot's completion marker is
    /// upserted in the same transaction. Returns the new row id.
    pub async fn insert_or_replace_progress(&self, entry: &NewProgress) -> DbResult<i64> {
        let date = entry.resolved_date();
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;

        sqlx::query("DELETE FROM progress WHERE week = ?1 AND day = ?2")
            .bind(entry.week)
            .bind(entry.day)
            .execute(&mut *tx)
            .await?;

        let id = insert_row(&mut tx, entry, &date).await?;

        sqlx::query(
            r#"
            INSERT INTO sessions (week, day, completed_date, duration)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(week, day) DO UPDATE SET
                completed_date = excluded.completed_date,
                duration = excluded.duration
            "#,
        )
        .bind(entry.week)
        .bind(entry.day)
        .bind(&date)
        .bind(entry.duration)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        conn.close().await?;

        debug!(week = entry.week, day = entry.day, id, "Progress saved");
        Ok(id)
    }

    /// Record a workout without replacing earlier entries for its slot.
    ///
    /// Week and day are both required. Returns the new row id.
    pub async fn append_progress(&self, entry: &NewProgress) -> DbResult<i64> {
        if !entry.has_slot() {
            return Err(DbError::Validation("Week and day are required".to_string()));
        }

        let date = entry.resolved_date();
        let mut conn = self.connect().await?;
        let id = insert_row(&mut conn, entry, &date).await?;
        conn.close().await?;

        debug!(week = entry.week, day = entry.day, id, "Manual progress added");
        Ok(id)
    }

    /// Delete one entry by id. Returns whether a row was removed.
    ///
    /// The slot's completion marker is left alone.
    pub async fn delete_progress(&self, id: i64) -> DbResult<bool> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("DELETE FROM progress WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        conn.close().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every progress row and completion marker, without a backup.
    pub async fn delete_all_progress(&self) -> DbResult<()> {
        let mut conn = self.connect().await?;
        clear_tables(&mut conn).await?;
        conn.close().await
    }

    /// Entries matching `filter`, most recent first.
    pub async fn query_progress(&self, filter: &ProgressFilter) -> DbResult<Vec<ProgressEntry>> {
        self.fetch_filtered(filter, ProgressOrder::NewestFirst).await
    }

    /// Entries matching `filter`, in curriculum order.
    pub async fn query_progress_for_export(
        &self,
        filter: &ProgressFilter,
    ) -> DbResult<Vec<ProgressEntry>> {
        self.fetch_filtered(filter, ProgressOrder::Curriculum).await
    }

    async fn fetch_filtered(
        &self,
        filter: &ProgressFilter,
        order: ProgressOrder,
    ) -> DbResult<Vec<ProgressEntry>> {
        let mut conn = self.connect().await?;
        let rows: Vec<ProgressRow> = filtered_query(filter, order)
            .build_query_as()
            .fetch_all(&mut *conn)
            .await?;
        conn.close().await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Slots with at least one logged entry.
    pub async fn completed_slots(&self) -> DbResult<BTreeSet<(i64, i64)>> {
        let mut conn = self.connect().await?;
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT DISTINCT week, day FROM progress WHERE week IS NOT NULL AND day IS NOT NULL",
        )
        .fetch_all(&mut *conn)
        .await?;
        conn.close().await?;
        Ok(rows.into_iter().collect())
    }

    /// The most recent entry for one slot.
    pub async fn latest_progress_for_slot(
        &self,
        week: i64,
        day: i64,
    ) -> DbResult<Option<ProgressEntry>> {
        let mut conn = self.connect().await?;
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE week = ?1 AND day = ?2 \
             ORDER BY date DESC, id DESC LIMIT 1"
        );
        let row: Option<ProgressRow> = sqlx::query_as(&sql)
            .bind(week)
            .bind(day)
            .fetch_optional(&mut *conn)
            .await?;
        conn.close().await?;
        Ok(row.map(|r| r.0))
    }
}
