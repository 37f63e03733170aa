// crates/db/src/lib.rs
//! SQLite storage for logged workouts, plus backup files of the database.
//!
//! Every operation opens its own connection and closes it before returning.
//! The database file itself is guarded by a read/write lock: statements share
//! it, while anything that copies or replaces the file (backup, restore,
//! reset) takes it exclusively.

pub mod backup;
mod migrations;
mod queries;

pub use backup::{
    backup_file_name, has_sqlite_header, parse_backup_name, BackupFile, BackupInfo,
    BackupOutcome, BackupSet, BackupStore, CleanupReport, BACKUP_PREFIX,
};
pub use queries::{DashboardStats, DatabaseInfo};

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use peekaboo_core::paths::AppPaths;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Handle to the primary database file and its backup directory.
#[derive(Debug, Clone)]
pub struct Database {
    db_path: PathBuf,
    backups: BackupStore,
    file_lock: Arc<RwLock<()>>,
}

/// An open connection holding the shared side of the file lock.
pub(crate) struct Conn<'a> {
    conn: SqliteConnection,
    _shared: RwLockReadGuard<'a, ()>,
}

impl Deref for Conn<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for Conn<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Conn<'_> {
    pub(crate) async fn close(self) -> DbResult<()> {
        self.conn.close().await?;
        Ok(())
    }
}

impl Database {
    /// Open (or create) the database at `db_path` and run migrations.
    ///
    /// If the file cannot be opened, the newest backup in `backup_dir` is
    /// restored over it and the open is retried once.
    pub async fn open(db_path: &Path, backup_dir: &Path) -> DbResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(backup_dir)?;

        let db = Self {
            db_path: db_path.to_owned(),
            backups: BackupStore::new(backup_dir),
            file_lock: Arc::new(RwLock::new(())),
        };
        db.run_migrations().await?;

        info!(path = %db_path.display(), "Database opened");
        Ok(db)
    }

    /// Open the database laid out by `paths`.
    pub async fn open_paths(paths: &AppPaths) -> DbResult<Self> {
        Self::open(&paths.db_path, &paths.backup_dir).await
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .busy_timeout(Duration::from_secs(30))
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5))
    }

    /// Open a connection and confirm the file really is a database.
    ///
    /// Callers must hold the file lock.
    async fn try_open(&self) -> DbResult<SqliteConnection> {
        let mut conn = self.connect_options().connect().await?;
        // Reading the schema fails with SQLITE_NOTADB on a corrupt file.
        sqlx::query("SELECT COUNT(*) FROM sqlite_master")
            .fetch_one(&mut conn)
            .await?;
        Ok(conn)
    }

    /// Open a connection for one operation.
    ///
    /// On failure, restores the newest backup and retries once before
    /// surfacing the error.
    pub(crate) async fn connect(&self) -> DbResult<Conn<'_>> {
        {
            let shared = self.file_lock.read().await;
            match self.try_open().await {
                Ok(conn) => {
                    return Ok(Conn {
                        conn,
                        _shared: shared,
                    })
                }
                Err(e) => {
                    warn!(path = %self.db_path.display(), error = %e, "Database connection error, trying latest backup");
                }
            }
        }

        {
            let _exclusive = self.file_lock.write().await;
            self.restore_latest_blocking().await;
        }

        let shared = self.file_lock.read().await;
        let conn = self.try_open().await?;
        Ok(Conn {
            conn,
            _shared: shared,
        })
    }

    /// Run all inline migrations.
    ///
    /// Uses a `_migrations` table to track which migrations have already been
    /// applied. Restored files from older releases have no such table; every
    /// migration is idempotent, so they simply run again.
    pub(crate) async fn run_migrations(&self) -> DbResult<()> {
        let mut conn = self.connect().await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")
            .execute(&mut *conn)
            .await?;

        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(&mut *conn)
            .await?;
        let current_version = row.0 as usize;

        for (i, migration) in migrations::MIGRATIONS.iter().enumerate() {
            let version = i + 1; // 1-based
            if version > current_version {
                sqlx::query(migration).execute(&mut *conn).await?;
                sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
                    .bind(version as i64)
                    .execute(&mut *conn)
                    .await?;
            }
        }

        conn.close().await
    }

    /// Path of the primary database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The backup directory this database rotates into.
    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Size of the primary file in bytes, 0 if it does not exist.
    pub fn file_size(&self) -> u64 {
        std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp(tmp: &tempfile::TempDir) -> Database {
        Database::open(&tmp.path().join("peekaboo.db"), &tmp.path().join("backup"))
            .await
            .expect("should open database")
    }

    #[tokio::test]
    async fn test_open_creates_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let db = open_temp(&tmp).await;

        let mut conn = db.connect().await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM progress")
            .fetch_one(&mut *conn)
            .await
            .expect("progress table should exist");
        assert_eq!(count.0, 0);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&mut *conn)
            .await
            .expect("sessions table should exist");
        assert_eq!(count.0, 0);
        conn.close().await.unwrap();

        assert!(db.db_path().exists(), "database file should be created on disk");
        assert!(db.backups().dir().is_dir());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let db = open_temp(&tmp).await;

        db.run_migrations()
            .await
            .expect("second migration run should succeed");

        // Reopening the same file is also fine.
        let again = open_temp(&tmp).await;
        let mut conn = again.connect().await.unwrap();
        let versions: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(versions.0 as usize, migrations::MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_file_size_reports_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let db = open_temp(&tmp).await;
        assert!(db.file_size() > 0);
    }

    #[tokio::test]
    async fn test_open_fails_when_corrupt_and_no_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("peekaboo.db");
        std::fs::write(&path, b"definitely not a sqlite database, just text".repeat(64)).unwrap();

        let result = Database::open(&path, &tmp.path().join("backup")).await;
        assert!(matches!(result, Err(DbError::Sqlx(_))), "got {result:?}");
    }
}
