// crates/db/src/backup.rs
//! Timestamped copies of the primary database file.
//!
//! Backups live in one flat directory as `peekaboo_backup_YYYYMMDD_HHMMSS.db`.
//! Ordering comes from the timestamp in the name, never from filesystem
//! metadata, so copies carried between machines keep their order.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::queries::clear_tables;
use crate::{Database, DbError, DbResult};

pub const BACKUP_PREFIX: &str = "peekaboo_backup_";
const BACKUP_SUFFIX: &str = ".db";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// File name of a backup taken at `at`.
pub fn backup_file_name(at: NaiveDateTime) -> String {
    format!(
        "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
        at.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

/// Timestamp encoded in a backup file name, if it is one.
pub fn parse_backup_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
}

/// Whether `bytes` start like an SQLite 3 database file.
pub fn has_sqlite_header(bytes: &[u8]) -> bool {
    bytes.starts_with(SQLITE_HEADER)
}

/// One backup file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BackupFile {
    pub created_at: NaiveDateTime,
    pub name: String,
    pub path: PathBuf,
}

/// Backup files in a directory, oldest first.
#[derive(Debug, Clone, Default)]
pub struct BackupSet {
    files: Vec<BackupFile>,
}

impl BackupSet {
    /// Collect every correctly named backup in `dir`. Other files are ignored.
    pub fn scan(dir: &Path) -> std::io::Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(created_at) = parse_backup_name(name) {
                files.push(BackupFile {
                    created_at,
                    name: name.to_string(),
                    path: entry.path(),
                });
            }
        }
        Ok(Self::from_files(files))
    }

    pub fn from_files(mut files: Vec<BackupFile>) -> Self {
        files.sort();
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn latest(&self) -> Option<&BackupFile> {
        self.files.last()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &BackupFile> {
        self.files.iter().rev()
    }

    /// The oldest files beyond the newest `keep`.
    pub fn surplus(&self, keep: usize) -> &[BackupFile] {
        let excess = self.files.len().saturating_sub(keep);
        &self.files[..excess]
    }
}

/// Result of pruning old backups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

/// What happened when a backup was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created {
        path: PathBuf,
        cleanup: CleanupReport,
    },
    /// There was no primary file to copy.
    Skipped,
    Failed(String),
}

impl BackupOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            BackupOutcome::Created { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, BackupOutcome::Created { .. })
    }
}

/// A backup as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub name: String,
    /// Formatted `YYYY-MM-DD HH:MM:SS`, from the file name.
    pub date: String,
    pub size_bytes: u64,
}

/// The backup directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current backups. A missing or unreadable directory reads as empty.
    pub fn scan(&self) -> BackupSet {
        match BackupSet::scan(&self.dir) {
            Ok(set) => set,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BackupSet::default(),
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to read backup directory");
                BackupSet::default()
            }
        }
    }

    /// Copy `primary` into a new backup stamped with the current local time.
    pub fn create_from(&self, primary: &Path, max_backups: u32) -> BackupOutcome {
        self.create_from_at(primary, Local::now().naive_local(), max_backups)
    }

    /// Copy `primary` into a backup stamped `at`, then prune to `max_backups`.
    ///
    /// A backup with the same second-resolution name is overwritten.
    pub fn create_from_at(
        &self,
        primary: &Path,
        at: NaiveDateTime,
        max_backups: u32,
    ) -> BackupOutcome {
        if !primary.exists() {
            info!(path = %primary.display(), "No database file to back up");
            return BackupOutcome::Skipped;
        }
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create backup directory");
            return BackupOutcome::Failed(e.to_string());
        }

        let name = backup_file_name(at);
        let path = self.dir.join(&name);
        if let Err(e) = std::fs::copy(primary, &path) {
            warn!(backup = %name, error = %e, "Database backup failed");
            return BackupOutcome::Failed(e.to_string());
        }
        info!(backup = %name, "Database backed up");

        let cleanup = self.cleanup(max_backups);
        BackupOutcome::Created { path, cleanup }
    }

    /// Delete the oldest backups so at most `max_backups` remain.
    ///
    /// At least one backup is always kept. Deletion failures are logged and
    /// reported, never raised.
    pub fn cleanup(&self, max_backups: u32) -> CleanupReport {
        let keep = max_backups.max(1) as usize;
        let set = self.scan();
        let mut report = CleanupReport::default();

        for old in set.surplus(keep) {
            match std::fs::remove_file(&old.path) {
                Ok(()) => {
                    info!(backup = %old.name, "Deleted old backup");
                    report.removed.push(old.name.clone());
                }
                Err(e) => {
                    warn!(backup = %old.name, error = %e, "Failed to delete old backup");
                    report.failed.push(old.name.clone());
                }
            }
        }
        report
    }

    /// Copy the newest backup over `primary`. No-op without backups.
    pub fn restore_latest_to(&self, primary: &Path) -> Option<PathBuf> {
        let set = self.scan();
        let latest = set.latest()?;
        match std::fs::copy(&latest.path, primary) {
            Ok(_) => {
                warn!(backup = %latest.name, "Restored database from backup");
                Some(latest.path.clone())
            }
            Err(e) => {
                error!(backup = %latest.name, error = %e, "Failed to restore database from backup");
                None
            }
        }
    }

    /// Path of a named file in the backup directory.
    pub fn resolve(&self, name: &str) -> DbResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DbError::Validation(format!(
                "Invalid backup file name: {name}"
            )));
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(DbError::NotFound(format!("Backup file not found: {name}")));
        }
        Ok(path)
    }

    /// Backups, newest first.
    pub fn list(&self) -> Vec<BackupInfo> {
        self.scan()
            .newest_first()
            .map(|file| BackupInfo {
                name: file.name.clone(),
                date: file.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                size_bytes: std::fs::metadata(&file.path).map(|m| m.len()).unwrap_or(0),
            })
            .collect()
    }
}

fn ensure_sqlite(bytes: &[u8], name: &str) -> DbResult<()> {
    if has_sqlite_header(bytes) {
        Ok(())
    } else {
        Err(DbError::Validation(format!(
            "{name} is not an SQLite database file"
        )))
    }
}

impl Database {
    /// Back up the primary file, then prune to `max_backups`.
    pub async fn create_backup(&self, max_backups: u32) -> BackupOutcome {
        let _exclusive = self.file_lock.write().await;
        self.backup_blocking(max_backups).await
    }

    /// Prune backups to `max_backups` without taking a new one.
    pub fn cleanup_old_backups(&self, max_backups: u32) -> CleanupReport {
        self.backups.cleanup(max_backups)
    }

    /// Replace the primary file with the newest backup, if any.
    pub async fn restore_from_latest_backup(&self) -> Option<PathBuf> {
        let _exclusive = self.file_lock.write().await;
        self.restore_latest_blocking().await
    }

    /// Replace the primary file with a named backup.
    ///
    /// A safety backup of the current file is taken first. Returns its outcome.
    pub async fn restore_from_backup(
        &self,
        name: &str,
        max_backups: u32,
    ) -> DbResult<BackupOutcome> {
        let source = self.backups.resolve(name)?;
        // Read before the safety backup: pruning may delete the source.
        let bytes = tokio::fs::read(&source).await?;
        ensure_sqlite(&bytes, name)?;
        self.replace_primary(bytes, max_backups).await
    }

    /// Replace the primary file with an uploaded database.
    pub async fn restore_from_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        max_backups: u32,
    ) -> DbResult<BackupOutcome> {
        if file_name.is_empty() {
            return Err(DbError::Validation("No file selected".to_string()));
        }
        if !file_name.ends_with(BACKUP_SUFFIX) {
            return Err(DbError::Validation(
                "Please upload a .db file".to_string(),
            ));
        }
        ensure_sqlite(bytes, file_name)?;
        self.replace_primary(bytes.to_vec(), max_backups).await
    }

    async fn replace_primary(&self, bytes: Vec<u8>, max_backups: u32) -> DbResult<BackupOutcome> {
        let safety = {
            let _exclusive = self.file_lock.write().await;
            let store = self.backups.clone();
            let primary = self.db_path.clone();
            tokio::task::spawn_blocking(move || {
                let safety = store.create_from(&primary, max_backups);
                std::fs::write(&primary, bytes)?;
                Ok::<BackupOutcome, DbError>(safety)
            })
            .await
            .map_err(|e| DbError::Io(std::io::Error::other(e)))??
        };
        info!(path = %self.db_path.display(), "Database restored");

        // Older files may lack newer tables or indexes.
        self.run_migrations().await?;
        Ok(safety)
    }

    /// Take a safety backup, then delete every progress row and completion
    /// marker. Returns the safety backup's outcome.
    pub async fn reset_all_data(&self, max_backups: u32) -> DbResult<BackupOutcome> {
        let _exclusive = self.file_lock.write().await;
        let safety = self.backup_blocking(max_backups).await;

        let mut conn = self.try_open().await?;
        clear_tables(&mut conn).await?;
        sqlx::Connection::close(conn).await?;

        info!("All progress data reset");
        Ok(safety)
    }

    /// Run `BackupStore::create_from` on the blocking pool. The caller holds
    /// the exclusive lock.
    async fn backup_blocking(&self, max_backups: u32) -> BackupOutcome {
        let store = self.backups.clone();
        let primary = self.db_path.clone();
        tokio::task::spawn_blocking(move || store.create_from(&primary, max_backups))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Backup task failed");
                BackupOutcome::Failed(e.to_string())
            })
    }

    /// Run `BackupStore::restore_latest_to` on the blocking pool. The caller
    /// holds the exclusive lock.
    pub(crate) async fn restore_latest_blocking(&self) -> Option<PathBuf> {
        let store = self.backups.clone();
        let primary = self.db_path.clone();
        tokio::task::spawn_blocking(move || store.restore_latest_to(&primary))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Restore task failed");
                None
            })
    }
}
