//! Centralized path functions for all app storage locations.
//!
//! Single source of truth for where the database, settings file and backups
//! live, so no crate joins file names onto the data dir by hand.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "PEEKABOO_DATA_DIR";

/// Primary SQLite database file name.
pub const DB_FILE_NAME: &str = "peekaboo.db";

/// Settings document file name.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Backup directory name, relative to the data dir.
pub const BACKUP_DIR_NAME: &str = "backup";

/// App data root: `$PEEKABOO_DATA_DIR`, else `~/.local/share/peekaboo/` (Linux)
/// or `~/Library/Application Support/peekaboo/` (macOS).
pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::data_local_dir().map(|d| d.join("peekaboo"))
}

/// Resolved storage locations for one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub settings_path: PathBuf,
    pub backup_dir: PathBuf,
}

impl AppPaths {
    /// Lay out the storage files under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            settings_path: data_dir.join(SETTINGS_FILE_NAME),
            backup_dir: data_dir.join(BACKUP_DIR_NAME),
            data_dir,
        }
    }

    /// Paths under [`app_data_dir`], or `None` when no home directory exists.
    pub fn resolve_default() -> Option<Self> {
        app_data_dir().map(Self::new)
    }

    /// Create the data and backup directories if they don't exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.backup_dir)?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
