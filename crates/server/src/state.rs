// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use peekaboo_core::paths::AppPaths;
use peekaboo_core::{Curriculum, SettingsStore};
use peekaboo_db::{Database, DbResult};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Progress rows and backup files.
    pub db: Database,
    /// The settings document. Re-read on every request.
    pub settings: SettingsStore,
    /// The training plan served by the session and export routes.
    pub curriculum: &'static Curriculum,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(db: Database, settings: SettingsStore) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            settings,
            curriculum: Curriculum::builtin(),
        })
    }

    /// Open the database and settings laid out by `paths`.
    pub async fn open(paths: &AppPaths) -> DbResult<Arc<Self>> {
        let db = Database::open_paths(paths).await?;
        Ok(Self::new(db, SettingsStore::new(&paths.settings_path)))
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
