/// Inline SQL migrations for the peekaboo database schema.
///
/// Table and column names match data files written by earlier releases, so
/// those files can be restored as-is. Every statement is idempotent because
/// restored files may predate the `_migrations` table.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: one row per logged workout
    r#"
CREATE TABLE IF NOT EXISTS progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    week INTEGER,
    day INTEGER,
    fluidity INTEGER,
    endurance INTEGER,
    power INTEGER,
    date TEXT,
    notes TEXT,
    duration INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    // Migration 2: completion markers, one per curriculum slot
    r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    week INTEGER,
    day INTEGER,
    completed_date TEXT,
    duration INTEGER,
    UNIQUE(week, day)
);
"#,
    // Migration 3: indexes
    r#"CREATE INDEX IF NOT EXISTS idx_progress_week_day ON progress(week, day);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_progress_date ON progress(date);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_week_day ON sessions(week, day);"#,
];
