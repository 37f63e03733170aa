// crates/db/src/queries/mod.rs
// Progress CRUD and dashboard statistics for the peekaboo SQLite database.

mod dashboard;
mod progress;

pub use dashboard::{DashboardStats, DatabaseInfo};
pub(crate) use progress::clear_tables;
