// crates/core/src/lib.rs
//! Domain types shared by the peekaboo crates: the training curriculum,
//! progress records, rating statistics, settings, and export formatting.

pub mod csv;
pub mod curriculum;
pub mod error;
pub mod paths;
pub mod program;
pub mod settings;
pub mod stats;
pub mod types;

pub use curriculum::*;
pub use error::*;
pub use settings::*;
pub use stats::*;
pub use types::*;

/// Human-readable application name, reported by the metadata endpoint.
pub const APP_NAME: &str = "Peek-a-Boo Boxing Tracker";
