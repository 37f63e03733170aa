// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when persisting or validating settings.
///
/// Loading never produces one of these: an unreadable settings file falls
/// back to the defaults.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error writing settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid setting '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl SettingsError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Errors produced while rendering the calendar or program exports.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("Invalid training time '{0}', expected HH:MM")]
    InvalidTrainingTime(String),
}
