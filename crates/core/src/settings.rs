//! User settings persisted as a single JSON document.
//!
//! The effective settings are always the persisted document shallow-merged
//! over [`Settings::default`], so a file written by an older version (or
//! edited by hand) still yields the full key set.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::SettingsError;

/// Format of `training_time`.
pub const TRAINING_TIME_FORMAT: &str = "%H:%M";

/// All user-configurable options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Time of day training starts, `HH:MM`.
    pub training_time: String,
    /// IANA timezone name, informational only.
    pub timezone: String,
    pub reminder_enabled: bool,
    pub sound_enabled: bool,
    pub theme: String,
    /// Take a backup after every primary save.
    pub auto_backup: bool,
    /// Number of backup files retained.
    pub max_backups: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            training_time: "09:00".to_string(),
            timezone: "Africa/Lagos".to_string(),
            reminder_enabled: true,
            sound_enabled: true,
            theme: "light".to_string(),
            auto_backup: true,
            max_backups: 10,
        }
    }
}

impl Settings {
    /// The defaults as a JSON object, the base layer of every merge.
    pub fn default_table() -> Map<String, Value> {
        match serde_json::to_value(Settings::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Build settings from a persisted JSON document.
    ///
    /// Returns the defaults when the document is not an object. A value of
    /// the wrong type falls back to its default; the other keys still apply.
    pub fn from_persisted(persisted: &Value) -> Self {
        let Value::Object(overrides) = persisted else {
            warn!("Settings document is not a JSON object, using defaults");
            return Self::default();
        };

        let mut accepted = Self::default_table();
        for (key, value) in overrides {
            if !accepted.contains_key(key) {
                continue;
            }
            let mut candidate = accepted.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<Settings>(Value::Object(candidate.clone())) {
                Ok(_) => accepted = candidate,
                Err(e) => warn!(key = %key, error = %e, "Ignoring invalid settings value"),
            }
        }

        serde_json::from_value(Value::Object(accepted)).unwrap_or_default()
    }

    /// Parsed `training_time`, if well-formed.
    pub fn training_time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.training_time, TRAINING_TIME_FORMAT).ok()
    }

    /// Check values a user can submit through the settings form.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.training_time_of_day().is_none() {
            return Err(SettingsError::invalid(
                "training_time",
                format!("'{}' is not a valid HH:MM time", self.training_time),
            ));
        }
        if self.max_backups < 1 {
            return Err(SettingsError::invalid("max_backups", "must be at least 1"));
        }
        if self.theme.trim().is_empty() {
            return Err(SettingsError::invalid("theme", "must not be empty"));
        }
        Ok(())
    }
}

/// Shallow merge: every key of `overrides` replaces the same key of `defaults`.
pub fn merge(defaults: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Reads and writes the settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Effective settings. Never fails: a missing or broken file yields the
    /// defaults.
    pub fn load(&self) -> Settings {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Settings::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read settings, using defaults");
                return Settings::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(doc) => Settings::from_persisted(&doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed settings file, using defaults");
                Settings::default()
            }
        }
    }

    /// Overwrite the settings file with `settings`.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the defaults if no settings file exists yet.
    ///
    /// Returns `true` when a file was created.
    pub fn ensure_exists(&self) -> Result<bool, SettingsError> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&Settings::default())?;
        Ok(true)
    }
}
