// crates/core/src/types.rs
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Format used for every `date` value written to the progress table.
///
/// Matches ISO-8601 with microseconds so dates sort lexicographically.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local time in [`DATE_FORMAT`].
pub fn now_iso() -> String {
    Local::now().naive_local().format(DATE_FORMAT).to_string()
}

/// One logged workout, as stored in the `progress` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: i64,
    pub week: i64,
    pub day: i64,
    pub fluidity: i64,
    pub endurance: i64,
    pub power: i64,
    pub date: String,
    pub notes: String,
    /// Minutes.
    pub duration: i64,
}

impl ProgressEntry {
    /// Chart label for the slot, e.g. `W2D3`.
    pub fn slot_label(&self) -> String {
        format!("W{}D{}", self.week, self.day)
    }
}

/// A workout to be written. `date` defaults to the time of insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgress {
    pub week: i64,
    pub day: i64,
    pub fluidity: i64,
    pub endurance: i64,
    pub power: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl NewProgress {
    pub fn new(week: i64, day: i64, fluidity: i64, endurance: i64, power: i64) -> Self {
        Self {
            week,
            day,
            fluidity,
            endurance,
            power,
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration = minutes;
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// The explicit date, or now.
    pub fn resolved_date(&self) -> String {
        self.date.clone().unwrap_or_else(now_iso)
    }

    /// Whether week and day are both present (non-zero).
    pub fn has_slot(&self) -> bool {
        self.week != 0 && self.day != 0
    }
}

/// Optional, AND-combined constraints on a progress query.
///
/// Date bounds compare against the stored ISO strings lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

impl ProgressFilter {
    pub fn week(week: i64) -> Self {
        Self {
            week: Some(week),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.week.is_none() && self.date_from.is_none() && self.date_to.is_none()
    }
}
