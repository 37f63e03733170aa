//! The fixed six-week training plan.
//!
//! The plan is embedded at compile time from `data/curriculum.json`. Slots
//! the plan does not define are simply absent; callers report them as
//! not found.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Weeks in the program.
pub const WEEKS: RangeInclusive<i64> = 1..=6;

/// Training days per week.
pub const DAYS: RangeInclusive<i64> = 1..=5;

/// Session length assumed when a slot's duration text has no leading number.
pub const FALLBACK_DURATION_MINUTES: i64 = 75;

const BUILTIN_JSON: &str = include_str!("../data/curriculum.json");

/// Content of one curriculum slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub focus: String,
    /// Free text such as `"60-75 minutes"`.
    pub duration: String,
    pub description: String,
    #[serde(default)]
    pub warmup: Vec<String>,
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub combos: Vec<String>,
    #[serde(default)]
    pub bagwork: Vec<String>,
    #[serde(default)]
    pub conditioning: Vec<String>,
    #[serde(default)]
    pub recovery: Vec<String>,
}

impl TrainingSession {
    /// Sections in program order, with their printed headings.
    pub fn sections(&self) -> [(&'static str, &[String]); 6] {
        [
            ("WARM-UP", self.warmup.as_slice()),
            ("TECHNICAL WORK", self.technical.as_slice()),
            ("COMBINATIONS", self.combos.as_slice()),
            ("BAG WORK", self.bagwork.as_slice()),
            ("CONDITIONING", self.conditioning.as_slice()),
            ("RECOVERY", self.recovery.as_slice()),
        ]
    }

    /// Leading number of the duration text: `"60-75 minutes"` gives 60.
    pub fn planned_minutes(&self) -> i64 {
        let digits: String = self
            .duration
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(FALLBACK_DURATION_MINUTES)
    }
}

/// A defined slot and its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
    pub week: i64,
    pub day: i64,
    pub session: &'a TrainingSession,
}

#[derive(Deserialize)]
struct CurriculumFile {
    weeks: Vec<WeekFile>,
}

#[derive(Deserialize)]
struct WeekFile {
    week: i64,
    days: Vec<DayFile>,
}

#[derive(Deserialize)]
struct DayFile {
    day: i64,
    #[serde(flatten)]
    session: TrainingSession,
}

/// The training plan, indexed by (week, day).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curriculum {
    slots: BTreeMap<(i64, i64), TrainingSession>,
}

impl Curriculum {
    /// Parse a plan document. Slots outside weeks 1–6 / days 1–5 are dropped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: CurriculumFile = serde_json::from_str(json)?;
        let slots = file
            .weeks
            .into_iter()
            .flat_map(|w| {
                let week = w.week;
                w.days.into_iter().map(move |d| ((week, d.day), d.session))
            })
            .filter(|((week, day), _)| WEEKS.contains(week) && DAYS.contains(day))
            .collect();
        Ok(Self { slots })
    }

    /// The plan shipped with the binary.
    pub fn builtin() -> &'static Curriculum {
        static BUILTIN: OnceLock<Curriculum> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Curriculum::from_json(BUILTIN_JSON).expect("embedded curriculum is valid JSON")
        })
    }

    pub fn slot(&self, week: i64, day: i64) -> Option<&TrainingSession> {
        self.slots.get(&(week, day))
    }

    /// Every defined slot, ordered by week then day.
    pub fn slots(&self) -> impl Iterator<Item = Slot<'_>> {
        self.slots.iter().map(|(&(week, day), session)| Slot { week, day, session })
    }

    /// Defined slots of one week, ordered by day.
    pub fn week(&self, week: i64) -> impl Iterator<Item = Slot<'_>> {
        self.slots
            .range((week, i64::MIN)..=(week, i64::MAX))
            .map(|(&(week, day), session)| Slot { week, day, session })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(duration: &str) -> TrainingSession {
        TrainingSession {
            focus: "Focus".to_string(),
            duration: duration.to_string(),
            description: "Desc".to_string(),
            warmup: vec![],
            technical: vec![],
            combos: vec![],
            bagwork: vec![],
            conditioning: vec![],
            recovery: vec![],
        }
    }

    #[test]
    fn test_builtin_parses() {
        let plan = Curriculum::builtin();
        assert!(!plan.is_empty());
        let first = plan.slot(1, 1).expect("week 1 day 1 is defined");
        assert_eq!(first.focus, "Rhythm & Form");
        assert_eq!(first.warmup.len(), 4);
    }

    #[test]
    fn test_missing_slot_is_none() {
        assert!(Curriculum::builtin().slot(6, 5).is_none());
        assert!(Curriculum::builtin().slot(0, 1).is_none());
    }

    #[test]
    fn test_slots_ordered_by_week_then_day() {
        let json = r#"{"weeks": [
            {"week": 2, "days": [{"day": 1, "focus": "b", "duration": "60", "description": ""}]},
            {"week": 1, "days": [
                {"day": 3, "focus": "a3", "duration": "60", "description": ""},
                {"day": 1, "focus": "a1", "duration": "60", "description": ""}
            ]}
        ]}"#;
        let plan = Curriculum::from_json(json).unwrap();
        let order: Vec<(i64, i64)> = plan.slots().map(|s| (s.week, s.day)).collect();
        assert_eq!(order, vec![(1, 1), (1, 3), (2, 1)]);

        let week1: Vec<i64> = plan.week(1).map(|s| s.day).collect();
        assert_eq!(week1, vec![1, 3]);
    }

    #[test]
    fn test_out_of_range_slots_dropped() {
        let json = r#"{"weeks": [
            {"week": 7, "days": [{"day": 1, "focus": "x", "duration": "60", "description": ""}]},
            {"week": 1, "days": [{"day": 6, "focus": "y", "duration": "60", "description": ""}]}
        ]}"#;
        assert!(Curriculum::from_json(json).unwrap().is_empty());
    }

    #[test]
    fn test_planned_minutes() {
        assert_eq!(session("60-75 minutes").planned_minutes(), 60);
        assert_eq!(session("45 minutes").planned_minutes(), 45);
        assert_eq!(session("about an hour").planned_minutes(), FALLBACK_DURATION_MINUTES);
        assert_eq!(session("").planned_minutes(), FALLBACK_DURATION_MINUTES);
    }
}
