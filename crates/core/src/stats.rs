//! Rating aggregates over a set of progress entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ProgressEntry;

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, or 0 for an empty slice.
fn mean(sum: i64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Mean of each rating, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAverages {
    pub fluidity: f64,
    pub endurance: f64,
    pub power: f64,
}

/// Averages restricted to one week's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub fluidity: f64,
    pub endurance: f64,
    pub power: f64,
    pub sessions: usize,
}

/// Summary statistics shown on the progress page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub averages: RatingAverages,
    /// Minutes.
    pub total_duration: i64,
    pub total_sessions: usize,
    /// Keyed by week number, ascending.
    pub weekly: BTreeMap<i64, WeekSummary>,
}

#[derive(Default)]
struct Totals {
    fluidity: i64,
    endurance: i64,
    power: i64,
    count: usize,
}

impl Totals {
    fn add(&mut self, entry: &ProgressEntry) {
        self.fluidity += entry.fluidity;
        self.endurance += entry.endurance;
        self.power += entry.power;
        self.count += 1;
    }

    fn averages(&self) -> RatingAverages {
        RatingAverages {
            fluidity: round2(mean(self.fluidity, self.count)),
            endurance: round2(mean(self.endurance, self.count)),
            power: round2(mean(self.power, self.count)),
        }
    }
}

/// Compute overall and per-week rating means, total minutes and row count.
///
/// An empty slice yields all-zero averages and an empty weekly breakdown.
pub fn compute_aggregates(entries: &[ProgressEntry]) -> ProgressSummary {
    let mut overall = Totals::default();
    let mut by_week: BTreeMap<i64, Totals> = BTreeMap::new();
    let mut total_duration = 0i64;

    for entry in entries {
        overall.add(entry);
        by_week.entry(entry.week).or_default().add(entry);
        total_duration += entry.duration;
    }

    let weekly = by_week
        .into_iter()
        .map(|(week, totals)| {
            let avg = totals.averages();
            (
                week,
                WeekSummary {
                    fluidity: avg.fluidity,
                    endurance: avg.endurance,
                    power: avg.power,
                    sessions: totals.count,
                },
            )
        })
        .collect();

    ProgressSummary {
        averages: overall.averages(),
        total_duration,
        total_sessions: overall.count,
        weekly,
    }
}

/// Parallel series for the progress chart, one point per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub fluidity: Vec<i64>,
    pub endurance: Vec<i64>,
    pub power: Vec<i64>,
    pub dates: Vec<String>,
}

impl ChartSeries {
    pub fn from_entries(entries: &[ProgressEntry]) -> Self {
        let mut series = Self::default();
        for entry in entries {
            series.labels.push(entry.slot_label());
            series.fluidity.push(entry.fluidity);
            series.endurance.push(entry.endurance);
            series.power.push(entry.power);
            series.dates.push(entry.date.clone());
        }
        series
    }
}
