//! Calendar and plain-text renderings of the training plan.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::csv::push_row;
use crate::curriculum::Curriculum;
use crate::error::ProgramError;
use crate::settings::TRAINING_TIME_FORMAT;

/// Header row of the calendar export, in the column order calendar apps expect.
pub const CALENDAR_HEADER: [&str; 7] = [
    "Subject",
    "Start Date",
    "Start Time",
    "End Date",
    "End Time",
    "Description",
    "Location",
];

const CALENDAR_DATE_FORMAT: &str = "%m/%d/%Y";
const CALENDAR_LOCATION: &str = "Training Location";
const PROGRAM_TITLE: &str = "PEEK-A-BOO BOXING TRAINING PROGRAM";
const RULE_WIDTH: usize = 80;

/// Render one calendar event per defined slot, scheduled from `start`.
///
/// Week `w` day `d` lands on `start + (w-1) weeks + (d-1) days`, beginning at
/// `training_time` and lasting the slot's planned minutes.
pub fn calendar_csv(
    plan: &Curriculum,
    training_time: &str,
    start: NaiveDate,
) -> Result<String, ProgramError> {
    let begins = NaiveTime::parse_from_str(training_time, TRAINING_TIME_FORMAT)
        .map_err(|_| ProgramError::InvalidTrainingTime(training_time.to_string()))?;

    let mut out = String::new();
    push_row(&mut out, &CALENDAR_HEADER);

    for slot in plan.slots() {
        let session = slot.session;
        let date = start + Duration::weeks(slot.week - 1) + Duration::days(slot.day - 1);
        let date_str = date.format(CALENDAR_DATE_FORMAT).to_string();
        // Wraps past midnight, same as the clock on the wall.
        let (ends, _) = begins.overflowing_add_signed(Duration::minutes(session.planned_minutes()));

        push_row(
            &mut out,
            &[
                format!(
                    "Peek-a-Boo Boxing W{}D{}: {}",
                    slot.week, slot.day, session.focus
                ),
                date_str.clone(),
                begins.format(TRAINING_TIME_FORMAT).to_string(),
                date_str,
                ends.format(TRAINING_TIME_FORMAT).to_string(),
                format!("{}\n\nFocus: {}", session.description, session.focus),
                CALENDAR_LOCATION.to_string(),
            ],
        );
    }

    Ok(out)
}

/// Render the whole plan as a printable text document.
pub fn program_text(plan: &Curriculum) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(PROGRAM_TITLE);
    out.push('\n');
    out.push_str(&heavy);
    out.push_str("\n\n");

    for week in crate::curriculum::WEEKS {
        out.push_str(&format!("\n{heavy}\nWEEK {week}\n{heavy}\n\n"));

        for slot in plan.week(week) {
            let session = slot.session;
            out.push_str(&format!("\nDAY {}: {}\n{light}\n", slot.day, session.focus));
            out.push_str(&format!("Duration: {}\n", session.duration));
            out.push_str(&format!("Description: {}\n\n", session.description));

            for (heading, items) in session.sections() {
                if items.is_empty() {
                    continue;
                }
                out.push_str(&format!("\n{heading}:\n"));
                for item in items {
                    out.push_str(&format!("  • {item}\n"));
                }
            }

            out.push('\n');
            out.push_str(&heavy);
            out.push('\n');
        }
    }

    out
}
