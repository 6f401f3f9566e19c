//! Silence classification against the declared activity schedule.
//!
//! Each reading is tagged with whether it occurred inside a silence window
//! for its building. Tagging is a pure transform over the input slice:
//! identical inputs always produce identical tags, regardless of call order.

use crate::ingest::types::{Reading, ScheduleRule, TaggedReading};
use chrono::NaiveTime;

/// Wraparound-aware time-of-day containment.
///
/// Normal windows (`start <= end`) use an inclusive range check. Overnight
/// windows (`start > end`, e.g. 22:00-06:00) wrap midnight: the time matches
/// when it is at or after the start **or** at or before the end.
pub fn is_time_in_window(check: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= check && check <= end
    } else {
        check >= start || check <= end
    }
}

/// Tag each reading with its silence classification.
///
/// A reading is silence iff any `No` rule for its building contains its
/// time-of-day. Buildings with no declared inactivity window are always
/// treated as active.
pub fn tag_readings(readings: &[Reading], schedule: &[ScheduleRule]) -> Vec<TaggedReading> {
    readings
        .iter()
        .map(|reading| {
            let time_of_day = reading.timestamp.time();
            let is_silence = schedule
                .iter()
                .filter(|rule| rule.is_silence_rule() && rule.building == reading.building)
                .any(|rule| is_time_in_window(time_of_day, rule.start_time, rule.end_time));

            TaggedReading {
                reading: reading.clone(),
                is_silence,
            }
        })
        .collect()
}
