//! CSV loading for usage logs and activity schedules.
//!
//! Both sources are loaded once per session. Malformed rows fail the load
//! immediately; the pipeline never starts on a partially-parsed schedule.
//!
//! Usage log columns: `timestamp,building,resource,usage`
//! Schedule columns:  `building,start_time,end_time,expected_activity`

use crate::ingest::types::{ExpectedActivity, Reading, Resource, ScheduleRule};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use std::path::Path;

/// Errors raised while loading the tabular sources.
#[derive(Debug)]
pub enum IngestError {
    /// Underlying file/CSV read failure
    IoError(String),
    /// A usage-log row that could not be parsed
    MalformedReading(String),
    /// A schedule row with an unparseable time or activity flag
    MalformedSchedule(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::IoError(e) => write!(f, "IO error: {e}"),
            IngestError::MalformedReading(e) => write!(f, "Malformed reading: {e}"),
            IngestError::MalformedSchedule(e) => write!(f, "Malformed schedule: {e}"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Raw usage-log row as it appears in the CSV.
#[derive(Debug, serde::Deserialize)]
struct ReadingRow {
    timestamp: String,
    building: String,
    resource: String,
    usage: f64,
}

/// Raw schedule row as it appears in the CSV.
#[derive(Debug, serde::Deserialize)]
struct ScheduleRow {
    building: String,
    start_time: String,
    end_time: String,
    expected_activity: String,
}

/// Load meter usage logs from a CSV file.
///
/// Timestamps accept either `YYYY-MM-DD HH:MM:SS` or RFC 3339 and are
/// interpreted as UTC. Negative usage values are rejected.
pub fn load_usage_logs(path: impl AsRef<Path>) -> Result<Vec<Reading>, IngestError> {
    let mut reader =
        csv::Reader::from_path(path.as_ref()).map_err(|e| IngestError::IoError(e.to_string()))?;

    let mut readings = Vec::new();
    for (line, row) in reader.deserialize::<ReadingRow>().enumerate() {
        let row = row.map_err(|e| IngestError::MalformedReading(format!("row {}: {e}", line + 1)))?;

        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            IngestError::MalformedReading(format!(
                "row {}: unparseable timestamp '{}'",
                line + 1,
                row.timestamp
            ))
        })?;

        if row.usage < 0.0 {
            return Err(IngestError::MalformedReading(format!(
                "row {}: negative usage {}",
                line + 1,
                row.usage
            )));
        }

        readings.push(Reading {
            timestamp,
            building: row.building.trim().to_string(),
            resource: Resource::from(row.resource),
            usage: row.usage,
        });
    }

    Ok(readings)
}

/// Load building activity schedules from a CSV file.
///
/// Times are `HH:MM`; the activity flag must be `YES` or `NO`. Any other
/// value fails the load.
pub fn load_schedule(path: impl AsRef<Path>) -> Result<Vec<ScheduleRule>, IngestError> {
    let mut reader =
        csv::Reader::from_path(path.as_ref()).map_err(|e| IngestError::IoError(e.to_string()))?;

    let mut rules = Vec::new();
    for (line, row) in reader.deserialize::<ScheduleRow>().enumerate() {
        let row =
            row.map_err(|e| IngestError::MalformedSchedule(format!("row {}: {e}", line + 1)))?;

        let start_time = parse_time_of_day(&row.start_time).ok_or_else(|| {
            IngestError::MalformedSchedule(format!(
                "row {}: unparseable start_time '{}'",
                line + 1,
                row.start_time
            ))
        })?;
        let end_time = parse_time_of_day(&row.end_time).ok_or_else(|| {
            IngestError::MalformedSchedule(format!(
                "row {}: unparseable end_time '{}'",
                line + 1,
                row.end_time
            ))
        })?;
        let expected_activity = ExpectedActivity::parse(&row.expected_activity).ok_or_else(|| {
            IngestError::MalformedSchedule(format!(
                "row {}: expected_activity must be YES or NO, got '{}'",
                line + 1,
                row.expected_activity
            ))
        })?;

        rules.push(ScheduleRule {
            building: row.building.trim().to_string(),
            start_time,
            end_time,
            expected_activity,
        });
    }

    Ok(rules)
}

/// Parse a usage-log timestamp as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an `HH:MM` time-of-day.
fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_usage_logs() {
        let path = write_temp(
            "shadow-waste-usage-ok.csv",
            "timestamp,building,resource,usage\n\
             2026-02-05 00:00:00,Lab-A,water,12.5\n\
             2026-02-05 00:30:00,Lab-A,electricity,30.0\n",
        );

        let readings = load_usage_logs(&path).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].building, "Lab-A");
        assert_eq!(readings[0].resource, Resource::Water);
        assert_eq!(readings[0].usage, 12.5);
    }

    #[test]
    fn test_load_usage_logs_rejects_bad_timestamp() {
        let path = write_temp(
            "shadow-waste-usage-bad-ts.csv",
            "timestamp,building,resource,usage\nnot-a-time,Lab-A,water,1.0\n",
        );

        let err = load_usage_logs(&path).unwrap_err();
        assert!(matches!(err, IngestError::MalformedReading(_)));
    }

    #[test]
    fn test_load_usage_logs_rejects_negative_usage() {
        let path = write_temp(
            "shadow-waste-usage-neg.csv",
            "timestamp,building,resource,usage\n2026-02-05 00:00:00,Lab-A,water,-3.0\n",
        );

        let err = load_usage_logs(&path).unwrap_err();
        assert!(matches!(err, IngestError::MalformedReading(_)));
    }

    #[test]
    fn test_load_schedule() {
        let path = write_temp(
            "shadow-waste-schedule-ok.csv",
            "building,start_time,end_time,expected_activity\n\
             Lab-A,22:00,06:00,NO\n\
             Library,08:00,20:00,YES\n",
        );

        let rules = load_schedule(&path).unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules[0].is_silence_rule());
        assert_eq!(rules[0].start_time, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert!(!rules[1].is_silence_rule());
    }

    #[test]
    fn test_load_schedule_fails_fast_on_bad_flag() {
        let path = write_temp(
            "shadow-waste-schedule-bad-flag.csv",
            "building,start_time,end_time,expected_activity\nLab-A,22:00,06:00,MAYBE\n",
        );

        let err = load_schedule(&path).unwrap_err();
        assert!(matches!(err, IngestError::MalformedSchedule(_)));
    }

    #[test]
    fn test_load_schedule_fails_fast_on_bad_time() {
        let path = write_temp(
            "shadow-waste-schedule-bad-time.csv",
            "building,start_time,end_time,expected_activity\nLab-A,25:77,06:00,NO\n",
        );

        let err = load_schedule(&path).unwrap_err();
        assert!(matches!(err, IngestError::MalformedSchedule(_)));
    }
}
