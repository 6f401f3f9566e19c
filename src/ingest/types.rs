//! Domain value types for meter readings and activity schedules.
//!
//! Readings and schedule rules are loaded once per session and never mutated
//! afterwards; everything derived from them (silence tags, anomaly records)
//! lives in new collections.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The utility being metered.
///
/// Water and electricity are the resources the thresholds are tuned for;
/// anything else round-trips through `Other` and falls back to the default
/// threshold at detection time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resource {
    Water,
    Electricity,
    Other(String),
}

impl Resource {
    /// Lowercase string form, matching the source CSV vocabulary.
    pub fn as_str(&self) -> &str {
        match self {
            Resource::Water => "water",
            Resource::Electricity => "electricity",
            Resource::Other(name) => name,
        }
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "water" => Resource::Water,
            "electricity" => Resource::Electricity,
            _ => Resource::Other(s.trim().to_lowercase()),
        }
    }
}

impl From<Resource> for String {
    fn from(r: Resource) -> Self {
        r.as_str().to_string()
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single utility-meter reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// When the meter was sampled
    pub timestamp: DateTime<Utc>,
    /// Building the meter belongs to
    pub building: String,
    /// Utility being metered
    pub resource: Resource,
    /// Metered usage for the sampling interval (non-negative)
    pub usage: f64,
}

impl Reading {
    pub fn new(
        timestamp: DateTime<Utc>,
        building: impl Into<String>,
        resource: Resource,
        usage: f64,
    ) -> Self {
        Self {
            timestamp,
            building: building.into(),
            resource,
            usage,
        }
    }
}

/// Declared expectation of building activity for a schedule rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedActivity {
    Yes,
    No,
}

impl ExpectedActivity {
    /// Parse the schedule CSV's `YES`/`NO` flag.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "YES" => Some(ExpectedActivity::Yes),
            "NO" => Some(ExpectedActivity::No),
            _ => None,
        }
    }
}

/// A declared activity window for one building.
///
/// Times are time-of-day only. A rule with `expected_activity = No` defines a
/// silence window; `start_time > end_time` denotes an overnight window that
/// wraps across midnight (e.g. 22:00-06:00).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub building: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub expected_activity: ExpectedActivity,
}

impl ScheduleRule {
    /// A silence rule is one declaring the building inactive.
    pub fn is_silence_rule(&self) -> bool {
        self.expected_activity == ExpectedActivity::No
    }
}

/// A reading annotated with its silence classification.
///
/// Produced by [`crate::core::silence::tag_readings`]; the tag is derived,
/// never persisted on the reading itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedReading {
    #[serde(flatten)]
    pub reading: Reading,
    /// Whether the reading fell inside a declared silence window
    pub is_silence: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_parsing() {
        assert_eq!(Resource::from("water".to_string()), Resource::Water);
        assert_eq!(Resource::from(" Electricity ".to_string()), Resource::Electricity);
        assert_eq!(
            Resource::from("gas".to_string()),
            Resource::Other("gas".to_string())
        );
    }

    #[test]
    fn test_resource_round_trip() {
        let gas = Resource::from("gas".to_string());
        assert_eq!(String::from(gas), "gas");
        assert_eq!(String::from(Resource::Water), "water");
    }

    #[test]
    fn test_expected_activity_parsing() {
        assert_eq!(ExpectedActivity::parse("YES"), Some(ExpectedActivity::Yes));
        assert_eq!(ExpectedActivity::parse("no"), Some(ExpectedActivity::No));
        assert_eq!(ExpectedActivity::parse("maybe"), None);
    }

    #[test]
    fn test_silence_rule() {
        let rule = ScheduleRule {
            building: "Lab-A".to_string(),
            start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            expected_activity: ExpectedActivity::No,
        };
        assert!(rule.is_silence_rule());
    }
}
