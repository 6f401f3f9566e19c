//! Decision synthesis for flagged anomalies.
//!
//! Every anomaly becomes one structured, human-actionable decision built from
//! a fixed resource -> cause/action template table. Generation is
//! deterministic and side-effect free.

use crate::core::anomaly::AnomalyRecord;
use crate::ingest::types::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A human-actionable record for one flagged anomaly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub building: String,
    pub resource: Resource,
    /// Short description naming the resource and the nature of the excess
    pub detected_issue: String,
    /// The reading's usage
    pub observed_usage: f64,
    /// Baseline silence usage the reading was compared against
    pub normal_silence_usage: f64,
    /// Confidence in the judgment, monotonic in usage/baseline
    pub confidence_percent: f64,
    pub likely_cause: String,
    pub recommended_action: String,
    /// Sequence number of the cycle that produced this decision
    pub cycle: u32,
    /// Reference timestamp of that cycle
    pub run_time: DateTime<Utc>,
}

/// Cause/action template for one resource.
struct DecisionTemplate {
    likely_cause: &'static str,
    recommended_action: &'static str,
}

fn template_for(resource: &Resource) -> DecisionTemplate {
    match resource {
        Resource::Water => DecisionTemplate {
            likely_cause: "Leaking fixture, running tap, or valve left open",
            recommended_action: "Dispatch maintenance to inspect plumbing and shut off supply if needed",
        },
        Resource::Electricity => DecisionTemplate {
            likely_cause: "Equipment, lighting, or HVAC left running after hours",
            recommended_action: "Have staff power down unattended equipment and verify HVAC scheduling",
        },
        Resource::Other(_) => DecisionTemplate {
            likely_cause: "Unattended consumption during a scheduled inactive period",
            recommended_action: "Send staff to inspect the building and identify the consuming device",
        },
    }
}

/// Confidence curve over the usage/baseline ratio.
///
/// Strictly monotonic in the ratio and bounded in (60, 100); saturates
/// toward 100 for extreme excesses. Rounded to one decimal.
fn confidence_percent(ratio: f64) -> f64 {
    let raw = 60.0 + 40.0 * (1.0 - 1.0 / ratio);
    (raw * 10.0).round() / 10.0
}

/// Generate the decision for one flagged anomaly.
///
/// Must only be called for records with `is_anomaly = true` and a known
/// baseline; anything else is a programming error on the caller's side.
pub fn generate_decision(record: &AnomalyRecord, cycle: u32) -> Decision {
    debug_assert!(record.is_anomaly, "decision requested for non-anomalous row");

    let reading = &record.tagged.reading;
    let baseline = record.baseline_usage.unwrap_or(reading.usage);
    let ratio = if baseline > 0.0 {
        reading.usage / baseline
    } else {
        // Zero baseline with positive usage is an unbounded excess
        f64::INFINITY
    };

    let template = template_for(&reading.resource);

    Decision {
        building: reading.building.clone(),
        resource: reading.resource.clone(),
        detected_issue: format!(
            "Excessive {} usage during scheduled silence",
            reading.resource
        ),
        observed_usage: reading.usage,
        normal_silence_usage: baseline,
        confidence_percent: confidence_percent(ratio),
        likely_cause: template.likely_cause.to_string(),
        recommended_action: template.recommended_action.to_string(),
        cycle,
        run_time: record.run_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Reading, TaggedReading};
    use chrono::TimeZone;

    fn record(resource: Resource, usage: f64, baseline: f64) -> AnomalyRecord {
        let run_time = Utc.with_ymd_and_hms(2026, 2, 5, 0, 30, 0).unwrap();
        AnomalyRecord {
            tagged: TaggedReading {
                reading: Reading::new(run_time, "Lab-A", resource, usage),
                is_silence: true,
            },
            is_anomaly: true,
            baseline_usage: Some(baseline),
            run_time,
        }
    }

    #[test]
    fn test_decision_fields() {
        let decision = generate_decision(&record(Resource::Water, 120.0, 40.0), 3);

        assert_eq!(decision.building, "Lab-A");
        assert_eq!(decision.resource, Resource::Water);
        assert_eq!(decision.observed_usage, 120.0);
        assert_eq!(decision.normal_silence_usage, 40.0);
        assert_eq!(decision.cycle, 3);
        assert!(decision.detected_issue.contains("water"));
        assert!(decision.likely_cause.to_lowercase().contains("leak"));
    }

    #[test]
    fn test_confidence_is_monotonic_in_ratio() {
        let ratios = [1.31, 1.5, 2.0, 3.0, 10.0, 100.0];
        let confidences: Vec<f64> = ratios.iter().map(|&r| confidence_percent(r)).collect();

        for pair in confidences.windows(2) {
            assert!(pair[1] > pair[0], "confidence not increasing: {confidences:?}");
        }
    }

    #[test]
    fn test_confidence_saturates_below_100() {
        assert!(confidence_percent(1.5) > 60.0);
        assert!(confidence_percent(1_000_000.0) <= 100.0);
        assert!(confidence_percent(1_000_000.0) > 99.0);
    }

    #[test]
    fn test_confidence_is_deterministic() {
        let a = generate_decision(&record(Resource::Electricity, 26.0, 10.0), 1);
        let b = generate_decision(&record(Resource::Electricity, 26.0, 10.0), 1);
        assert_eq!(a.confidence_percent, b.confidence_percent);
    }

    #[test]
    fn test_templates_vary_by_resource() {
        let water = generate_decision(&record(Resource::Water, 120.0, 40.0), 1);
        let electricity = generate_decision(&record(Resource::Electricity, 26.0, 10.0), 1);
        let gas = generate_decision(&record(Resource::Other("gas".to_string()), 9.0, 3.0), 1);

        assert_ne!(water.likely_cause, electricity.likely_cause);
        assert_ne!(electricity.likely_cause, gas.likely_cause);
        assert!(gas.detected_issue.contains("gas"));
    }
}
