//! Threshold-based anomaly detection over silence-tagged readings.
//!
//! A reading is flagged only when it is a silence-period reading, a baseline
//! is known for its (building, resource) pair, and usage strictly exceeds
//! the baseline multiplied by the resource's threshold.

use crate::core::baseline::BaselineEstimator;
use crate::ingest::types::{Resource, TaggedReading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Threshold multiplier for water usage.
const WATER_THRESHOLD: f64 = 1.5;
/// Threshold multiplier for electricity usage.
const ELECTRICITY_THRESHOLD: f64 = 1.3;
/// Fallback multiplier for resources without a tuned threshold.
const DEFAULT_THRESHOLD: f64 = 1.5;

/// Threshold multiplier for a resource.
///
/// Unknown resources fall back to the default; observable as a warning,
/// never fatal.
pub fn threshold_for(resource: &Resource) -> f64 {
    match resource {
        Resource::Water => WATER_THRESHOLD,
        Resource::Electricity => ELECTRICITY_THRESHOLD,
        Resource::Other(name) => {
            warn!(resource = %name, threshold = DEFAULT_THRESHOLD, "no tuned threshold for resource, using default");
            DEFAULT_THRESHOLD
        }
    }
}

/// A tagged reading with its definitive anomaly judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRecord {
    #[serde(flatten)]
    pub tagged: TaggedReading,
    /// Definitive judgment; never deferred
    pub is_anomaly: bool,
    /// Baseline resolved for the pair, when one was known
    pub baseline_usage: Option<f64>,
    /// Reference timestamp of the cycle that produced this record
    pub run_time: DateTime<Utc>,
}

/// Annotate every reading in the cycle window with an anomaly judgment.
///
/// Active-period readings are never flagged. Silence readings without a
/// known baseline are deferred (not flagged, not an error). The estimator
/// snapshot is read-only for the duration of the pass.
pub fn detect_shadow_waste(
    window: &[TaggedReading],
    baselines: &dyn BaselineEstimator,
    run_time: DateTime<Utc>,
) -> Vec<AnomalyRecord> {
    window
        .iter()
        .map(|tagged| {
            let baseline_usage = if tagged.is_silence {
                baselines.estimate(&tagged.reading.building, &tagged.reading.resource)
            } else {
                None
            };

            let is_anomaly = match (tagged.is_silence, baseline_usage) {
                (true, Some(baseline)) => {
                    let exceeded =
                        tagged.reading.usage > baseline * threshold_for(&tagged.reading.resource);
                    if exceeded {
                        info!(
                            building = %tagged.reading.building,
                            resource = %tagged.reading.resource,
                            usage = tagged.reading.usage,
                            baseline,
                            "anomaly detected during silence window"
                        );
                    }
                    exceeded
                }
                _ => false,
            };

            AnomalyRecord {
                tagged: tagged.clone(),
                is_anomaly,
                baseline_usage,
                run_time,
            }
        })
        .collect()
}
