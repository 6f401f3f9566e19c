//! Baseline estimation from historical silence-period usage.
//!
//! A baseline is the expected normal usage for a (building, resource) pair
//! during silence. Two interchangeable strategies back the estimator:
//!
//! - [`MeanBaseline`]: arithmetic mean of silence usage, refit every cycle
//!   from the history accumulated so far.
//! - [`LearnedBaseline`]: a robust location estimate fit once over the full
//!   historical silence set, then frozen for the session.
//!
//! Both report `None` rather than a numeric default when a pair has no
//! qualifying history; the anomaly detector defers judgment on `None`.

use crate::ingest::types::{Resource, TaggedReading};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::HashMap;

/// Which baseline strategy backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaselineStrategy {
    /// Per-cycle arithmetic mean of historical silence usage
    #[default]
    Mean,
    /// Frozen robust estimate fit once from the full historical silence set
    Learned,
}

impl std::fmt::Display for BaselineStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineStrategy::Mean => f.write_str("mean"),
            BaselineStrategy::Learned => f.write_str("learned"),
        }
    }
}

/// Expected normal silence usage per (building, resource) pair.
pub trait BaselineEstimator {
    /// Baseline usage for the pair, or `None` when no historical silence
    /// data exists for it yet.
    fn estimate(&self, building: &str, resource: &Resource) -> Option<f64>;
}

/// Lookup key for a baseline entry.
type PairKey = (String, Resource);

/// Group silence-tagged usage samples by (building, resource).
fn silence_samples(history: &[TaggedReading]) -> HashMap<PairKey, Vec<f64>> {
    let mut groups: HashMap<PairKey, Vec<f64>> = HashMap::new();
    for tagged in history.iter().filter(|t| t.is_silence) {
        groups
            .entry((tagged.reading.building.clone(), tagged.reading.resource.clone()))
            .or_default()
            .push(tagged.reading.usage);
    }
    groups
}

/// Arithmetic-mean baseline, refit from history every cycle.
#[derive(Debug, Clone, Default)]
pub struct MeanBaseline {
    entries: HashMap<PairKey, f64>,
}

impl MeanBaseline {
    /// Fit from silence-tagged history. The caller is responsible for
    /// passing only readings strictly earlier than the current run time.
    pub fn fit(history: &[TaggedReading]) -> Self {
        let entries = silence_samples(history)
            .into_iter()
            .map(|(key, samples)| {
                let mean = samples.iter().sum::<f64>() / samples.len() as f64;
                (key, mean)
            })
            .collect();
        Self { entries }
    }

    /// Number of (building, resource) pairs with a known baseline.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BaselineEstimator for MeanBaseline {
    fn estimate(&self, building: &str, resource: &Resource) -> Option<f64> {
        self.entries
            .get(&(building.to_string(), resource.clone()))
            .copied()
    }
}

/// Minimum samples before the trimmed estimate is preferred over the median.
const TRIM_MIN_SAMPLES: usize = 5;

/// Frozen learned baseline.
///
/// Fit once at session start: per pair, silence samples outside the
/// [p10, p90] band are dropped and the remainder averaged, which keeps the
/// estimate near the mean while shrugging off occasional spikes in the
/// training history. Small groups fall back to the plain median.
#[derive(Debug, Clone, Default)]
pub struct LearnedBaseline {
    entries: HashMap<PairKey, f64>,
}

impl LearnedBaseline {
    /// Fit from the full historical silence-tagged dataset. Not retrained
    /// per cycle; the fitted values are frozen for the session.
    pub fn fit(history: &[TaggedReading]) -> Self {
        let entries = silence_samples(history)
            .into_iter()
            .map(|(key, samples)| (key, robust_location(samples)))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BaselineEstimator for LearnedBaseline {
    fn estimate(&self, building: &str, resource: &Resource) -> Option<f64> {
        self.entries
            .get(&(building.to_string(), resource.clone()))
            .copied()
    }
}

/// Percentile-trimmed mean with a median fallback for small groups.
fn robust_location(samples: Vec<f64>) -> f64 {
    let mut data = Data::new(samples.clone());

    if samples.len() < TRIM_MIN_SAMPLES {
        return data.median();
    }

    let low = data.percentile(10);
    let high = data.percentile(90);
    let kept: Vec<f64> = samples
        .into_iter()
        .filter(|v| *v >= low && *v <= high)
        .collect();

    if kept.is_empty() {
        data.median()
    } else {
        kept.iter().sum::<f64>() / kept.len() as f64
    }
}

/// A strategy-selected estimator snapshot for one cycle.
///
/// Holds whichever concrete estimator the session is running with; treated
/// as read-only for the duration of the cycle.
pub enum BaselineSnapshot {
    Mean(MeanBaseline),
    Learned(LearnedBaseline),
}

impl BaselineEstimator for BaselineSnapshot {
    fn estimate(&self, building: &str, resource: &Resource) -> Option<f64> {
        match self {
            BaselineSnapshot::Mean(m) => m.estimate(building, resource),
            BaselineSnapshot::Learned(l) => l.estimate(building, resource),
        }
    }
}
