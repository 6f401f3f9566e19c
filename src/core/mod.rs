//! The shadow-waste detection pipeline.
//!
//! This module contains:
//! - Cycle-window extraction over the reading batch
//! - Silence classification against the activity schedule
//! - Baseline estimation (mean and learned strategies)
//! - Threshold-based anomaly detection
//! - Decision synthesis for flagged anomalies
//! - The cycle driver state machine tying them together

pub mod anomaly;
pub mod baseline;
pub mod decision;
pub mod driver;
pub mod silence;
pub mod windowing;

// Re-export commonly used types
pub use anomaly::{detect_shadow_waste, threshold_for, AnomalyRecord};
pub use baseline::{
    BaselineEstimator, BaselineSnapshot, BaselineStrategy, LearnedBaseline, MeanBaseline,
};
pub use decision::{generate_decision, Decision};
pub use driver::{CycleDriver, CycleOutcome, DEFAULT_CYCLE_MINUTES};
pub use silence::{is_time_in_window, tag_readings};
pub use windowing::{extract_window, CycleWindow};
