//! Run accounting for a monitoring session.
//!
//! The driver keeps simple counters describing what each run did. They feed
//! the end-of-run summary and are reset together with the rest of the
//! session state on a strategy switch.

use serde::{Deserialize, Serialize};

/// Counters accumulated across the cycles of one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Cycles that processed a non-empty window
    pub cycles_run: u64,
    /// Cycles skipped because their window held no readings
    pub empty_windows: u64,
    /// Readings classified across all cycles
    pub readings_processed: u64,
    /// Of those, readings that fell inside a silence window
    pub silence_readings: u64,
    /// Readings flagged as shadow waste
    pub anomalies_flagged: u64,
    /// Decisions issued for flagged anomalies
    pub decisions_issued: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed cycle's output.
    pub fn record_cycle(&mut self, readings: usize, silence: usize, anomalies: usize, decisions: usize) {
        self.cycles_run += 1;
        self.readings_processed += readings as u64;
        self.silence_readings += silence as u64;
        self.anomalies_flagged += anomalies as u64;
        self.decisions_issued += decisions as u64;
    }

    /// Record a cycle skipped for lack of data.
    pub fn record_empty_window(&mut self) {
        self.empty_windows += 1;
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Human-readable summary block for end-of-run display.
    pub fn summary(&self) -> String {
        format!(
            "Run Statistics:\n\
             - Cycles run: {}\n\
             - Empty windows skipped: {}\n\
             - Readings processed: {}\n\
             - Silence-period readings: {}\n\
             - Anomalies flagged: {}\n\
             - Decisions issued: {}",
            self.cycles_run,
            self.empty_windows,
            self.readings_processed,
            self.silence_readings,
            self.anomalies_flagged,
            self.decisions_issued
        )
    }
}
