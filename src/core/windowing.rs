//! Cycle-window extraction over the pre-loaded reading batch.
//!
//! Each scheduling cycle looks at a fixed-length, half-open window of
//! readings ending at the cycle's run time. An empty window is a signal to
//! the driver, not an error.

use crate::ingest::types::Reading;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time window `[start, end)` belonging to one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWindow {
    /// Start of the window (inclusive)
    pub start: DateTime<Utc>,
    /// End of the window (exclusive); the cycle's run time
    pub end: DateTime<Utc>,
}

impl CycleWindow {
    /// Build the window ending at `run_time` with the given length.
    pub fn ending_at(run_time: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: run_time - length,
            end: run_time,
        }
    }

    /// Check if a timestamp falls within this window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Extract the readings belonging to one cycle window.
///
/// The input batch is borrowed and never mutated; only the selected rows are
/// cloned out. Input order is preserved.
pub fn extract_window(readings: &[Reading], window: CycleWindow) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| window.contains(r.timestamp))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Resource;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 5, h, m, 0).unwrap()
    }

    fn reading(h: u32, m: u32) -> Reading {
        Reading::new(ts(h, m), "Lab-A", Resource::Water, 10.0)
    }

    #[test]
    fn test_window_bounds() {
        let window = CycleWindow::ending_at(ts(10, 0), Duration::minutes(30));

        assert_eq!(window.start, ts(9, 30));
        assert!(window.contains(ts(9, 30)));
        assert!(window.contains(ts(9, 59)));
        assert!(!window.contains(ts(10, 0))); // end is exclusive
        assert!(!window.contains(ts(9, 29)));
    }

    #[test]
    fn test_extract_window() {
        let readings = vec![reading(9, 0), reading(9, 30), reading(9, 45), reading(10, 0)];
        let window = CycleWindow::ending_at(ts(10, 0), Duration::minutes(30));

        let extracted = extract_window(&readings, window);
        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted[0].timestamp, ts(9, 30));
        assert_eq!(extracted[1].timestamp, ts(9, 45));
        // Input is untouched
        assert_eq!(readings.len(), 4);
    }

    #[test]
    fn test_extract_window_empty() {
        let readings = vec![reading(9, 0)];
        let window = CycleWindow::ending_at(ts(12, 0), Duration::minutes(30));

        assert!(extract_window(&readings, window).is_empty());
    }
}
