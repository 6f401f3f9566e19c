//! The cycle driver: a small state machine over the pre-loaded batch.
//!
//! Each invocation advances the session's time cursor by one fixed-length
//! cycle, runs the pipeline over the readings in that window, and appends
//! the resulting anomaly records and decisions to the session history. The
//! driver owns all mutable session state; nothing lives in globals.

use crate::core::anomaly::{detect_shadow_waste, AnomalyRecord};
use crate::core::baseline::{
    BaselineSnapshot, BaselineStrategy, LearnedBaseline, MeanBaseline,
};
use crate::core::decision::{generate_decision, Decision};
use crate::core::silence::tag_readings;
use crate::core::windowing::{extract_window, CycleWindow};
use crate::ingest::types::{Reading, ScheduleRule};
use crate::stats::RunStats;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default cycle and window length in minutes.
pub const DEFAULT_CYCLE_MINUTES: i64 = 30;

/// Outcome of driving one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Window held readings; the pipeline ran and history grew
    Ready {
        run_time: DateTime<Utc>,
        readings: usize,
        anomalies: usize,
    },
    /// Window was empty; cursor advanced, no output
    NoData { run_time: DateTime<Utc> },
    /// Cursor is past the end of the data; terminal
    Exhausted,
}

/// Drives repeated fixed-length cycles over a pre-loaded reading batch.
///
/// Readings and schedule rules are read-only for the driver's lifetime.
/// The cursor starts one cycle after the earliest reading and the session
/// ends once it passes the latest reading.
pub struct CycleDriver {
    readings: Vec<Reading>,
    schedule: Vec<ScheduleRule>,
    cycle_length: Duration,
    strategy: BaselineStrategy,
    /// Frozen model; present only under the learned strategy
    learned: Option<LearnedBaseline>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    current_time: DateTime<Utc>,
    cycle_count: u32,
    anomaly_history: Vec<AnomalyRecord>,
    decision_history: Vec<Decision>,
    stats: RunStats,
}

impl CycleDriver {
    /// Create a driver with the default 30-minute cycle length.
    pub fn new(
        readings: Vec<Reading>,
        schedule: Vec<ScheduleRule>,
        strategy: BaselineStrategy,
    ) -> Self {
        Self::with_cycle_length(
            readings,
            schedule,
            strategy,
            Duration::minutes(DEFAULT_CYCLE_MINUTES),
        )
    }

    /// Create a driver with an explicit cycle length.
    pub fn with_cycle_length(
        mut readings: Vec<Reading>,
        schedule: Vec<ScheduleRule>,
        strategy: BaselineStrategy,
        cycle_length: Duration,
    ) -> Self {
        readings.sort_by_key(|r| r.timestamp);

        // An empty batch leaves the session exhausted from the start.
        let (start_time, end_time) = match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => (first.timestamp + cycle_length, last.timestamp),
            _ => (
                DateTime::<Utc>::UNIX_EPOCH + cycle_length,
                DateTime::<Utc>::UNIX_EPOCH,
            ),
        };

        let mut driver = Self {
            readings,
            schedule,
            cycle_length,
            strategy,
            learned: None,
            start_time,
            end_time,
            current_time: start_time,
            cycle_count: 0,
            anomaly_history: Vec::new(),
            decision_history: Vec::new(),
            stats: RunStats::new(),
        };
        driver.fit_learned_if_needed();
        driver
    }

    /// Drive one cycle of the pipeline.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        if self.current_time > self.end_time {
            return CycleOutcome::Exhausted;
        }

        let run_time = self.current_time;
        let window = CycleWindow::ending_at(run_time, self.cycle_length);
        let window_readings = extract_window(&self.readings, window);

        if window_readings.is_empty() {
            debug!(%run_time, "empty window, advancing cursor");
            self.stats.record_empty_window();
            self.current_time += self.cycle_length;
            return CycleOutcome::NoData { run_time };
        }

        let tagged = tag_readings(&window_readings, &self.schedule);
        let baselines = self.baseline_snapshot(run_time);
        let records = detect_shadow_waste(&tagged, &baselines, run_time);

        self.cycle_count += 1;
        let decisions: Vec<Decision> = records
            .iter()
            .filter(|r| r.is_anomaly)
            .map(|r| generate_decision(r, self.cycle_count))
            .collect();

        let silence = records.iter().filter(|r| r.tagged.is_silence).count();
        let anomalies = decisions.len();
        self.stats
            .record_cycle(records.len(), silence, anomalies, decisions.len());

        let readings = records.len();
        self.anomaly_history.extend(records);
        self.decision_history.extend(decisions);
        self.current_time += self.cycle_length;

        CycleOutcome::Ready {
            run_time,
            readings,
            anomalies,
        }
    }

    /// Drive cycles until exhaustion, or until `max_cycles` windows with
    /// data have been processed. Returns the number of data cycles run.
    pub fn run_to_exhaustion(&mut self, max_cycles: Option<u32>) -> u32 {
        let mut ran = 0;
        loop {
            if let Some(max) = max_cycles {
                if ran >= max {
                    return ran;
                }
            }
            match self.run_cycle() {
                CycleOutcome::Ready { .. } => ran += 1,
                CycleOutcome::NoData { .. } => {}
                CycleOutcome::Exhausted => return ran,
            }
        }
    }

    /// Switch baseline strategy.
    ///
    /// This is a distinguished operation: accumulated anomaly and decision
    /// history is invalidated, counters reset, and the cursor returns to the
    /// start of the batch. It takes effect before the next cycle; there is
    /// no way to interleave it with one in flight.
    pub fn switch_strategy(&mut self, strategy: BaselineStrategy) {
        self.strategy = strategy;
        self.learned = None;
        self.fit_learned_if_needed();
        self.current_time = self.start_time;
        self.cycle_count = 0;
        self.anomaly_history.clear();
        self.decision_history.clear();
        self.stats.reset();
    }

    /// Anomaly stream: one record per reading per data cycle, append-only.
    pub fn anomaly_history(&self) -> &[AnomalyRecord] {
        &self.anomaly_history
    }

    /// Decision stream: one record per flagged anomaly, append-only.
    pub fn decision_history(&self) -> &[Decision] {
        &self.decision_history
    }

    /// Number of data cycles run so far this session.
    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// Active baseline strategy.
    pub fn strategy(&self) -> BaselineStrategy {
        self.strategy
    }

    /// The cursor's current reference time.
    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    /// Whether the cursor has moved past the end of the batch.
    pub fn is_exhausted(&self) -> bool {
        self.current_time > self.end_time
    }

    /// Run accounting for this session.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Build this cycle's read-only estimator snapshot.
    ///
    /// Mean: refit from silence-tagged history strictly before `run_time`.
    /// Learned: the frozen session-start model.
    fn baseline_snapshot(&self, run_time: DateTime<Utc>) -> BaselineSnapshot {
        match self.strategy {
            BaselineStrategy::Mean => {
                let historical: Vec<Reading> = self
                    .readings
                    .iter()
                    .filter(|r| r.timestamp < run_time)
                    .cloned()
                    .collect();
                let tagged = tag_readings(&historical, &self.schedule);
                BaselineSnapshot::Mean(MeanBaseline::fit(&tagged))
            }
            BaselineStrategy::Learned => BaselineSnapshot::Learned(
                self.learned.clone().unwrap_or_default(),
            ),
        }
    }

    /// Fit the frozen model from the full historical silence set.
    fn fit_learned_if_needed(&mut self) {
        if self.strategy == BaselineStrategy::Learned {
            let tagged = tag_readings(&self.readings, &self.schedule);
            self.learned = Some(LearnedBaseline::fit(&tagged));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{ExpectedActivity, Resource};
    use chrono::{NaiveTime, TimeZone};

    fn ts(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, d, h, m, 0).unwrap()
    }

    fn overnight_silence(building: &str) -> ScheduleRule {
        ScheduleRule {
            building: building.to_string(),
            start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            expected_activity: ExpectedActivity::No,
        }
    }

    /// Overnight silence readings for Lab-A water: a quiet history followed
    /// by one loud reading in the final window.
    fn spiky_batch() -> Vec<Reading> {
        vec![
            Reading::new(ts(5, 0, 0), "Lab-A", Resource::Water, 40.0),
            Reading::new(ts(5, 0, 30), "Lab-A", Resource::Water, 40.0),
            Reading::new(ts(5, 1, 0), "Lab-A", Resource::Water, 40.0),
            Reading::new(ts(5, 1, 15), "Lab-A", Resource::Water, 120.0),
        ]
    }

    #[test]
    fn test_lone_reading_session_is_exhausted() {
        // The cursor starts one cycle after the earliest reading; with a
        // single reading the session ends before any window runs.
        let readings = vec![Reading::new(ts(5, 0, 0), "Lab-A", Resource::Water, 999.0)];
        let mut driver = CycleDriver::new(readings, vec![overnight_silence("Lab-A")], BaselineStrategy::Mean);

        assert_eq!(driver.run_cycle(), CycleOutcome::Exhausted);
        assert!(driver.decision_history().is_empty());
    }

    #[test]
    fn test_spike_is_flagged_and_decided() {
        let mut driver = CycleDriver::new(
            spiky_batch(),
            vec![overnight_silence("Lab-A")],
            BaselineStrategy::Mean,
        );

        let ran = driver.run_to_exhaustion(None);
        assert!(ran >= 2);

        // History for the final cycle is everything before 01:30, the spike
        // included: mean = (40+40+40+120)/4 = 60, trigger point 90 < 120.
        let decisions = driver.decision_history();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].observed_usage, 120.0);
        assert_eq!(decisions[0].normal_silence_usage, 60.0);
        assert_eq!(decisions[0].run_time, ts(5, 1, 30));
    }

    #[test]
    fn test_decisions_match_flagged_rows() {
        let mut driver = CycleDriver::new(
            spiky_batch(),
            vec![overnight_silence("Lab-A")],
            BaselineStrategy::Mean,
        );
        driver.run_to_exhaustion(None);

        let flagged = driver
            .anomaly_history()
            .iter()
            .filter(|r| r.is_anomaly)
            .count();
        assert_eq!(flagged, driver.decision_history().len());
    }

    #[test]
    fn test_exhaustion_is_terminal() {
        let mut driver = CycleDriver::new(
            spiky_batch(),
            vec![overnight_silence("Lab-A")],
            BaselineStrategy::Mean,
        );
        driver.run_to_exhaustion(None);

        assert!(driver.is_exhausted());
        assert_eq!(driver.run_cycle(), CycleOutcome::Exhausted);
        assert_eq!(driver.run_cycle(), CycleOutcome::Exhausted);
    }

    #[test]
    fn test_gap_in_data_yields_no_data_cycle() {
        let readings = vec![
            Reading::new(ts(5, 0, 0), "Lab-A", Resource::Water, 40.0),
            Reading::new(ts(5, 0, 15), "Lab-A", Resource::Water, 40.0),
            // Two-hour gap
            Reading::new(ts(5, 2, 15), "Lab-A", Resource::Water, 40.0),
        ];
        let mut driver = CycleDriver::new(readings, vec![overnight_silence("Lab-A")], BaselineStrategy::Mean);

        let mut saw_no_data = false;
        loop {
            match driver.run_cycle() {
                CycleOutcome::NoData { .. } => saw_no_data = true,
                CycleOutcome::Exhausted => break,
                CycleOutcome::Ready { .. } => {}
            }
        }
        assert!(saw_no_data);
        assert!(driver.stats().empty_windows > 0);
    }

    #[test]
    fn test_switch_strategy_resets_session() {
        let mut driver = CycleDriver::new(
            spiky_batch(),
            vec![overnight_silence("Lab-A")],
            BaselineStrategy::Mean,
        );
        driver.run_to_exhaustion(None);
        assert!(driver.cycle_count() > 0);
        assert!(!driver.decision_history().is_empty());

        driver.switch_strategy(BaselineStrategy::Learned);

        assert_eq!(driver.cycle_count(), 0);
        assert!(driver.anomaly_history().is_empty());
        assert!(driver.decision_history().is_empty());
        assert_eq!(driver.stats().cycles_run, 0);
        assert!(!driver.is_exhausted());
        assert_eq!(driver.strategy(), BaselineStrategy::Learned);

        // The session replays cleanly under the new strategy
        let ran = driver.run_to_exhaustion(None);
        assert!(ran >= 2);
    }

    #[test]
    fn test_empty_batch_starts_exhausted() {
        let mut driver = CycleDriver::new(vec![], vec![], BaselineStrategy::Mean);
        assert!(driver.is_exhausted());
        assert_eq!(driver.run_cycle(), CycleOutcome::Exhausted);
    }

    #[test]
    fn test_max_cycles_cap() {
        // A day of half-hourly quiet readings
        let readings: Vec<Reading> = (0..48)
            .map(|i| {
                Reading::new(
                    ts(5, 0, 0) + Duration::minutes(30 * i),
                    "Lab-A",
                    Resource::Water,
                    40.0,
                )
            })
            .collect();
        let mut driver = CycleDriver::new(readings, vec![overnight_silence("Lab-A")], BaselineStrategy::Mean);

        let ran = driver.run_to_exhaustion(Some(5));
        assert_eq!(ran, 5);
        assert_eq!(driver.cycle_count(), 5);
        assert!(!driver.is_exhausted());
    }
}
