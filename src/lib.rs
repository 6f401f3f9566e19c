//! Shadow Waste Engine - detects invisible resource waste during inactivity.
//!
//! This library monitors periodic water and electricity meter readings for a
//! set of buildings and flags usage that is anomalously high while a building
//! is scheduled to be inactive ("shadow waste"). The pipeline operates on
//! discrete 30-minute cycles over a pre-loaded batch of readings.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Shadow Waste Engine                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐  │
//! │  │  Ingest  │──▶│ Windowing │──▶│ Silence  │──▶│ Anomaly  │  │
//! │  │  (CSV)   │   │ (30m bins)│   │ tagging  │   │ detector │  │
//! │  └──────────┘   └───────────┘   └──────────┘   └────┬─────┘  │
//! │                                       │             │        │
//! │                                       ▼             ▼        │
//! │                                 ┌──────────┐   ┌──────────┐  │
//! │                                 │ Baseline │   │ Decision │  │
//! │                                 │ estimate │   │ records  │  │
//! │                                 └──────────┘   └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`core::CycleDriver`] owns all mutable session state (time cursor,
//! cycle counter, accumulated history) and advances it one cycle at a time.
//! Its two outputs, the anomaly stream and the decision stream, are the sole
//! integration surface for downstream consumers.
//!
//! # Example
//!
//! ```no_run
//! use shadow_waste_engine::core::{BaselineStrategy, CycleDriver, CycleOutcome};
//! use shadow_waste_engine::ingest::{load_schedule, load_usage_logs};
//!
//! let readings = load_usage_logs("data/usage_logs.csv").expect("readings");
//! let schedule = load_schedule("data/schedule.csv").expect("schedule");
//!
//! let mut driver = CycleDriver::new(readings, schedule, BaselineStrategy::Mean);
//! while driver.run_cycle() != CycleOutcome::Exhausted {}
//!
//! for decision in driver.decision_history() {
//!     println!("{}: {}", decision.building, decision.detected_issue);
//! }
//! ```

pub mod config;
pub mod core;
pub mod ingest;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{
    AnomalyRecord, BaselineEstimator, BaselineStrategy, CycleDriver, CycleOutcome, Decision,
};
pub use ingest::{IngestError, Reading, Resource, ScheduleRule, TaggedReading};
pub use stats::RunStats;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
