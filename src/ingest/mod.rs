//! Loading and typing of the two tabular inputs.
//!
//! Readings and schedule rules arrive as CSV, are validated eagerly, and are
//! immutable for the rest of the session.

pub mod loader;
pub mod types;

pub use loader::{load_schedule, load_usage_logs, IngestError};
pub use types::{ExpectedActivity, Reading, Resource, ScheduleRule, TaggedReading};
