//! ecogrid-metrics — what a simulation run produced.
//!
//! # Architecture
//!
//! ```text
//! IntervalRecord  ← one per (hour, tick), built from the tick's routing
//!   └── rows()    → FlatRow per region
//!
//! MetricsSink
//!   ├── MemorySink     ← keeps every record
//!   └── JsonLinesSink  ← one JSON object per line
//!
//! RunSummary
//!   ├── observe() / record_migration()
//!   └── render_summary() → text table
//! ```

pub mod error;
pub mod record;
pub mod sink;
pub mod summary;

pub use error::{MetricsError, MetricsResult};
pub use record::{FlatRow, IntervalInputs, IntervalRecord};
pub use sink::{JsonLinesSink, MemorySink, MetricsSink};
pub use summary::{RunSummary, render_summary};
